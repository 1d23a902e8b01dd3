//! Validation of loosely-typed model output.
//!
//! Model JSON is never deserialized straight into domain types. Each field is
//! read from a `serde_json::Value`, checked, and replaced with a default when
//! it does not fit.

use crate::domain::article::{ArticleClassification, ArticleImpactRow};
use crate::domain::rating::{FactorScore, Impact, Provenance, Rating};
use crate::llm::Provider;
use serde_json::{Map, Value};

pub const NO_EXPLANATION: &str = "No explanation provided.";
const DEFAULT_FACTOR_NAME: &str = "Factor";
const DEFAULT_ROW_FACTOR: &str = "Impact";
const TONE_ONLY_REASON: &str = "No specific factors were extracted; overall tone only.";

fn non_empty_str(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn impact_or_neutral(v: Option<&Value>) -> Impact {
    v.and_then(Value::as_str)
        .and_then(Impact::parse)
        .unwrap_or(Impact::Neutral)
}

/// Merges an enrichment response into `base`.
///
/// `label` and `numeric` always come from `base`. A returned factor that names
/// a base factor keeps the base score; any other factor gets its own score
/// clamped to -2..=2, or 0 when it is not a number.
pub fn sanitize_enriched_rating(
    base: &Rating,
    enriched: &Map<String, Value>,
    provider: Provider,
) -> Rating {
    let factors = match enriched.get("factors").and_then(Value::as_array) {
        Some(items) if !items.is_empty() => items
            .iter()
            .map(|item| sanitize_factor(base, item))
            .collect(),
        _ => base.factors.clone(),
    };

    Rating {
        label: base.label,
        numeric: base.numeric,
        timeframe: non_empty_str(enriched.get("timeframe"))
            .unwrap_or_else(|| base.timeframe.clone()),
        summary: non_empty_str(enriched.get("summary")).unwrap_or_else(|| base.summary.clone()),
        factors,
        provenance: Provenance::enriched_by(provider),
    }
}

fn sanitize_factor(base: &Rating, item: &Value) -> FactorScore {
    let name = non_empty_str(item.get("name")).unwrap_or_else(|| DEFAULT_FACTOR_NAME.to_string());

    let score = match base.factor(&name) {
        Some(original) => original.score,
        None => item
            .get("score")
            .and_then(Value::as_f64)
            .filter(|s| s.is_finite())
            .map(|s| s.clamp(-2.0, 2.0))
            .unwrap_or(0.0),
    };

    FactorScore {
        name,
        impact: impact_or_neutral(item.get("impact")),
        score,
        reason: non_empty_str(item.get("reason")).unwrap_or_else(|| NO_EXPLANATION.to_string()),
    }
}

/// Normalizes an article classification response.
pub fn sanitize_article(data: &Map<String, Value>) -> ArticleClassification {
    let overall = impact_or_neutral(data.get("overall"));

    // Truncates toward zero; non-numeric scores become 0.
    let score = data
        .get("score")
        .and_then(Value::as_f64)
        .filter(|s| s.is_finite())
        .map(|s| s.trunc() as i64)
        .unwrap_or(0);

    let mut rows: Vec<ArticleImpactRow> = data
        .get("rows")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|r| ArticleImpactRow {
                    factor: non_empty_str(r.get("factor"))
                        .unwrap_or_else(|| DEFAULT_ROW_FACTOR.to_string()),
                    impact: impact_or_neutral(r.get("impact")),
                    reason: non_empty_str(r.get("reason"))
                        .unwrap_or_else(|| NO_EXPLANATION.to_string()),
                })
                .collect()
        })
        .unwrap_or_default();

    if rows.is_empty() {
        rows.push(ArticleImpactRow {
            factor: "Tone".to_string(),
            impact: overall,
            reason: TONE_ONLY_REASON.to_string(),
        });
    }

    ArticleClassification {
        overall,
        score,
        rows,
    }
}

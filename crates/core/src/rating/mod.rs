//! Rule-based rating engine.
//!
//! Two unreconciled schemes coexist: the weighted -2..=2 scheme ([`rules::WeightedRules`]) rates single symbols and
//! feeds enrichment; the -8..=8 composite ([`composite::CompositeTotals`]) is
//! what the multi-symbol snapshot reports.

pub mod composite;
pub mod metrics;
pub mod news_tone;
pub mod rules;

use crate::domain::news::NewsItem;
use crate::domain::rating::{FactorScore, Impact, Rating, RatingLabel};
use crate::domain::snapshot::MarketSnapshot;
use metrics::Metrics;
use serde::{Deserialize, Serialize};

pub trait RatingStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn rate(&self, metrics: &Metrics, headlines: &[NewsItem]) -> Rating;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Weighted,
    Composite,
}

impl StrategyKind {
    pub fn strategy(&self) -> &'static dyn RatingStrategy {
        match self {
            Self::Weighted => &rules::WeightedRules,
            Self::Composite => &composite::CompositeTotals,
        }
    }
}

/// Rates `snapshot` with the weighted scheme. Pure and synchronous.
pub fn compute_rating(snapshot: &MarketSnapshot, news: &[NewsItem]) -> Rating {
    compute_rating_with_metrics(StrategyKind::Weighted, snapshot, news).0
}

/// Like [`compute_rating`], returning the derived metrics for enrichment.
pub fn compute_rating_with_metrics(
    kind: StrategyKind,
    snapshot: &MarketSnapshot,
    news: &[NewsItem],
) -> (Rating, Metrics) {
    let metrics = Metrics::extract(snapshot);
    let rating = kind.strategy().rate(&metrics, news);
    (rating, metrics)
}

pub(crate) fn summarize(label: RatingLabel, numeric: f64, factors: &[FactorScore]) -> String {
    let count = |impact: Impact| factors.iter().filter(|f| f.impact == impact).count();
    format!(
        "{label} ({numeric:.2}) on rules: {} bullish, {} bearish, {} neutral factors.",
        count(Impact::Bullish),
        count(Impact::Bearish),
        count(Impact::Neutral),
    )
}

use crate::config::Settings;
use crate::domain::contract;
use crate::domain::rating::{Provenance, Rating};
use crate::llm::chat::ChatCompletionsClient;
use crate::llm::error::LlmConfigError;
use crate::llm::{json, JsonPrompt, TextGenerator};
use crate::rating::metrics::Metrics;
use anyhow::Context;
use std::sync::Arc;

/// Rewrites rating explanations through a text-generation service.
///
/// Never fails: without credentials the base rating comes back untouched;
/// on any call or parse failure it comes back tagged `rules_error`.
#[derive(Clone)]
pub struct RatingEnricher {
    generator: Result<Arc<dyn TextGenerator>, LlmConfigError>,
}

impl RatingEnricher {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Ok(generator),
        }
    }

    pub fn unavailable(reason: LlmConfigError) -> Self {
        Self {
            generator: Err(reason),
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        match settings.llm(settings.llm_provider) {
            Ok(llm) => Ok(Self::new(Arc::new(ChatCompletionsClient::new(llm)?))),
            Err(missing) => Ok(Self::unavailable(missing)),
        }
    }

    pub fn is_available(&self) -> bool {
        self.generator.is_ok()
    }

    pub async fn enrich(&self, base: &Rating, metrics: &Metrics) -> Rating {
        let generator = match &self.generator {
            Ok(g) => g,
            Err(reason) => {
                tracing::debug!(ticker = %metrics.ticker, %reason, "enrichment unavailable; using rules only");
                return base.clone();
            }
        };

        match Self::try_enrich(generator.as_ref(), base, metrics).await {
            Ok(enriched) => enriched,
            Err(err) => {
                tracing::warn!(
                    ticker = %metrics.ticker,
                    provider = %generator.provider(),
                    error = %err,
                    "rating enrichment failed; using rules only"
                );
                base.clone().with_provenance(Provenance::RulesError)
            }
        }
    }

    async fn try_enrich(
        generator: &dyn TextGenerator,
        base: &Rating,
        metrics: &Metrics,
    ) -> anyhow::Result<Rating> {
        let prompt = Self::prompt(base, metrics)?;
        let text = generator.generate_json(prompt).await?;
        let enriched = json::parse_object(&text)?;
        Ok(contract::sanitize_enriched_rating(
            base,
            &enriched,
            generator.provider(),
        ))
    }

    fn prompt(base: &Rating, metrics: &Metrics) -> anyhow::Result<JsonPrompt> {
        let input = serde_json::to_string_pretty(&serde_json::json!({
            "metrics": metrics,
            "base_rating": base,
        }))
        .context("failed to serialize enrichment input")?;

        let instructions = [
            "You are a short-term equity trading analyst.",
            "You are given:",
            "  1) A metrics JSON for a stock.",
            "  2) A base rating JSON that already contains label, numeric score, and factor scores.",
            "",
            "Your job:",
            "- DO NOT change the 'label' or 'numeric' fields in base_rating.",
            "- DO NOT change the 'score' numbers in each factor.",
            "- You MAY slightly adjust each factor's 'impact' between Bullish/Bearish/Neutral if it better matches the score and metrics, but keep it consistent.",
            "- Write a concise 1–2 sentence 'summary' explaining the overall setup for the next 1–3 days (long-side focus).",
            "- Rewrite each factor's 'reason' to be clear, concrete, and rooted in the metrics.",
            "",
            "Return ONLY JSON with this exact schema:",
            "{",
            "  \"label\": string,",
            "  \"numeric\": number,",
            "  \"timeframe\": string,",
            "  \"summary\": string,",
            "  \"factors\": [",
            "    { \"name\": string, \"impact\": \"Bullish\"|\"Bearish\"|\"Neutral\", \"score\": number, \"reason\": string }",
            "  ]",
            "}",
        ]
        .join("\n");

        Ok(JsonPrompt {
            system: "You are a precise, risk-aware trading assistant. You MUST output valid JSON only."
                .to_string(),
            user: format!("{instructions}\n\nINPUT JSON:\n{input}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rating::RatingLabel;
    use crate::llm::Provider;
    use crate::rating::rules::WeightedRules;
    use crate::rating::RatingStrategy;
    use serde_json::json;
    use std::sync::Mutex;

    struct Canned {
        provider: Provider,
        reply: anyhow::Result<String>,
        prompts: Mutex<Vec<JsonPrompt>>,
    }

    impl Canned {
        fn ok(reply: String) -> Arc<Self> {
            Arc::new(Self {
                provider: Provider::Groq,
                reply: Ok(reply),
                prompts: Mutex::new(vec![]),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                provider: Provider::Groq,
                reply: Err(anyhow::anyhow!("connection refused")),
                prompts: Mutex::new(vec![]),
            })
        }
    }

    #[async_trait::async_trait]
    impl TextGenerator for Canned {
        fn provider(&self) -> Provider {
            self.provider
        }

        async fn generate_json(&self, prompt: JsonPrompt) -> anyhow::Result<String> {
            self.prompts.lock().unwrap().push(prompt);
            match &self.reply {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    fn base() -> (Rating, Metrics) {
        let metrics = Metrics {
            ticker: "XYZ".to_string(),
            volume_ratio: Some(2.5),
            pct_change: Some(3.2),
            put_call_ratio: Some(1.0),
            ..Default::default()
        };
        (WeightedRules.rate(&metrics, &[]), metrics)
    }

    #[tokio::test]
    async fn adversarial_response_cannot_move_label_or_numeric() {
        let (rating, metrics) = base();
        let reply = json!({
            "label": "Avoid",
            "numeric": -2,
            "summary": "Momentum with volume confirmation.",
            "factors": [
                {"name": "Volume", "impact": "Bearish", "score": -2, "reason": "Volume 2.5× normal."},
                {"name": "Price action", "impact": "Moon", "score": null, "reason": null}
            ]
        })
        .to_string();
        let generator = Canned::ok(reply);
        let enricher = RatingEnricher::new(generator.clone());

        let out = enricher.enrich(&rating, &metrics).await;
        assert_eq!(out.label, rating.label);
        assert_eq!(out.numeric, rating.numeric);
        assert_eq!(out.provenance, Provenance::GroqRules);
        assert_eq!(out.summary, "Momentum with volume confirmation.");
        assert_eq!(out.factors[0].score, rating.factors[0].score);
        assert_eq!(out.factors[1].reason, contract::NO_EXPLANATION);

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].user.contains("\"base_rating\""));
        assert!(prompts[0].user.contains("\"volume_ratio\": 2.5"));
    }

    #[tokio::test]
    async fn failure_returns_base_with_error_provenance() {
        let (rating, metrics) = base();
        let enricher = RatingEnricher::new(Canned::failing());

        let out = enricher.enrich(&rating, &metrics).await;
        assert_eq!(out.provenance, Provenance::RulesError);
        assert_eq!(out, rating.clone().with_provenance(Provenance::RulesError));
    }

    #[tokio::test]
    async fn non_json_reply_is_a_failure() {
        let (rating, metrics) = base();
        let enricher = RatingEnricher::new(Canned::ok("Sorry, I can't help.".to_string()));

        let out = enricher.enrich(&rating, &metrics).await;
        assert_eq!(out, rating.clone().with_provenance(Provenance::RulesError));
    }

    #[tokio::test]
    async fn missing_credential_returns_base_unchanged() {
        let (rating, metrics) = base();
        let enricher = RatingEnricher::unavailable(LlmConfigError::MissingCredential {
            provider: Provider::Groq,
            env_var: "GROQ_API_KEY",
        });
        assert!(!enricher.is_available());

        let out = enricher.enrich(&rating, &metrics).await;
        assert_eq!(out, rating);
        assert_eq!(out.label, RatingLabel::Buy);
    }
}

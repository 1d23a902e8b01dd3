use crate::config::Settings;
use crate::domain::article::ArticleClassification;
use crate::domain::contract;
use crate::llm::chat::ChatCompletionsClient;
use crate::llm::error::LlmConfigError;
use crate::llm::{json, JsonPrompt, TextGenerator};
use std::sync::Arc;

const MAX_ARTICLE_CHARS: usize = 8000;

#[derive(Clone)]
pub struct ArticleClassifier {
    generator: Result<Arc<dyn TextGenerator>, LlmConfigError>,
}

impl ArticleClassifier {
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
        match settings.llm(settings.article_llm_provider) {
            Ok(llm) => Ok(Self::new(Arc::new(ChatCompletionsClient::new(llm)?))),
            Err(missing) => Ok(Self::unavailable(missing)),
        }
    }

    /// Classifies the short-term price impact of an article.
    ///
    /// Blank text short-circuits to a neutral result. Missing credentials and
    /// service failures are errors; a non-JSON answer is a neutral result.
    pub async fn classify(
        &self,
        text: &str,
        ticker: Option<&str>,
    ) -> anyhow::Result<ArticleClassification> {
        if text.trim().is_empty() {
            return Ok(ArticleClassification::no_content());
        }

        let generator = self.generator.as_ref().map_err(|e| anyhow::Error::new(e.clone()))?;
        let raw = generator.generate_json(Self::prompt(text, ticker)).await?;

        match json::parse_object(&raw) {
            Ok(data) => Ok(contract::sanitize_article(&data)),
            Err(err) => {
                tracing::warn!(provider = %generator.provider(), error = %err, "article classification was not JSON");
                Ok(ArticleClassification::unparseable())
            }
        }
    }

    fn prompt(text: &str, ticker: Option<&str>) -> JsonPrompt {
        let trimmed: String = text.chars().take(MAX_ARTICLE_CHARS).collect();
        let subject = ticker.filter(|t| !t.trim().is_empty()).unwrap_or("the company");

        let user = format!(
            "You are a professional equity analyst. Read the following news article \
about {subject} and assess the SHORT-TERM impact on the stock price.\n\n\
Return ONLY a JSON object, no extra text. Use this exact schema:\n\n\
{{\n\
  \"overall\": \"Bullish\" | \"Bearish\" | \"Neutral\",\n\
  \"score\": number,\n\
  \"rows\": [\n\
    {{\n\
      \"factor\": string,\n\
      \"impact\": \"Bullish\" | \"Bearish\" | \"Neutral\",\n\
      \"reason\": string\n\
    }}\n\
  ]\n\
}}\n\n\
Guidelines:\n\
- Focus on short-term impact (next few days), NOT long-term valuation.\n\
- Use multiple rows when there are multiple factors (offering, earnings, guidance, legal, etc.).\n\
- If impact is mixed or small, use overall = \"Neutral\".\n\n\
ARTICLE TEXT:\n{trimmed}\n"
        );

        JsonPrompt {
            system: "You are a precise financial news analyst that ONLY returns valid JSON."
                .to_string(),
            user,
        }
    }
}

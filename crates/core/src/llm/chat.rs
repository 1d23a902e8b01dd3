use crate::config::LlmSettings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{JsonPrompt, Provider, TextGenerator};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TEMPERATURE: f32 = 0.2;

/// OpenAI-compatible `/chat/completions` client. Groq exposes the same API.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    provider: Provider,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(settings: LlmSettings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            provider: settings.provider,
            api_key: settings.api_key,
            base_url: settings.base_url,
            model: settings.model,
        })
    }

    async fn create_completion(&self, req: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .with_context(|| format!("{} request failed", self.provider))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read {} response body", self.provider))?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError {
                provider: self.provider,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
            }
            .into());
        }

        serde_json::from_str::<ChatResponse>(&text).map_err(|e| {
            anyhow::Error::from(LlmDiagnosticsError {
                provider: self.provider,
                stage: "decode",
                detail: e.to_string(),
                raw_output: Some(text.clone()),
            })
        })
    }

    fn response_content(provider: Provider, res: ChatResponse) -> anyhow::Result<String> {
        let content = res
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmDiagnosticsError {
                provider,
                stage: "content",
                detail: "response has no message content".to_string(),
                raw_output: None,
            }
            .into());
        }
        Ok(content)
    }
}

#[async_trait::async_trait]
impl TextGenerator for ChatCompletionsClient {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn generate_json(&self, prompt: JsonPrompt) -> anyhow::Result<String> {
        let req = ChatRequest {
            model: &self.model,
            response_format: ResponseFormat { kind: "json_object" },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: DEFAULT_TEMPERATURE,
        };

        let res = self.create_completion(req).await?;
        tracing::debug!(provider = %self.provider, model = %self.model, "chat completion received");
        Self::response_content(self.provider, res)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

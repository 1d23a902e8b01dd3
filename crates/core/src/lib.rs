pub mod domain;
pub mod llm;
pub mod market;
pub mod news;
pub mod orchestrator;
pub mod rating;

pub mod config {
    use crate::llm::error::LlmConfigError;
    use crate::llm::Provider;
    use anyhow::Context;

    const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
    const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
    const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
    const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini-2025-04-14";
    const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

    const DEFAULT_YAHOO_API_BASE_URL: &str = "https://query2.finance.yahoo.com";
    const DEFAULT_YAHOO_WEB_BASE_URL: &str = "https://finance.yahoo.com";
    const DEFAULT_YAHOO_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_ARTICLE_TIMEOUT_SECS: u64 = 25;

    const DEFAULT_CORS_ORIGINS: [&str; 3] = [
        "http://localhost:5173",
        "http://127.0.0.1:5173",
        "https://options-news-platform.vercel.app",
    ];

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub groq_api_key: Option<String>,
        pub openai_api_key: Option<String>,
        pub sentry_dsn: Option<String>,

        /// Provider used to enrich rule-based ratings.
        pub llm_provider: Provider,
        /// Provider used for standalone article classification.
        pub article_llm_provider: Provider,
        pub groq_base_url: String,
        pub groq_model: String,
        pub openai_base_url: String,
        pub openai_model: String,
        pub llm_timeout_secs: u64,

        pub yahoo_api_base_url: String,
        pub yahoo_web_base_url: String,
        pub yahoo_timeout_secs: u64,
        pub article_timeout_secs: u64,

        pub multi_snapshot_concurrency: usize,
        pub cors_origins: Vec<String>,
    }

    /// Everything a chat-completions client needs, resolved once at construction.
    #[derive(Debug, Clone)]
    pub struct LlmSettings {
        pub provider: Provider,
        pub api_key: String,
        pub base_url: String,
        pub model: String,
        pub timeout_secs: u64,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                groq_api_key: non_empty_var("GROQ_API_KEY"),
                openai_api_key: non_empty_var("OPENAI_API_KEY"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                llm_provider: provider_var("LLM_PROVIDER")?,
                article_llm_provider: provider_var("ARTICLE_LLM_PROVIDER")?,
                groq_base_url: non_empty_var("GROQ_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
                groq_model: non_empty_var("GROQ_MODEL")
                    .unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
                openai_base_url: non_empty_var("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                openai_model: non_empty_var("OPENAI_MODEL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                llm_timeout_secs: parsed_var("LLM_TIMEOUT_SECS")
                    .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
                yahoo_api_base_url: non_empty_var("YAHOO_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_YAHOO_API_BASE_URL.to_string()),
                yahoo_web_base_url: non_empty_var("YAHOO_WEB_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_YAHOO_WEB_BASE_URL.to_string()),
                yahoo_timeout_secs: parsed_var("YAHOO_TIMEOUT_SECS")
                    .unwrap_or(DEFAULT_YAHOO_TIMEOUT_SECS),
                article_timeout_secs: parsed_var("ARTICLE_TIMEOUT_SECS")
                    .unwrap_or(DEFAULT_ARTICLE_TIMEOUT_SECS),
                multi_snapshot_concurrency: parsed_var::<usize>("MULTI_SNAPSHOT_CONCURRENCY")
                    .unwrap_or(1)
                    .max(1),
                cors_origins: non_empty_var("CORS_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(|o| o.trim().to_string())
                            .filter(|o| !o.is_empty())
                            .collect()
                    })
                    .unwrap_or_else(|| {
                        DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect()
                    }),
            })
        }

        pub fn api_key(&self, provider: Provider) -> Option<&str> {
            match provider {
                Provider::Groq => self.groq_api_key.as_deref(),
                Provider::OpenAI => self.openai_api_key.as_deref(),
            }
        }

        /// Resolves the client settings for `provider`; a missing key is the only failure.
        pub fn llm(&self, provider: Provider) -> Result<LlmSettings, LlmConfigError> {
            let api_key = self
                .api_key(provider)
                .ok_or(LlmConfigError::MissingCredential {
                    provider,
                    env_var: provider.api_key_env(),
                })?
                .to_string();

            let (base_url, model) = match provider {
                Provider::Groq => (self.groq_base_url.clone(), self.groq_model.clone()),
                Provider::OpenAI => (self.openai_base_url.clone(), self.openai_model.clone()),
            };

            Ok(LlmSettings {
                provider,
                api_key,
                base_url,
                model,
                timeout_secs: self.llm_timeout_secs,
            })
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
        non_empty_var(key).and_then(|s| s.parse::<T>().ok())
    }

    fn provider_var(key: &str) -> anyhow::Result<Provider> {
        match non_empty_var(key) {
            None => Ok(Provider::Groq),
            Some(s) => Provider::parse(&s)
                .with_context(|| format!("{key} must be one of groq|openai (got {s})")),
        }
    }

}

//! Per-ticker fan-out over the market-data and news collaborators.
//!
//! Every step for a ticker is attempted on its own; a failure is recorded as
//! that ticker's `error` and never stops the other steps or tickers.

use crate::domain::news::{NewsItem, NewsSection};
use crate::domain::rating::Rating;
use crate::domain::snapshot::{ChainSide, MarketSnapshot, OptionChainSnapshot};
use crate::llm::enrich::RatingEnricher;
use crate::market::MarketDataProvider;
use crate::news::NewsSource;
use crate::rating::metrics::Metrics;
use crate::rating::{compute_rating_with_metrics, StrategyKind};
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_LIMIT: usize = 20;
pub const DEFAULT_NEWS_COUNT: usize = 3;

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_news_count() -> usize {
    DEFAULT_NEWS_COUNT
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiSnapshotRequest {
    pub tickers: Vec<String>,
    #[serde(default)]
    pub expiration: Option<String>,
    #[serde(default)]
    pub side: ChainSide,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_news_count")]
    pub news_count: usize,
    #[serde(default = "default_true")]
    pub include_news: bool,
    #[serde(default = "default_true")]
    pub include_press_releases: bool,
    #[serde(default = "default_true")]
    pub include_ratings: bool,
}

impl MultiSnapshotRequest {
    pub fn new(tickers: Vec<String>) -> Self {
        Self {
            tickers,
            expiration: None,
            side: ChainSide::Both,
            limit: DEFAULT_LIMIT,
            news_count: DEFAULT_NEWS_COUNT,
            include_news: true,
            include_press_releases: true,
            include_ratings: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSnapshot {
    pub ticker: String,
    pub options: Option<OptionChainSnapshot>,
    pub news: Vec<NewsItem>,
    pub press_releases: Vec<NewsItem>,
    /// Composite-scheme rating, present when the chain was fetched.
    pub rating: Option<Rating>,
    /// Weighted-scheme rating passed through enrichment.
    pub ai_rating: Option<Rating>,
    /// First news or press-release failure; an options failure only when
    /// neither of those failed.
    pub error: Option<String>,
}

impl SymbolSnapshot {
    fn empty(ticker: String) -> Self {
        Self {
            ticker,
            options: None,
            news: vec![],
            press_releases: vec![],
            rating: None,
            ai_rating: None,
            error: None,
        }
    }

    fn record_error(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(message);
        }
    }
}

/// Trimmed, upper-cased tickers with blanks removed, input order kept.
pub fn normalize_tickers(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Clone)]
pub struct MultiSymbolOrchestrator {
    market: Arc<dyn MarketDataProvider>,
    news: Arc<dyn NewsSource>,
    enricher: RatingEnricher,
    concurrency: usize,
}

impl MultiSymbolOrchestrator {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        news: Arc<dyn NewsSource>,
        enricher: RatingEnricher,
        concurrency: usize,
    ) -> Self {
        Self {
            market,
            news,
            enricher,
            concurrency: concurrency.max(1),
        }
    }

    pub fn market(&self) -> &dyn MarketDataProvider {
        self.market.as_ref()
    }

    pub fn news(&self) -> &dyn NewsSource {
        self.news.as_ref()
    }

    /// One result per non-blank ticker, in input order.
    pub async fn snapshot_many(&self, req: &MultiSnapshotRequest) -> Vec<SymbolSnapshot> {
        let tickers = normalize_tickers(&req.tickers);
        tracing::info!(
            count = tickers.len(),
            concurrency = self.concurrency,
            market = self.market.provider_name(),
            news = self.news.source_name(),
            "multi-symbol snapshot"
        );

        stream::iter(tickers)
            .map(|symbol| self.snapshot_one(symbol, req))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn snapshot_one(&self, symbol: String, req: &MultiSnapshotRequest) -> SymbolSnapshot {
        let mut out = SymbolSnapshot::empty(symbol.clone());
        let mut options_error = None;

        match self
            .market
            .option_chain(&symbol, req.expiration.as_deref(), req.side, req.limit)
            .await
        {
            Ok(chain) => out.options = Some(chain),
            Err(err) => {
                tracing::warn!(ticker = %symbol, error = %err, "options step failed");
                options_error = Some(format!("{err:#}"));
            }
        }

        if req.include_news {
            match self
                .news
                .fetch_section(&symbol, NewsSection::News, req.news_count)
                .await
            {
                Ok(items) => out.news = items,
                Err(err) => {
                    tracing::warn!(ticker = %symbol, error = %err, "news step failed");
                    out.record_error(format!("News error: {err:#}"));
                }
            }
        }

        if req.include_press_releases {
            match self
                .news
                .fetch_section(&symbol, NewsSection::PressReleases, req.news_count)
                .await
            {
                Ok(items) => out.press_releases = items,
                Err(err) => {
                    tracing::warn!(ticker = %symbol, error = %err, "press releases step failed");
                    out.record_error(format!("Press releases error: {err:#}"));
                }
            }
        }

        if let Some(message) = options_error {
            out.record_error(message);
        }

        if req.include_ratings {
            if let Some(chain) = &out.options {
                let snapshot = MarketSnapshot::from_chain(chain);
                let headlines: Vec<NewsItem> = out
                    .news
                    .iter()
                    .chain(out.press_releases.iter())
                    .cloned()
                    .collect();

                let (composite, _) =
                    compute_rating_with_metrics(StrategyKind::Composite, &snapshot, &headlines);
                let (weighted, metrics) =
                    compute_rating_with_metrics(StrategyKind::Weighted, &snapshot, &headlines);

                out.rating = Some(composite);
                out.ai_rating = Some(self.enricher.enrich(&weighted, &metrics).await);
            }
        }

        out
    }

    /// Rates one ticker from its live chain and latest headlines.
    ///
    /// The chain is required; a headline failure only drops the news input.
    pub async fn rate_symbol(
        &self,
        ticker: &str,
        kind: StrategyKind,
        enrich: bool,
        news_count: usize,
    ) -> Result<Rating> {
        let symbol = ticker.trim().to_uppercase();
        anyhow::ensure!(!symbol.is_empty(), "ticker must not be empty");

        let chain = self
            .market
            .option_chain(&symbol, None, ChainSide::Both, DEFAULT_LIMIT)
            .await
            .with_context(|| format!("failed to load option chain for {symbol}"))?;

        let news = match self
            .news
            .fetch_section(&symbol, NewsSection::News, news_count)
            .await
        {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(ticker = %symbol, error = %err, "rating without headlines");
                vec![]
            }
        };

        Ok(self
            .rate_snapshot(&MarketSnapshot::from_chain(&chain), &news, kind, enrich)
            .await)
    }

    /// Rates a caller-supplied snapshot, optionally passing it through enrichment.
    pub async fn rate_snapshot(
        &self,
        snapshot: &MarketSnapshot,
        news: &[NewsItem],
        kind: StrategyKind,
        enrich: bool,
    ) -> Rating {
        let (rating, metrics): (Rating, Metrics) =
            compute_rating_with_metrics(kind, snapshot, news);
        tracing::debug!(
            ticker = %snapshot.ticker,
            strategy = kind.strategy().name(),
            label = %rating.label,
            enrich,
            "rated snapshot"
        );
        if enrich {
            self.enricher.enrich(&rating, &metrics).await
        } else {
            rating
        }
    }
}

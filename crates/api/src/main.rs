mod error;

use axum::{
    extract::{Path, Query, State},
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use error::ApiError;
use optnews_core::config::Settings;
use optnews_core::domain::article::ArticleImpactRow;
use optnews_core::domain::news::{NewsItem, NewsSection};
use optnews_core::domain::rating::{Impact, Rating};
use optnews_core::domain::snapshot::{ChainSide, MarketSnapshot, OptionChainSnapshot};
use optnews_core::llm::article::ArticleClassifier;
use optnews_core::llm::enrich::RatingEnricher;
use optnews_core::market::yahoo::YahooOptionsProvider;
use optnews_core::news::article::{extract_main_text, ArticleFetcher};
use optnews_core::news::yahoo::YahooNewsScraper;
use optnews_core::orchestrator::{
    MultiSnapshotRequest, MultiSymbolOrchestrator, SymbolSnapshot, DEFAULT_LIMIT,
    DEFAULT_NEWS_COUNT,
};
use optnews_core::rating::StrategyKind;

const DEFAULT_SECTION_COUNT: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let enricher = RatingEnricher::from_settings(&settings)?;
    if !enricher.is_available() {
        tracing::warn!(
            provider = %settings.llm_provider,
            "no credential for rating enrichment; aiRating will be rules only"
        );
    }

    let state = AppState {
        orchestrator: MultiSymbolOrchestrator::new(
            Arc::new(YahooOptionsProvider::from_settings(&settings)?),
            Arc::new(YahooNewsScraper::from_settings(&settings)?),
            enricher,
            settings.multi_snapshot_concurrency,
        ),
        articles: ArticleFetcher::from_settings(&settings)?,
        classifier: ArticleClassifier::from_settings(&settings)?,
    };

    let app = health_router()
        .route("/options/chain/:ticker", get(get_option_chain))
        .route("/options/expirations/:ticker", get(get_expirations))
        .route("/options/multi-snapshot", post(multi_snapshot))
        .route("/news/:ticker", get(get_news))
        .route("/press-releases/:ticker", get(get_press_releases))
        .route("/news/analyze-article", post(analyze_article))
        .route("/rating", post(rate_snapshot))
        .route("/rating/:ticker", get(get_rating))
        .with_state(state)
        .layer(cors_layer(&settings.cors_origins))
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
struct AppState {
    orchestrator: MultiSymbolOrchestrator,
    articles: ArticleFetcher,
    classifier: ArticleClassifier,
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn require_ticker(raw: &str) -> Result<String, ApiError> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(ApiError::BadRequest("ticker must not be empty".into()));
    }
    Ok(ticker)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn health_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(healthz))
        .route("/healthz", get(healthz))
}

#[derive(Debug, Deserialize)]
struct ChainQuery {
    expiration: Option<String>,
    #[serde(default)]
    side: ChainSide,
    limit: Option<usize>,
}

async fn get_option_chain(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(q): Query<ChainQuery>,
) -> Result<Json<OptionChainSnapshot>, ApiError> {
    let ticker = require_ticker(&ticker)?;
    let chain = state
        .orchestrator
        .market()
        .option_chain(
            &ticker,
            q.expiration.as_deref(),
            q.side,
            q.limit.unwrap_or(DEFAULT_LIMIT),
        )
        .await
        .map_err(|e| ApiError::upstream("Failed to load option chain", e))?;
    Ok(Json(chain))
}

#[derive(Debug, Serialize)]
struct ExpirationsResponse {
    ticker: String,
    expirations: Vec<String>,
}

async fn get_expirations(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<ExpirationsResponse>, ApiError> {
    let ticker = require_ticker(&ticker)?;
    let expirations = state
        .orchestrator
        .market()
        .expirations(&ticker)
        .await
        .map_err(|e| ApiError::upstream("Failed to load expirations", e))?;
    Ok(Json(ExpirationsResponse {
        ticker,
        expirations,
    }))
}

#[derive(Debug, Deserialize)]
struct CountQuery {
    count: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SectionResponse {
    ticker: String,
    items: Vec<NewsItem>,
}

async fn fetch_section(
    state: &AppState,
    ticker: &str,
    section: NewsSection,
    count: Option<usize>,
) -> Result<Json<SectionResponse>, ApiError> {
    let ticker = require_ticker(ticker)?;
    let items = state
        .orchestrator
        .news()
        .fetch_section(&ticker, section, count.unwrap_or(DEFAULT_SECTION_COUNT))
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch Yahoo Finance page", e))?;
    Ok(Json(SectionResponse { ticker, items }))
}

async fn get_news(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(q): Query<CountQuery>,
) -> Result<Json<SectionResponse>, ApiError> {
    fetch_section(&state, &ticker, NewsSection::News, q.count).await
}

async fn get_press_releases(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(q): Query<CountQuery>,
) -> Result<Json<SectionResponse>, ApiError> {
    fetch_section(&state, &ticker, NewsSection::PressReleases, q.count).await
}

async fn multi_snapshot(
    State(state): State<AppState>,
    Json(req): Json<MultiSnapshotRequest>,
) -> Json<Vec<SymbolSnapshot>> {
    Json(state.orchestrator.snapshot_many(&req).await)
}

#[derive(Debug, Deserialize)]
struct RatingQuery {
    enrich: Option<bool>,
    #[serde(default)]
    strategy: StrategyKind,
}

async fn get_rating(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(q): Query<RatingQuery>,
) -> Result<Json<Rating>, ApiError> {
    let ticker = require_ticker(&ticker)?;
    let rating = state
        .orchestrator
        .rate_symbol(
            &ticker,
            q.strategy,
            q.enrich.unwrap_or(true),
            DEFAULT_NEWS_COUNT,
        )
        .await
        .map_err(|e| ApiError::upstream("Failed to rate symbol", e))?;
    Ok(Json(rating))
}

fn default_enrich() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RateRequest {
    snapshot: MarketSnapshot,
    #[serde(default)]
    news: Vec<NewsItem>,
    #[serde(default = "default_enrich")]
    enrich: bool,
    #[serde(default)]
    strategy: StrategyKind,
}

async fn rate_snapshot(
    State(state): State<AppState>,
    Json(req): Json<RateRequest>,
) -> Json<Rating> {
    Json(
        state
            .orchestrator
            .rate_snapshot(&req.snapshot, &req.news, req.strategy, req.enrich)
            .await,
    )
}

#[derive(Debug, Deserialize)]
struct AnalyzeArticleRequest {
    url: String,
    #[serde(default)]
    ticker: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnalyzeArticleResponse {
    url: String,
    ticker: Option<String>,
    overall: Impact,
    score: i64,
    rows: Vec<ArticleImpactRow>,
    summary: Option<String>,
}

async fn analyze_article(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeArticleRequest>,
) -> Result<Json<AnalyzeArticleResponse>, ApiError> {
    let html = state
        .articles
        .fetch_html(&req.url)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch article", e))?;

    let text = extract_main_text(&html).map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        ApiError::Internal(format!("Unable to extract article text: {e:#}"))
    })?;
    if text.trim().is_empty() {
        return Err(ApiError::Internal("Unable to extract article text".into()));
    }

    let result = state
        .classifier
        .classify(&text, req.ticker.as_deref())
        .await
        .map_err(|e| ApiError::upstream("LLM analysis failed", e))?;

    Ok(Json(AnalyzeArticleResponse {
        url: req.url,
        ticker: req.ticker,
        overall: result.overall,
        score: result.score,
        rows: result.rows,
        summary: None,
    }))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_is_served_on_both_paths() {
        for path in ["/health", "/healthz"] {
            let req = Request::builder().uri(path).body(Body::empty()).unwrap();
            let resp = health_router::<()>().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);

            let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(v, serde_json::json!({ "status": "ok" }));
        }
    }
}

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use optnews_core::config::Settings;
use optnews_core::domain::snapshot::ChainSide;
use optnews_core::llm::article::ArticleClassifier;
use optnews_core::llm::enrich::RatingEnricher;
use optnews_core::llm::error::LlmDiagnosticsError;
use optnews_core::market::yahoo::YahooOptionsProvider;
use optnews_core::news::article::ArticleFetcher;
use optnews_core::news::yahoo::YahooNewsScraper;
use optnews_core::orchestrator::{
    MultiSnapshotRequest, MultiSymbolOrchestrator, DEFAULT_LIMIT, DEFAULT_NEWS_COUNT,
};
use optnews_core::rating::StrategyKind;

#[derive(Debug, Parser)]
#[command(name = "optnews_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Options chain, headlines and ratings for several tickers.
    Snapshot {
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Expiration date (YYYY-MM-DD). Defaults to the nearest one.
        #[arg(long)]
        expiration: Option<String>,

        #[arg(long, value_enum, default_value_t = SideArg::Both)]
        side: SideArg,

        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        #[arg(long, default_value_t = DEFAULT_NEWS_COUNT)]
        news_count: usize,

        #[arg(long)]
        no_news: bool,

        #[arg(long)]
        no_press_releases: bool,

        #[arg(long)]
        no_ratings: bool,
    },
    /// Rule-based rating for one ticker, enriched unless disabled.
    Rate {
        ticker: String,

        #[arg(long, value_enum, default_value_t = StrategyArg::Weighted)]
        strategy: StrategyArg,

        #[arg(long)]
        no_enrich: bool,
    },
    /// Short-term impact classification of one news article.
    AnalyzeArticle {
        url: String,

        #[arg(long)]
        ticker: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SideArg {
    Calls,
    Puts,
    Both,
}

impl From<SideArg> for ChainSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Calls => ChainSide::Calls,
            SideArg::Puts => ChainSide::Puts,
            SideArg::Both => ChainSide::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Weighted,
    Composite,
}

impl From<StrategyArg> for StrategyKind {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::Weighted => StrategyKind::Weighted,
            StrategyArg::Composite => StrategyKind::Composite,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let output = match args.command {
        Command::Snapshot {
            tickers,
            expiration,
            side,
            limit,
            news_count,
            no_news,
            no_press_releases,
            no_ratings,
        } => {
            let req = MultiSnapshotRequest {
                tickers,
                expiration,
                side: side.into(),
                limit,
                news_count,
                include_news: !no_news,
                include_press_releases: !no_press_releases,
                include_ratings: !no_ratings,
            };
            let snapshots = orchestrator(&settings)?.snapshot_many(&req).await;
            serde_json::to_value(&snapshots)?
        }
        Command::Rate {
            ticker,
            strategy,
            no_enrich,
        } => {
            let rating = orchestrator(&settings)?
                .rate_symbol(&ticker, strategy.into(), !no_enrich, DEFAULT_NEWS_COUNT)
                .await
                .map_err(report)?;
            serde_json::to_value(&rating)?
        }
        Command::AnalyzeArticle { url, ticker } => {
            let text = ArticleFetcher::from_settings(&settings)?
                .fetch_text(&url)
                .await
                .map_err(report)?;
            anyhow::ensure!(!text.trim().is_empty(), "unable to extract article text from {url}");

            let result = ArticleClassifier::from_settings(&settings)?
                .classify(&text, ticker.as_deref())
                .await
                .map_err(report)?;
            serde_json::json!({
                "url": url,
                "ticker": ticker,
                "overall": result.overall,
                "score": result.score,
                "rows": result.rows,
                "summary": null,
            })
        }
    };

    let pretty = serde_json::to_string_pretty(&output).context("failed to render output")?;
    println!("{pretty}");
    Ok(())
}

fn orchestrator(settings: &Settings) -> anyhow::Result<MultiSymbolOrchestrator> {
    Ok(MultiSymbolOrchestrator::new(
        Arc::new(YahooOptionsProvider::from_settings(settings)?),
        Arc::new(YahooNewsScraper::from_settings(settings)?),
        RatingEnricher::from_settings(settings)?,
        settings.multi_snapshot_concurrency,
    ))
}

/// Sends `err` to Sentry and logs any raw model output attached to it.
fn report(err: anyhow::Error) -> anyhow::Error {
    sentry_anyhow::capture_anyhow(&err);
    if let Some(diag) = err.downcast_ref::<LlmDiagnosticsError>() {
        tracing::error!(
            provider = %diag.provider,
            stage = diag.stage,
            raw_output = diag.raw_output.as_deref().unwrap_or(""),
            "text-generation call failed"
        );
    }
    err
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

    #[test]
    fn snapshot_flags_and_defaults() {
        let args = Args::try_parse_from([
            "optnews_worker",
            "snapshot",
            "aapl",
            "msft",
            "--side",
            "puts",
            "--no-press-releases",
        ])
        .unwrap();

        match args.command {
            Command::Snapshot {
                tickers,
                side,
                limit,
                news_count,
                no_news,
                no_press_releases,
                ..
            } => {
                assert_eq!(tickers, vec!["aapl", "msft"]);
                assert_eq!(ChainSide::from(side), ChainSide::Puts);
                assert_eq!(limit, 20);
                assert_eq!(news_count, 3);
                assert!(!no_news);
                assert!(no_press_releases);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn snapshot_needs_a_ticker() {
        assert!(Args::try_parse_from(["optnews_worker", "snapshot"]).is_err());
    }

    #[test]
    fn rate_strategy_flag() {
        let args = Args::try_parse_from([
            "optnews_worker",
            "rate",
            "TSLA",
            "--strategy",
            "composite",
            "--no-enrich",
        ])
        .unwrap();
        match args.command {
            Command::Rate {
                ticker,
                strategy,
                no_enrich,
            } => {
                assert_eq!(ticker, "TSLA");
                assert_eq!(StrategyKind::from(strategy), StrategyKind::Composite);
                assert!(no_enrich);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn analyze_article_takes_optional_ticker() {
        let args = Args::try_parse_from([
            "optnews_worker",
            "analyze-article",
            "https://example.com/story",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::AnalyzeArticle { ticker: None, .. }
        ));
    }
}

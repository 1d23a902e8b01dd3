use crate::config::Settings;
use crate::domain::snapshot::{ChainSide, OptionChainSnapshot, OptionContract, OptionsSummary};
use crate::market::types::{OptionChainResult, OptionsResponse};
use crate::market::MarketDataProvider;
use crate::rating::metrics::finite;
use anyhow::{Context, Result};
use chrono::DateTime;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::cmp::Ordering;
use std::time::Duration;

const CLIENT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) OptionsNewsMCP/0.1";
const NO_EXPIRATIONS_NOTE: &str = "No option expirations available; returned empty chain.";

/// Option chains and quote fields from the Yahoo Finance options endpoint.
#[derive(Debug, Clone)]
pub struct YahooOptionsProvider {
    http: reqwest::Client,
    base_url: String,
}

impl YahooOptionsProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.yahoo_timeout_secs))
            .build()
            .context("failed to build Yahoo options http client")?;

        Ok(Self {
            http,
            base_url: settings.yahoo_api_base_url.clone(),
        })
    }

    fn url(&self, symbol: &str) -> String {
        format!(
            "{}/v7/finance/options/{}",
            self.base_url.trim_end_matches('/'),
            symbol
        )
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    async fn fetch_once(&self, symbol: &str, date: Option<i64>) -> Result<OptionChainResult> {
        let mut req = self.http.get(self.url(symbol)).headers(Self::headers());
        if let Some(date) = date {
            req = req.query(&[("date", date.to_string())]);
        }

        let res = req.send().await.context("Yahoo options request failed")?;
        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Yahoo options response")?;

        if !status.is_success() {
            anyhow::bail!("Yahoo options HTTP {status} for {symbol}");
        }

        let parsed = serde_json::from_str::<OptionsResponse>(&text)
            .with_context(|| format!("Yahoo options response for {symbol} has unexpected shape"))?;

        if let Some(err) = parsed.option_chain.error.filter(|e| !e.is_null()) {
            anyhow::bail!("Yahoo options error for {symbol}: {err}");
        }

        parsed
            .option_chain
            .result
            .into_iter()
            .next()
            .with_context(|| format!("no option data for {symbol}"))
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooOptionsProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn option_chain(
        &self,
        ticker: &str,
        expiration: Option<&str>,
        side: ChainSide,
        limit: usize,
    ) -> Result<OptionChainSnapshot> {
        let symbol = ticker.trim().to_uppercase();
        let nearest = self.fetch_once(&symbol, None).await?;
        let listed = listed_expirations(&nearest.expiration_dates);
        let dates: Vec<String> = listed.iter().map(|(_, d)| d.clone()).collect();

        let result = match epoch_to_fetch(&listed, expiration) {
            Some(epoch) => {
                tracing::debug!(%symbol, epoch, "fetching non-nearest expiration");
                self.fetch_once(&symbol, Some(epoch)).await?
            }
            None => nearest,
        };

        Ok(build_chain_snapshot(&symbol, result, &dates, expiration, side, limit))
    }

    async fn expirations(&self, ticker: &str) -> Result<Vec<String>> {
        let symbol = ticker.trim().to_uppercase();
        let result = self.fetch_once(&symbol, None).await?;
        Ok(listed_expirations(&result.expiration_dates)
            .into_iter()
            .map(|(_, date)| date)
            .collect())
    }
}

fn epoch_to_date(secs: i64) -> Option<String> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
}

/// Epochs paired with their dates; epochs outside chrono's range are skipped.
fn listed_expirations(epochs: &[i64]) -> Vec<(i64, String)> {
    epochs
        .iter()
        .filter_map(|&e| epoch_to_date(e).map(|d| (e, d)))
        .collect()
}

/// Epoch to request when the selected expiration is not the nearest one.
fn epoch_to_fetch(listed: &[(i64, String)], requested: Option<&str>) -> Option<i64> {
    let dates: Vec<String> = listed.iter().map(|(_, d)| d.clone()).collect();
    match select_expiration(&dates, requested) {
        Some(idx) if idx > 0 => Some(listed[idx].0),
        _ => None,
    }
}

/// Index of the requested expiration, or of the nearest one when it is not listed.
pub fn select_expiration(dates: &[String], requested: Option<&str>) -> Option<usize> {
    if dates.is_empty() {
        return None;
    }
    Some(
        requested
            .and_then(|r| dates.iter().position(|d| d == r.trim()))
            .unwrap_or(0),
    )
}

fn clean_contract(mut c: OptionContract) -> OptionContract {
    c.strike = finite(c.strike);
    c.last_price = finite(c.last_price);
    c.bid = finite(c.bid);
    c.ask = finite(c.ask);
    c.volume = finite(c.volume);
    c.open_interest = finite(c.open_interest);
    c.implied_volatility = finite(c.implied_volatility);
    c
}

/// Top `limit` rows by volume (missing volume last), dropping rows without a positive strike.
pub fn simplify_contracts(contracts: Vec<OptionContract>, limit: usize) -> Vec<OptionContract> {
    let mut rows: Vec<OptionContract> = contracts.into_iter().map(clean_contract).collect();
    rows.sort_by(|a, b| match (a.volume, b.volume) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    rows.truncate(limit);
    rows.retain(|c| c.strike.is_some_and(|s| s > 0.0));
    rows
}

pub fn build_chain_snapshot(
    symbol: &str,
    result: OptionChainResult,
    dates: &[String],
    requested: Option<&str>,
    side: ChainSide,
    limit: usize,
) -> OptionChainSnapshot {
    let quote = result.quote.unwrap_or_default();
    let underlying_price = finite(quote.regular_market_price);

    let Some(idx) = select_expiration(dates, requested) else {
        return OptionChainSnapshot {
            ticker: symbol.to_string(),
            underlying_price,
            calls: Some(vec![]),
            puts: Some(vec![]),
            note: Some(NO_EXPIRATIONS_NOTE.to_string()),
            ..Default::default()
        };
    };

    let block = result.options.into_iter().next().unwrap_or_default();
    let calls: Vec<OptionContract> = block.calls.into_iter().map(clean_contract).collect();
    let puts: Vec<OptionContract> = block.puts.into_iter().map(clean_contract).collect();
    let options_summary = OptionsSummary::from_contracts(&calls, &puts);

    OptionChainSnapshot {
        ticker: symbol.to_string(),
        expiration: Some(dates[idx].clone()),
        underlying_price,
        prev_close: finite(quote.regular_market_previous_close),
        open: finite(quote.regular_market_open),
        volume: finite(quote.regular_market_volume),
        avg_volume_10d: finite(quote.average_daily_volume_10_day),
        avg_volume_3m: finite(quote.average_daily_volume_3_month),
        earnings_date: quote
            .earnings_timestamp
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.to_rfc3339()),
        calls: side
            .includes_calls()
            .then(|| simplify_contracts(calls, limit)),
        puts: side.includes_puts().then(|| simplify_contracts(puts, limit)),
        options_summary: Some(options_summary),
        note: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> OptionChainResult {
        let v = json!({
            "optionChain": {
                "result": [{
                    "underlyingSymbol": "LB",
                    "expirationDates": [1737072000, 1737676800],
                    "quote": {
                        "regularMarketPrice": 61.88,
                        "regularMarketPreviousClose": 70.5,
                        "regularMarketOpen": 70.5,
                        "regularMarketVolume": 1782661,
                        "averageDailyVolume3Month": 280000,
                        "averageDailyVolume10Day": 310000,
                        "earningsTimestamp": 1739998800
                    },
                    "options": [{
                        "expirationDate": 1737072000,
                        "calls": [
                            {"contractSymbol": "LB250117C00060000", "strike": 60.0, "volume": 500, "openInterest": 1200},
                            {"contractSymbol": "LB250117C00065000", "strike": 65.0, "volume": 1500, "openInterest": 800},
                            {"contractSymbol": "LB250117C00070000", "strike": 70.0, "openInterest": 10},
                            {"contractSymbol": "BROKEN", "strike": 0.0, "volume": 9000}
                        ],
                        "puts": [
                            {"contractSymbol": "LB250117P00060000", "strike": 60.0, "volume": 700, "openInterest": 400}
                        ]
                    }]
                }],
                "error": null
            }
        });
        let parsed: OptionsResponse = serde_json::from_value(v).unwrap();
        parsed.option_chain.result.into_iter().next().unwrap()
    }

    #[test]
    fn builds_snapshot_from_nearest_expiration() {
        let result = fixture();
        let dates: Vec<String> = listed_expirations(&result.expiration_dates)
            .into_iter()
            .map(|(_, d)| d)
            .collect();
        assert_eq!(dates, vec!["2025-01-17".to_string(), "2025-01-24".to_string()]);

        let snap = build_chain_snapshot("LB", result, &dates, None, ChainSide::Both, 20);
        assert_eq!(snap.expiration.as_deref(), Some("2025-01-17"));
        assert_eq!(snap.underlying_price, Some(61.88));
        assert_eq!(snap.avg_volume_3m, Some(280_000.0));
        assert!(snap.earnings_date.as_deref().unwrap().starts_with("2025-02-19"));

        let calls = snap.calls.unwrap();
        let symbols: Vec<_> = calls
            .iter()
            .map(|c| c.contract_symbol.clone().unwrap())
            .collect();
        assert_eq!(
            symbols,
            vec!["LB250117C00065000", "LB250117C00060000", "LB250117C00070000"]
        );

        // Summary covers the whole chain, including rows trimmed from output.
        let summary = snap.options_summary.unwrap();
        assert_eq!(summary.call_volume, Some(11_000.0));
        assert_eq!(summary.put_volume, Some(700.0));
    }

    #[test]
    fn side_filter_and_limit() {
        let result = fixture();
        let dates = vec!["2025-01-17".to_string(), "2025-01-24".to_string()];
        let snap = build_chain_snapshot("LB", result, &dates, None, ChainSide::Puts, 1);
        assert!(snap.calls.is_none());
        assert_eq!(snap.puts.unwrap().len(), 1);
    }

    #[test]
    fn limit_applies_before_dropping_broken_rows() {
        let result = fixture();
        let dates = vec!["2025-01-17".to_string(), "2025-01-24".to_string()];
        let snap = build_chain_snapshot("LB", result, &dates, None, ChainSide::Calls, 2);
        // The highest-volume row has strike 0 and is dropped after trimming.
        assert_eq!(snap.calls.unwrap().len(), 1);
    }

    #[test]
    fn empty_expirations_return_empty_chain_with_note() {
        let result = OptionChainResult::default();
        let snap = build_chain_snapshot("ZZZ", result, &[], Some("2025-01-17"), ChainSide::Both, 20);
        assert_eq!(snap.expiration, None);
        assert_eq!(snap.calls, Some(vec![]));
        assert_eq!(snap.note.as_deref(), Some(NO_EXPIRATIONS_NOTE));
    }

    #[test]
    fn unknown_expiration_falls_back_to_nearest() {
        let dates = vec!["2025-01-17".to_string(), "2025-01-24".to_string()];
        assert_eq!(select_expiration(&dates, Some("2025-01-24")), Some(1));
        assert_eq!(select_expiration(&dates, Some("2030-01-01")), Some(0));
        assert_eq!(select_expiration(&dates, None), Some(0));
        assert_eq!(select_expiration(&[], None), None);
    }

    #[test]
    fn unrepresentable_epochs_do_not_shift_the_fetched_expiration() {
        let listed = listed_expirations(&[i64::MAX, 1737072000, 1737676800]);
        assert_eq!(
            listed,
            vec![
                (1737072000, "2025-01-17".to_string()),
                (1737676800, "2025-01-24".to_string()),
            ]
        );
        assert_eq!(epoch_to_fetch(&listed, Some("2025-01-24")), Some(1737676800));
        assert_eq!(epoch_to_fetch(&listed, Some("2025-01-17")), None);
        assert_eq!(epoch_to_fetch(&listed, None), None);
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainSide {
    Calls,
    Puts,
    #[default]
    Both,
}

impl ChainSide {
    pub fn includes_calls(&self) -> bool {
        matches!(self, Self::Calls | Self::Both)
    }

    pub fn includes_puts(&self) -> bool {
        matches!(self, Self::Puts | Self::Both)
    }
}

/// One option contract row, in the upstream field naming.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionContract {
    #[serde(default)]
    pub contract_symbol: Option<String>,
    #[serde(default)]
    pub strike: Option<f64>,
    #[serde(default)]
    pub last_price: Option<f64>,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub open_interest: Option<f64>,
    #[serde(default)]
    pub implied_volatility: Option<f64>,
    #[serde(default)]
    pub in_the_money: Option<bool>,
}

/// Side totals over the full chain of one expiration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionsSummary {
    #[serde(default)]
    pub call_volume: Option<f64>,
    #[serde(default)]
    pub put_volume: Option<f64>,
    #[serde(default)]
    pub total_call_oi: Option<f64>,
    #[serde(default)]
    pub total_put_oi: Option<f64>,
}

impl OptionsSummary {
    pub fn from_contracts(calls: &[OptionContract], puts: &[OptionContract]) -> Self {
        Self {
            call_volume: sum_present(calls.iter().map(|c| c.volume)),
            put_volume: sum_present(puts.iter().map(|c| c.volume)),
            total_call_oi: sum_present(calls.iter().map(|c| c.open_interest)),
            total_put_oi: sum_present(puts.iter().map(|c| c.open_interest)),
        }
    }
}

fn sum_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    values
        .flatten()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionChainSnapshot {
    pub ticker: String,
    pub expiration: Option<String>,
    pub underlying_price: Option<f64>,
    #[serde(default)]
    pub prev_close: Option<f64>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub avg_volume_10d: Option<f64>,
    #[serde(default)]
    pub avg_volume_3m: Option<f64>,
    #[serde(default)]
    pub earnings_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calls: Option<Vec<OptionContract>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub puts: Option<Vec<OptionContract>>,
    #[serde(default)]
    pub options_summary: Option<OptionsSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Per-symbol facts fed to the rating engine. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    #[serde(default)]
    pub underlying_price: Option<f64>,
    #[serde(default)]
    pub prev_close: Option<f64>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub avg_volume_3m: Option<f64>,
    #[serde(default)]
    pub options_summary: Option<OptionsSummary>,
    /// Externally computed news sentiment on the -2..=2 scale, if any.
    #[serde(default)]
    pub news_sentiment_score: Option<f64>,
}

impl MarketSnapshot {
    pub fn from_chain(chain: &OptionChainSnapshot) -> Self {
        Self {
            ticker: chain.ticker.clone(),
            underlying_price: chain.underlying_price,
            prev_close: chain.prev_close,
            open: chain.open,
            volume: chain.volume,
            avg_volume_3m: chain.avg_volume_3m,
            options_summary: chain.options_summary.clone(),
            news_sentiment_score: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(volume: Option<f64>, oi: Option<f64>) -> OptionContract {
        OptionContract {
            strike: Some(100.0),
            volume,
            open_interest: oi,
            ..Default::default()
        }
    }

    #[test]
    fn summary_sums_present_values_only() {
        let calls = vec![contract(Some(10.0), Some(100.0)), contract(None, Some(5.0))];
        let puts = vec![contract(None, None)];
        let s = OptionsSummary::from_contracts(&calls, &puts);
        assert_eq!(s.call_volume, Some(10.0));
        assert_eq!(s.total_call_oi, Some(105.0));
        assert_eq!(s.put_volume, None);
        assert_eq!(s.total_put_oi, None);
    }

    #[test]
    fn contract_reads_upstream_field_names() {
        let c: OptionContract = serde_json::from_str(
            r#"{"contractSymbol":"AAPL250117C00150000","strike":150.0,"openInterest":12,"inTheMoney":true}"#,
        )
        .unwrap();
        assert_eq!(c.contract_symbol.as_deref(), Some("AAPL250117C00150000"));
        assert_eq!(c.open_interest, Some(12.0));
        assert_eq!(c.in_the_money, Some(true));
        assert_eq!(c.volume, None);
    }
}

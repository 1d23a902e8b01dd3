use crate::domain::snapshot::OptionContract;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsResponse {
    pub option_chain: OptionChainEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionChainEnvelope {
    #[serde(default)]
    pub result: Vec<OptionChainResult>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionChainResult {
    #[serde(default)]
    pub underlying_symbol: Option<String>,
    /// Unix seconds, nearest first.
    #[serde(default)]
    pub expiration_dates: Vec<i64>,
    #[serde(default)]
    pub quote: Option<Quote>,
    #[serde(default)]
    pub options: Vec<ExpirationBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    #[serde(default)]
    pub regular_market_previous_close: Option<f64>,
    #[serde(default)]
    pub regular_market_open: Option<f64>,
    #[serde(default)]
    pub regular_market_volume: Option<f64>,
    #[serde(default, rename = "averageDailyVolume10Day")]
    pub average_daily_volume_10_day: Option<f64>,
    #[serde(default, rename = "averageDailyVolume3Month")]
    pub average_daily_volume_3_month: Option<f64>,
    #[serde(default)]
    pub earnings_timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirationBlock {
    #[serde(default)]
    pub expiration_date: Option<i64>,
    #[serde(default)]
    pub calls: Vec<OptionContract>,
    #[serde(default)]
    pub puts: Vec<OptionContract>,
}

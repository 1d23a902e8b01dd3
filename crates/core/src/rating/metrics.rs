use crate::domain::snapshot::MarketSnapshot;
use serde::Serialize;

/// Drops NaN and infinities so they read as "absent".
pub fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

pub fn safe_div(num: Option<f64>, denom: Option<f64>) -> Option<f64> {
    let (num, denom) = (finite(num)?, finite(denom)?);
    if denom == 0.0 {
        return None;
    }
    finite(Some(num / denom))
}

/// `(value - base) / base * 100`, absent when either side is missing or `base` is zero.
pub fn pct_change_from(value: Option<f64>, base: Option<f64>) -> Option<f64> {
    let value = finite(value)?;
    safe_div(Some(value - finite(base)?), base).map(|r| r * 100.0)
}

/// Derived signals for one snapshot. Also the `metrics` object sent to the
/// enrichment model, so the raw inputs are echoed alongside the ratios.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub ticker: String,
    pub underlying_price: Option<f64>,
    pub prev_close: Option<f64>,
    pub open: Option<f64>,
    pub volume_today: Option<f64>,
    pub avg_volume_3m: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub pct_change: Option<f64>,
    pub gap_pct: Option<f64>,
    /// Move from the open to the last price.
    pub intraday_pct: Option<f64>,
    pub call_volume: Option<f64>,
    pub put_volume: Option<f64>,
    pub put_call_ratio: Option<f64>,
    /// Total option volume over underlying share volume.
    pub options_volume_ratio: Option<f64>,
    pub news_score_raw: Option<f64>,
}

impl Metrics {
    pub fn extract(snapshot: &MarketSnapshot) -> Self {
        let last = finite(snapshot.underlying_price);
        let prev_close = finite(snapshot.prev_close);
        let open = finite(snapshot.open);
        let volume = finite(snapshot.volume);
        let avg_volume_3m = finite(snapshot.avg_volume_3m);

        let (call_volume, put_volume) = snapshot
            .options_summary
            .as_ref()
            .map(|o| (finite(o.call_volume), finite(o.put_volume)))
            .unwrap_or((None, None));

        let options_volume = match (call_volume, put_volume) {
            (None, None) => None,
            (c, p) => Some(c.unwrap_or(0.0) + p.unwrap_or(0.0)),
        };

        Self {
            ticker: snapshot.ticker.clone(),
            underlying_price: last,
            prev_close,
            open,
            volume_today: volume,
            avg_volume_3m,
            volume_ratio: safe_div(volume, avg_volume_3m),
            pct_change: pct_change_from(last, prev_close),
            gap_pct: pct_change_from(open, prev_close),
            intraday_pct: pct_change_from(last, open),
            call_volume,
            put_volume,
            put_call_ratio: safe_div(put_volume, call_volume),
            options_volume_ratio: safe_div(options_volume, volume),
            news_score_raw: finite(snapshot.news_sentiment_score),
        }
    }
}

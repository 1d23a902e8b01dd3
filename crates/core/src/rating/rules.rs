use crate::domain::news::NewsItem;
use crate::domain::rating::{FactorScore, Provenance, Rating, RatingLabel, DEFAULT_TIMEFRAME};
use crate::rating::metrics::Metrics;
use crate::rating::{news_tone, summarize, RatingStrategy};

pub const FACTOR_VOLUME: &str = "Volume";
pub const FACTOR_PRICE: &str = "Price action";
pub const FACTOR_OPTIONS: &str = "Options flow";
pub const FACTOR_NEWS: &str = "News";

// Weights 0.30 / 0.30 / 0.25 / 0.15, held in twentieths so the sum is exact.
const WEIGHT_VOLUME: i32 = 6;
const WEIGHT_PRICE: i32 = 6;
const WEIGHT_OPTIONS: i32 = 5;
const WEIGHT_NEWS: i32 = 3;
const WEIGHT_SCALE: f64 = 20.0;

pub fn score_volume(volume_ratio: Option<f64>) -> i32 {
    let Some(r) = volume_ratio else {
        return 0;
    };
    if r >= 4.0 {
        2
    } else if r >= 2.0 {
        1
    } else if r >= 0.7 {
        // Anything from 0.7 up to 2 is neutral.
        0
    } else if r >= 0.4 {
        -1
    } else {
        -2
    }
}

pub fn score_price(pct_change: Option<f64>, gap_pct: Option<f64>) -> i32 {
    let Some(pct) = pct_change else {
        return 0;
    };

    let mut score = if pct >= 5.0 {
        2
    } else if pct >= 3.0 {
        1
    } else if pct <= -5.0 {
        -2
    } else if pct <= -3.0 {
        -1
    } else {
        0
    };

    match gap_pct {
        Some(gap) if gap >= 3.0 => score += 1,
        Some(gap) if gap <= -3.0 => score -= 1,
        _ => {}
    }

    score.clamp(-2, 2)
}

pub fn score_options(put_call_ratio: Option<f64>) -> i32 {
    let Some(pcr) = put_call_ratio else {
        return 0;
    };
    if pcr <= 0.5 {
        2
    } else if pcr <= 0.8 {
        1
    } else if pcr < 1.2 {
        0
    } else if pcr <= 1.5 {
        -1
    } else {
        -2
    }
}

/// External sentiment wins when supplied; otherwise headline keywords are bucketed.
pub fn score_news(external: Option<f64>, headlines: &[NewsItem]) -> i32 {
    match external {
        Some(v) => v.clamp(-2.0, 2.0).trunc() as i32,
        None => news_tone::bucket(news_tone::raw_score(
            headlines.iter().map(|n| n.title.as_str()),
        )),
    }
}

pub fn weighted_numeric(volume: i32, price: i32, options: i32, news: i32) -> f64 {
    let twentieths = WEIGHT_VOLUME * volume
        + WEIGHT_PRICE * price
        + WEIGHT_OPTIONS * options
        + WEIGHT_NEWS * news;
    (f64::from(twentieths) / WEIGHT_SCALE).clamp(-2.0, 2.0)
}

pub fn map_overall_label(numeric: f64) -> RatingLabel {
    if numeric >= 1.5 {
        RatingLabel::StrongBuy
    } else if numeric >= 0.5 {
        RatingLabel::Buy
    } else if numeric <= -1.5 {
        RatingLabel::Avoid
    } else if numeric <= -0.5 {
        RatingLabel::Sell
    } else {
        RatingLabel::Neutral
    }
}

fn volume_reason(m: &Metrics) -> String {
    match m.volume_ratio {
        Some(vr) => format!("Volume is {vr:.1}× the 3-month average."),
        None => "Volume data not available.".to_string(),
    }
}

fn price_reason(m: &Metrics) -> String {
    let Some(pct) = m.pct_change else {
        return "Price change data not available.".to_string();
    };
    let mut reason = format!("Price moved {pct:.1}% today.");
    if let Some(gap) = m.gap_pct.filter(|g| g.abs() >= 1.0) {
        reason.push_str(&format!(" Opened with a {gap:.1}% gap."));
    }
    reason
}

fn options_reason(m: &Metrics) -> String {
    let Some(pcr) = m.put_call_ratio else {
        return "Options volume data not available.".to_string();
    };
    let mut reason = format!("Put/Call volume ratio is {pcr:.2}.");
    if let (Some(calls), Some(puts)) = (m.call_volume, m.put_volume) {
        reason.push_str(&format!(" Calls: {calls:.0}, Puts: {puts:.0}."));
    }
    reason
}

fn news_reason(score: i32) -> String {
    match score {
        0 => "News impact is neutral or not evaluated.",
        s if s > 0 => "Recent news is short-term bullish.",
        _ => "Recent news is short-term bearish.",
    }
    .to_string()
}

/// Weighted four-factor rating on the -2..=2 scale (`Strong Buy` .. `Avoid`).
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedRules;

impl RatingStrategy for WeightedRules {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn rate(&self, metrics: &Metrics, headlines: &[NewsItem]) -> Rating {
        let volume = score_volume(metrics.volume_ratio);
        let price = score_price(metrics.pct_change, metrics.gap_pct);
        let options = score_options(metrics.put_call_ratio);
        let news = score_news(metrics.news_score_raw, headlines);

        let numeric = weighted_numeric(volume, price, options, news);
        let label = map_overall_label(numeric);

        let factors = vec![
            FactorScore::new(FACTOR_VOLUME, volume, volume_reason(metrics)),
            FactorScore::new(FACTOR_PRICE, price, price_reason(metrics)),
            FactorScore::new(FACTOR_OPTIONS, options, options_reason(metrics)),
            FactorScore::new(FACTOR_NEWS, news, news_reason(news)),
        ];

        Rating {
            label,
            numeric,
            timeframe: DEFAULT_TIMEFRAME.to_string(),
            summary: summarize(label, numeric, &factors),
            factors,
            provenance: Provenance::Rules,
        }
    }
}

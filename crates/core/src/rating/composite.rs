use crate::domain::news::NewsItem;
use crate::domain::rating::{FactorScore, Provenance, Rating, RatingLabel, DEFAULT_TIMEFRAME};
use crate::rating::metrics::Metrics;
use crate::rating::rules::{FACTOR_NEWS, FACTOR_OPTIONS, FACTOR_PRICE, FACTOR_VOLUME};
use crate::rating::{news_tone, summarize, RatingStrategy};

pub fn volume_score(volume_ratio: Option<f64>) -> i32 {
    match volume_ratio {
        None => 0,
        Some(r) if r >= 3.0 => 2,
        Some(r) if r >= 1.5 => 1,
        Some(r) if r >= 0.7 => 0,
        Some(r) if r >= 0.4 => -1,
        Some(_) => -2,
    }
}

pub fn price_score(gap_pct: Option<f64>, intraday_pct: Option<f64>) -> i32 {
    let mut score = 0;
    match gap_pct {
        Some(g) if g >= 3.0 => score += 1,
        Some(g) if g <= -3.0 => score -= 1,
        _ => {}
    }
    match intraday_pct {
        Some(c) if c >= 2.0 => score += 1,
        Some(c) if c <= -2.0 => score -= 1,
        _ => {}
    }
    score.clamp(-2, 2)
}

pub fn options_score(put_call_ratio: Option<f64>, options_volume_ratio: Option<f64>) -> i32 {
    let mut score = 0;
    match put_call_ratio {
        Some(p) if p < 0.7 => score += 1,
        Some(p) if p > 1.3 => score -= 1,
        _ => {}
    }
    if options_volume_ratio.is_some_and(|r| r >= 0.5) {
        score += 1;
    }
    score.clamp(-2, 2)
}

pub fn news_score(raw: i32) -> i32 {
    news_tone::bucket(raw)
}

pub fn total_label(total: i32) -> RatingLabel {
    match total {
        t if t >= 6 => RatingLabel::StrongBuy,
        t if t >= 3 => RatingLabel::Buy,
        t if t >= -2 => RatingLabel::Neutral,
        t if t >= -5 => RatingLabel::Sell,
        _ => RatingLabel::StrongSell,
    }
}

fn fmt_opt(v: Option<f64>, unit: &str) -> String {
    v.map(|x| format!("{x:.1}{unit}"))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Unweighted sum of four integer sub-scores on the -8..=8 scale
/// (`Strong Buy` .. `Strong Sell`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeTotals;

impl RatingStrategy for CompositeTotals {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn rate(&self, metrics: &Metrics, headlines: &[NewsItem]) -> Rating {
        let raw_news = news_tone::raw_score(headlines.iter().map(|n| n.title.as_str()));

        let volume = volume_score(metrics.volume_ratio);
        let price = price_score(metrics.gap_pct, metrics.intraday_pct);
        let options = options_score(metrics.put_call_ratio, metrics.options_volume_ratio);
        let news = news_score(raw_news);

        let total = volume + price + options + news;
        let label = total_label(total);
        let numeric = f64::from(total);

        let volume_reason = match metrics.volume_ratio {
            Some(vr) => format!("Volume is {vr:.1}× the 3-month average."),
            None => "Volume data not available.".to_string(),
        };
        let price_reason = format!(
            "Gap {} from previous close, {} since the open.",
            fmt_opt(metrics.gap_pct, "%"),
            fmt_opt(metrics.intraday_pct, "%"),
        );
        let options_reason = match (metrics.put_call_ratio, metrics.options_volume_ratio) {
            (None, None) => "Options volume data not available.".to_string(),
            (pcr, ovr) => format!(
                "Put/Call volume ratio {}, options volume {} of share volume.",
                pcr.map(|p| format!("{p:.2}"))
                    .unwrap_or_else(|| "n/a".to_string()),
                fmt_opt(ovr, "×"),
            ),
        };
        let news_reason = if headlines.is_empty() {
            "No headlines to evaluate.".to_string()
        } else {
            format!(
                "Net keyword score {raw_news:+} across {} headlines.",
                headlines.len()
            )
        };

        let factors = vec![
            FactorScore::new(FACTOR_VOLUME, volume, volume_reason),
            FactorScore::new(FACTOR_PRICE, price, price_reason),
            FactorScore::new(FACTOR_OPTIONS, options, options_reason),
            FactorScore::new(FACTOR_NEWS, news, news_reason),
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

#[cfg(test)]
mod tests {
    use super::*;

    fn headline(title: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            publisher: Some("Wire".to_string()),
            relative_time: Some("2h ago".to_string()),
            link: String::new(),
        }
    }

    #[test]
    fn volume_cutoffs_differ_from_weighted_scheme() {
        assert_eq!(volume_score(Some(3.0)), 2);
        assert_eq!(volume_score(Some(1.5)), 1);
        assert_eq!(volume_score(Some(0.7)), 0);
        assert_eq!(volume_score(Some(0.4)), -1);
        assert_eq!(volume_score(Some(0.1)), -2);
        assert_eq!(volume_score(None), 0);
    }

    #[test]
    fn price_combines_gap_and_intraday() {
        assert_eq!(price_score(Some(3.0), Some(2.0)), 2);
        assert_eq!(price_score(Some(-3.0), Some(2.5)), 0);
        assert_eq!(price_score(None, Some(-2.0)), -1);
        assert_eq!(price_score(None, None), 0);
    }

    #[test]
    fn options_uses_ratio_and_relative_volume() {
        assert_eq!(options_score(Some(0.5), Some(0.6)), 2);
        assert_eq!(options_score(Some(1.5), None), -1);
        assert_eq!(options_score(Some(1.5), Some(0.9)), 0);
        assert_eq!(options_score(Some(1.0), Some(0.2)), 0);
    }

    #[test]
    fn label_table() {
        assert_eq!(total_label(8), RatingLabel::StrongBuy);
        assert_eq!(total_label(6), RatingLabel::StrongBuy);
        assert_eq!(total_label(3), RatingLabel::Buy);
        assert_eq!(total_label(-2), RatingLabel::Neutral);
        assert_eq!(total_label(-5), RatingLabel::Sell);
        assert_eq!(total_label(-6), RatingLabel::StrongSell);
    }

    #[test]
    fn total_is_unweighted_sum() {
        let metrics = Metrics {
            volume_ratio: Some(3.5),
            gap_pct: Some(4.0),
            intraday_pct: Some(2.5),
            put_call_ratio: Some(0.4),
            options_volume_ratio: Some(0.8),
            ..Default::default()
        };
        let headlines = vec![
            headline("Company beats estimates and raises guidance"),
            headline("Analyst upgrade to outperform"),
        ];
        let rating = CompositeTotals.rate(&metrics, &headlines);
        assert_eq!(rating.numeric, 8.0);
        assert_eq!(rating.label, RatingLabel::StrongBuy);
        assert_eq!(rating.factors[3].score, 2.0);
    }

    #[test]
    fn total_is_bounded() {
        let worst = Metrics {
            volume_ratio: Some(0.1),
            gap_pct: Some(-9.0),
            intraday_pct: Some(-9.0),
            put_call_ratio: Some(4.0),
            ..Default::default()
        };
        let bad_news = vec![headline("SEC investigation and lawsuit follow recall warning")];
        let rating = CompositeTotals.rate(&worst, &bad_news);
        assert!((-8.0..=8.0).contains(&rating.numeric));
        assert_eq!(rating.label, RatingLabel::StrongSell);
    }
}

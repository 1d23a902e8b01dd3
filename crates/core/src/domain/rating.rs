use crate::llm::Provider;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_TIMEFRAME: &str = "1–3 days";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    Bullish,
    Bearish,
    Neutral,
}

impl Impact {
    /// Sign-derived classification: `>= 1` bullish, `<= -1` bearish, otherwise neutral.
    pub fn from_score(score: f64) -> Self {
        if score >= 1.0 {
            Self::Bullish
        } else if score <= -1.0 {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }

    /// Exact, case-sensitive match on the wire names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Bullish" => Some(Self::Bullish),
            "Bearish" => Some(Self::Bearish),
            "Neutral" => Some(Self::Neutral),
            _ => None,
        }
    }
}

/// Union of both label tables: the weighted scheme bottoms out at `Avoid`,
/// the composite scheme at `StrongSell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatingLabel {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    Avoid,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl RatingLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong Buy",
            Self::Buy => "Buy",
            Self::Neutral => "Neutral",
            Self::Sell => "Sell",
            Self::Avoid => "Avoid",
            Self::StrongSell => "Strong Sell",
        }
    }
}

impl fmt::Display for RatingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    #[serde(rename = "rules")]
    Rules,
    #[serde(rename = "groq+rules")]
    GroqRules,
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "rules_error")]
    RulesError,
}

impl Provenance {
    pub fn enriched_by(provider: Provider) -> Self {
        match provider {
            Provider::Groq => Self::GroqRules,
            Provider::OpenAI => Self::OpenAI,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub name: String,
    pub impact: Impact,
    pub score: f64,
    pub reason: String,
}

impl FactorScore {
    pub fn new(name: &str, score: i32, reason: String) -> Self {
        let score = f64::from(score);
        Self {
            name: name.to_string(),
            impact: Impact::from_score(score),
            score,
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub label: RatingLabel,
    pub numeric: f64,
    pub timeframe: String,
    pub summary: String,
    pub factors: Vec<FactorScore>,
    #[serde(rename = "source")]
    pub provenance: Provenance,
}

impl Rating {
    pub fn factor(&self, name: &str) -> Option<&FactorScore> {
        self.factors.iter().find(|f| f.name == name)
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_follows_score_sign() {
        for s in -2..=2 {
            let expected = match s {
                1 | 2 => Impact::Bullish,
                -2 | -1 => Impact::Bearish,
                _ => Impact::Neutral,
            };
            assert_eq!(Impact::from_score(f64::from(s)), expected, "score {s}");
        }
        assert_eq!(Impact::from_score(0.5), Impact::Neutral);
        assert_eq!(Impact::from_score(-0.99), Impact::Neutral);
    }

    #[test]
    fn wire_names_match_rating_contract() {
        let rating = Rating {
            label: RatingLabel::StrongBuy,
            numeric: 2.0,
            timeframe: DEFAULT_TIMEFRAME.to_string(),
            summary: String::new(),
            factors: vec![FactorScore::new("Volume", -1, "x".to_string())],
            provenance: Provenance::GroqRules,
        };
        let v = serde_json::to_value(&rating).unwrap();
        assert_eq!(v["label"], "Strong Buy");
        assert_eq!(v["source"], "groq+rules");
        assert_eq!(v["factors"][0]["impact"], "Bearish");
        assert_eq!(
            serde_json::to_value(RatingLabel::StrongSell).unwrap(),
            "Strong Sell"
        );
    }

    #[test]
    fn parse_is_exact() {
        assert_eq!(Impact::parse("Bullish"), Some(Impact::Bullish));
        assert_eq!(Impact::parse("bullish"), None);
        assert_eq!(Impact::parse("Very Bullish"), None);
    }
}

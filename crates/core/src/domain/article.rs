use crate::domain::rating::Impact;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleImpactRow {
    pub factor: String,
    pub impact: Impact,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleClassification {
    pub overall: Impact,
    pub score: i64,
    pub rows: Vec<ArticleImpactRow>,
}

impl ArticleClassification {
    fn neutral(factor: &str, reason: &str) -> Self {
        Self {
            overall: Impact::Neutral,
            score: 0,
            rows: vec![ArticleImpactRow {
                factor: factor.to_string(),
                impact: Impact::Neutral,
                reason: reason.to_string(),
            }],
        }
    }

    /// Returned for blank article text, without calling the model.
    pub fn no_content() -> Self {
        Self::neutral(
            "Content",
            "No readable article content could be extracted.",
        )
    }

    /// Returned when the model answered with something that is not JSON.
    pub fn unparseable() -> Self {
        Self::neutral("Parsing", "The model response was not valid JSON.")
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default, rename = "relativeTime")]
    pub relative_time: Option<String>,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NewsSection {
    News,
    PressReleases,
}

impl NewsSection {
    /// Path segment on the quote page (`/quote/{SYMBOL}/{section}/`).
    pub fn as_path(&self) -> &'static str {
        match self {
            Self::News => "news",
            Self::PressReleases => "press-releases",
        }
    }
}

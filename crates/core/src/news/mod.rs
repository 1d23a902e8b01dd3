pub mod article;
pub mod yahoo;

use crate::domain::news::{NewsItem, NewsSection};
use anyhow::Result;

#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// At most `count` latest headlines from one quote-page section.
    async fn fetch_section(
        &self,
        ticker: &str,
        section: NewsSection,
        count: usize,
    ) -> Result<Vec<NewsItem>>;
}

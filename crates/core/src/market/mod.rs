pub mod types;
pub mod yahoo;

use crate::domain::snapshot::{ChainSide, OptionChainSnapshot};
use anyhow::Result;

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Option chain for one expiration. An unknown or missing `expiration`
    /// falls back to the nearest listed one.
    async fn option_chain(
        &self,
        ticker: &str,
        expiration: Option<&str>,
        side: ChainSide,
        limit: usize,
    ) -> Result<OptionChainSnapshot>;

    /// Listed expirations as `YYYY-MM-DD`, nearest first.
    async fn expirations(&self, ticker: &str) -> Result<Vec<String>>;
}

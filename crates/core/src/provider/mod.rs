pub mod types;
pub mod yahoo;

use crate::domain::quote::MarketSnapshot;
use crate::time::HistoryWindow;
use anyhow::Result;

pub use yahoo::YahooProvider;

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// One lookup: metadata, daily history over `window`, and up to `news_limit` headlines.
    async fn fetch_snapshot(
        &self,
        symbol: &str,
        window: HistoryWindow,
        news_limit: usize,
    ) -> Result<MarketSnapshot>;
}

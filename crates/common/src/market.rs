use async_trait::async_trait;

use crate::{PricePoint, Quote, Result, Window};

/// Abstraction over the live/historical price source.
///
/// `TwseClient` in `crates/market` implements this against the Taiwan Stock
/// Exchange endpoints. Tests swap in in-memory fakes.
///
/// Implementations should fail fast on transport problems rather than hang —
/// a sweep calls `current_quote` once per pending alert.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Latest traded price and display name for a stock id.
    ///
    /// Returns `Error::UnknownSymbol` when the id is not listed; any other
    /// error is a transient gateway failure.
    async fn current_quote(&self, stock_id: &str) -> Result<Quote>;

    /// The last `window.days()` daily closes, ascending by date.
    async fn daily_closes(&self, stock_id: &str, window: Window) -> Result<Vec<PricePoint>>;
}

use async_trait::async_trait;

use crate::{ChartHandle, PricePoint, Result, TrendSummary};

/// Abstraction over the chart-rendering pipeline.
///
/// `TrendChartRenderer` in `crates/trend` draws a PNG and returns the URL it
/// will be served under.
#[async_trait]
pub trait TrendRenderer: Send + Sync {
    /// Render the close series with its extrema annotated.
    /// `series` is ascending by date and non-empty.
    async fn render_trend(
        &self,
        stock_id: &str,
        series: &[PricePoint],
        summary: &TrendSummary,
    ) -> Result<ChartHandle>;
}

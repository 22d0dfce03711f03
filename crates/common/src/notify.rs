use async_trait::async_trait;

use crate::{ChartHandle, Result};

/// Abstraction over the messaging platform's push channel.
///
/// Delivery is fire-and-forget from the caller's perspective: callers log a
/// returned error and move on, they never retry or block on it.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Push a plain text message to a subscriber.
    async fn send_text(&self, subscriber_id: &str, text: &str) -> Result<()>;

    /// Push a text message followed by a chart image.
    async fn send_text_with_chart(
        &self,
        subscriber_id: &str,
        text: &str,
        chart: &ChartHandle,
    ) -> Result<()>;
}

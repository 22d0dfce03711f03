//! Orchestrates parser, market data, summarizer, renderer and notifier into
//! outbound messages.
//!
//! The inbound reply channel carries exactly one immediate payload (the
//! messaging platform's reply token is single-use); query results follow as
//! independent pushes, one per stock id, so one bad id never blocks the rest.

use std::sync::Arc;

use tracing::{info, warn};

use alerts::AlertRegistry;
use common::{
    ChartHandle, Error, Intent, MarketData, Notifier, ReplyPayload, Result, TrendRenderer, Window,
};

/// Immediate acknowledgment sent before per-id results are pushed.
pub const ACK_TEXT: &str = "正在查詢股票資料，請稍後...";

/// Corrective hint for a malformed alert command.
pub const ALERT_FORMAT_HINT: &str = "❌設定格式錯誤，請輸入範例:設定 2330 > 800";

/// Welcome/help message: pushed on follow, and the reply for unrecognized
/// input.
pub const HELP_TEXT: &str = "👋 歡迎加入台灣股市小幫手！\n\n\
    以下是你可以使用的功能指令：\n\
    📌 即時股價：輸入股票代碼，如 `2330`\n\
    📈 趨勢圖：輸入 `2330 30天` 或 `查 2330 2317`(請文字與數字用空白隔開)\n\
    🔔 價格警示：輸入 `設定 2330 > 800`(請文字與數字、符號用空白隔開)\n\
    🧾 每 5 分鐘會自動檢查是否達成價格條件\n\
    💡 圖表會自動標註最高價/最低價\n\n\
    若要查詢多支股票請用空白分隔，如：`查 2330 2881 2317`\n\
    🚀 祝你投資順利！";

#[derive(Clone)]
pub struct ReplyBuilder {
    market: Arc<dyn MarketData>,
    renderer: Arc<dyn TrendRenderer>,
    notifier: Arc<dyn Notifier>,
    registry: AlertRegistry,
}

impl ReplyBuilder {
    pub fn new(
        market: Arc<dyn MarketData>,
        renderer: Arc<dyn TrendRenderer>,
        notifier: Arc<dyn Notifier>,
        registry: AlertRegistry,
    ) -> Self {
        Self {
            market,
            renderer,
            notifier,
            registry,
        }
    }

    /// Handle one inbound utterance and return the immediate reply payload.
    /// Query results are pushed from a spawned task after the reply.
    pub async fn handle_message(&self, subscriber_id: &str, text: &str) -> ReplyPayload {
        match command::parse(text) {
            Err(e) => {
                info!(subscriber_id, error = %e, "Malformed alert command");
                ReplyPayload::Text(ALERT_FORMAT_HINT.to_string())
            }
            Ok(Intent::Unrecognized { .. }) => ReplyPayload::Text(HELP_TEXT.to_string()),
            Ok(Intent::SetAlert(alert)) => {
                let confirmation = format!(
                    "✅已設定:當{} {} {} 時通知你",
                    alert.stock_id, alert.op, alert.target
                );
                self.registry.add(subscriber_id, alert).await;
                ReplyPayload::Text(confirmation)
            }
            Ok(Intent::SingleQuery { stock_id, window }) => {
                self.spawn_pushes(subscriber_id, vec![stock_id], window);
                ReplyPayload::Text(ACK_TEXT.to_string())
            }
            Ok(Intent::MultiQuery { stock_ids }) => {
                // Multi-query is fixed at the 5-day window.
                self.spawn_pushes(subscriber_id, stock_ids, Window::FiveDay);
                ReplyPayload::Text(ACK_TEXT.to_string())
            }
        }
    }

    fn spawn_pushes(&self, subscriber_id: &str, stock_ids: Vec<String>, window: Window) {
        let this = self.clone();
        let subscriber_id = subscriber_id.to_string();
        tokio::spawn(async move {
            this.push_quote_results(&subscriber_id, &stock_ids, window)
                .await;
        });
    }

    /// Build and push one result message per stock id. Each push is
    /// independent: a lookup or delivery failure for one id is logged and
    /// the remaining ids still go out.
    pub async fn push_quote_results(
        &self,
        subscriber_id: &str,
        stock_ids: &[String],
        window: Window,
    ) {
        for stock_id in stock_ids {
            let payload = self.build_quote_reply(stock_id, window).await;
            let sent = match &payload {
                ReplyPayload::Text(text) => self.notifier.send_text(subscriber_id, text).await,
                ReplyPayload::TextWithChart { text, chart } => {
                    self.notifier
                        .send_text_with_chart(subscriber_id, text, chart)
                        .await
                }
            };
            if let Err(e) = sent {
                warn!(subscriber_id, stock_id = %stock_id, error = %e, "Quote push failed");
            }
        }
    }

    /// Price text plus trend chart for one stock id.
    ///
    /// Lookup failure yields the plain not-found text; a chart pipeline
    /// failure on a successfully quoted stock degrades to text only.
    pub async fn build_quote_reply(&self, stock_id: &str, window: Window) -> ReplyPayload {
        let quote = match self.market.current_quote(stock_id).await {
            Ok(quote) => quote,
            Err(Error::UnknownSymbol(_)) => {
                return ReplyPayload::Text(format!("查無此股票代碼:{stock_id}"));
            }
            Err(e) => {
                warn!(stock_id, error = %e, "Quote fetch failed");
                return ReplyPayload::Text(format!("查無此股票代碼:{stock_id}"));
            }
        };

        let text = format!("{}({}) 目前股價:{}元", quote.name, stock_id, quote.price);

        match self.trend_chart(stock_id, window).await {
            Ok(chart) => ReplyPayload::TextWithChart { text, chart },
            Err(e) => {
                warn!(stock_id, error = %e, "Trend chart failed — sending text only");
                ReplyPayload::Text(text)
            }
        }
    }

    async fn trend_chart(&self, stock_id: &str, window: Window) -> Result<ChartHandle> {
        let series = self.market.daily_closes(stock_id, window).await?;
        let summary = trend::summarize(&series)
            .ok_or_else(|| Error::Market("empty close series".to_string()))?;
        self.renderer.render_trend(stock_id, &series, &summary).await
    }
}

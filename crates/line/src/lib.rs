//! Thin client for the LINE Messaging API.
//!
//! `reply` answers one inbound event via its reply token (usable once);
//! everything else goes out through the push channel, which is what the
//! [`Notifier`] implementation uses.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use common::{ChartHandle, Error, Notifier, ReplyPayload, Result};

const BASE_URL: &str = "https://api.line.me";

pub struct LineClient {
    channel_access_token: String,
    http: Client,
}

impl LineClient {
    pub fn new(channel_access_token: impl Into<String>) -> Self {
        Self {
            channel_access_token: channel_access_token.into(),
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<()> {
        let resp = self
            .http
            .post(format!("{BASE_URL}{path}"))
            .bearer_auth(&self.channel_access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Notify(format!("HTTP {status}: {text}")));
        }
        Ok(())
    }

    /// Answer an inbound event. The reply token is single-use; callers fall
    /// back to push for anything further.
    pub async fn reply(&self, reply_token: &str, payloads: &[ReplyPayload]) -> Result<()> {
        debug!(reply_token, count = payloads.len(), "Sending reply");
        self.post_json(
            "/v2/bot/message/reply",
            json!({
                "replyToken": reply_token,
                "messages": messages_json(payloads),
            }),
        )
        .await
    }

    async fn push(&self, subscriber_id: &str, payloads: &[ReplyPayload]) -> Result<()> {
        debug!(subscriber_id, count = payloads.len(), "Sending push");
        self.post_json(
            "/v2/bot/message/push",
            json!({
                "to": subscriber_id,
                "messages": messages_json(payloads),
            }),
        )
        .await
    }
}

#[async_trait]
impl Notifier for LineClient {
    async fn send_text(&self, subscriber_id: &str, text: &str) -> Result<()> {
        self.push(subscriber_id, &[ReplyPayload::Text(text.to_string())])
            .await
    }

    async fn send_text_with_chart(
        &self,
        subscriber_id: &str,
        text: &str,
        chart: &ChartHandle,
    ) -> Result<()> {
        self.push(
            subscriber_id,
            &[ReplyPayload::TextWithChart {
                text: text.to_string(),
                chart: chart.clone(),
            }],
        )
        .await
    }
}

/// A text payload is one LINE message; text-with-chart is two (text, image).
fn messages_json(payloads: &[ReplyPayload]) -> Vec<Value> {
    let mut messages = Vec::new();
    for payload in payloads {
        match payload {
            ReplyPayload::Text(text) => {
                messages.push(json!({ "type": "text", "text": text }));
            }
            ReplyPayload::TextWithChart { text, chart } => {
                messages.push(json!({ "type": "text", "text": text }));
                messages.push(json!({
                    "type": "image",
                    "originalContentUrl": chart.url,
                    "previewImageUrl": chart.url,
                }));
            }
        }
    }
    messages
}

//! Serde models for the LINE webhook payload — only the event shapes this
//! bot reacts to; everything else deserializes to the catch-all variants.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "message")]
    Message {
        #[serde(rename = "replyToken")]
        reply_token: String,
        source: Source,
        message: MessageContent,
    },
    #[serde(rename = "follow")]
    Follow { source: Source },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct Source {
    /// "user", "group" or "room". Only private chats carry a usable
    /// subscriber id for pushes.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum MessageContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use common::{Notifier, ReplyPayload};

use crate::events::{Event, MessageContent, WebhookPayload};
use crate::{signature, AppState};

/// Replies sent into group/room chats, where no pushable subscriber exists.
const PRIVATE_CHAT_ONLY_NOTICE: &str = "⚠️ 抱歉，目前僅支援私訊（1對1聊天）查詢股票。";

/// `POST /callback` — the LINE webhook endpoint.
///
/// The signature is checked against the raw body before anything is parsed;
/// a mismatch is answered with 400 and the body is discarded.
pub(crate) async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(sig) = headers
        .get("X-Line-Signature")
        .and_then(|v| v.to_str().ok())
    else {
        warn!("Callback without signature header");
        return StatusCode::BAD_REQUEST;
    };

    if !signature::verify(&state.channel_secret, &body, sig) {
        warn!("Callback signature mismatch");
        return StatusCode::BAD_REQUEST;
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Unparseable webhook body");
            return StatusCode::BAD_REQUEST;
        }
    };

    for event in payload.events {
        handle_event(&state, event).await;
    }
    StatusCode::OK
}

async fn handle_event(state: &AppState, event: Event) {
    match event {
        Event::Message {
            reply_token,
            source,
            message: MessageContent::Text { text },
        } => {
            let user_id = match source.user_id {
                Some(id) if source.kind == "user" => id,
                _ => {
                    let notice = ReplyPayload::Text(PRIVATE_CHAT_ONLY_NOTICE.to_string());
                    if let Err(e) = state.line.reply(&reply_token, &[notice]).await {
                        warn!(error = %e, "Group-chat notice reply failed");
                    }
                    return;
                }
            };

            let payload = state.replies.handle_message(&user_id, text.trim()).await;
            if let Err(e) = state.line.reply(&reply_token, &[payload]).await {
                warn!(user_id = %user_id, error = %e, "Reply failed");
            }
        }
        Event::Follow { source } => {
            let Some(user_id) = source.user_id else { return };
            info!(user_id = %user_id, "New follower — sending welcome");
            if let Err(e) = state.line.send_text(&user_id, reply::HELP_TEXT).await {
                warn!(user_id = %user_id, error = %e, "Welcome push failed");
            }
        }
        Event::Message { .. } | Event::Other => {}
    }
}

/// `GET /check_alerts` — run one evaluation sweep on demand. The periodic
/// task calls the same entry point; extra invocations are harmless.
pub(crate) async fn check_alerts(State(state): State<AppState>) -> &'static str {
    state.evaluator.sweep().await;
    "✅ 價格警示已檢查"
}

/// Health check endpoint — used by deploy checks and keep-alive pings.
pub(crate) async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub mod events;
mod routes;
pub mod signature;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tracing::info;

use alerts::AlertEvaluator;
use line_api::LineClient;
use reply::ReplyBuilder;

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub channel_secret: String,
    pub line: Arc<LineClient>,
    pub replies: ReplyBuilder,
    pub evaluator: Arc<AlertEvaluator>,
}

/// Build and run the webhook server. Chart PNGs are served straight from
/// `chart_dir` under `/charts`.
pub async fn serve(state: AppState, chart_dir: PathBuf, port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let app = Router::new()
        .route("/callback", post(routes::callback))
        .route("/check_alerts", get(routes::check_alerts))
        .route("/healthz", get(routes::healthz))
        .nest_service("/charts", ServeDir::new(chart_dir))
        .with_state(state);

    info!(%addr, "Webhook server listening");
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

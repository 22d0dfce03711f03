use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::info;
use tracing_subscriber::EnvFilter;

use alerts::{AlertEvaluator, AlertRegistry};
use common::{Config, MarketData, Notifier, TrendRenderer};
use line_api::LineClient;
use market::TwseClient;
use reply::ReplyBuilder;
use trend::TrendChartRenderer;
use webhook::AppState;

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(port = cfg.port, sweep_interval_secs = cfg.sweep_interval_secs, "StockBot starting");

    let chart_dir = PathBuf::from(&cfg.chart_dir);
    std::fs::create_dir_all(&chart_dir)
        .unwrap_or_else(|e| panic!("Failed to create chart dir '{}': {e}", chart_dir.display()));

    // ── Collaborators ─────────────────────────────────────────────────────────
    let market: Arc<dyn MarketData> = Arc::new(TwseClient::new());
    let renderer: Arc<dyn TrendRenderer> =
        Arc::new(TrendChartRenderer::new(chart_dir.clone(), cfg.public_base_url.clone()));
    let line = Arc::new(LineClient::new(cfg.channel_access_token.clone()));
    let notifier: Arc<dyn Notifier> = line.clone();

    // ── Core state ────────────────────────────────────────────────────────────
    let registry = AlertRegistry::in_memory();
    let evaluator = Arc::new(AlertEvaluator::new(
        registry.clone(),
        market.clone(),
        notifier.clone(),
    ));
    let replies = ReplyBuilder::new(market, renderer, notifier, registry);

    // ── Webhook server ────────────────────────────────────────────────────────
    let state = AppState {
        channel_secret: cfg.channel_secret.clone(),
        line,
        replies,
        evaluator: evaluator.clone(),
    };
    tokio::spawn(webhook::serve(state, chart_dir, cfg.port));

    // ── Periodic alert sweep ──────────────────────────────────────────────────
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(cfg.sweep_interval_secs));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            evaluator.sweep().await;
        }
    });

    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await.unwrap();
    info!("Shutdown signal received. Exiting.");
}

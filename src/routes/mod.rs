// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::aggregator::Aggregator;
use crate::config::AppConfig;
use crate::models::PolledSnapshot;
use crate::probe::ProcessControl;
use crate::version;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) stats_tx: broadcast::Sender<PolledSnapshot>,
    pub(crate) aggregator: Aggregator,
    pub(crate) process_control: Arc<dyn ProcessControl>,
    pub(crate) ws_system_connections: Arc<AtomicUsize>,
    pub(crate) config: AppConfig,
}

pub fn app(
    stats_tx: broadcast::Sender<PolledSnapshot>,
    aggregator: Aggregator,
    process_control: Arc<dyn ProcessControl>,
    ws_system_connections: Arc<AtomicUsize>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        stats_tx,
        aggregator,
        process_control,
        ws_system_connections,
        config,
    };
    Router::new()
        .route("/", get(|| async { version::banner() })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/info", get(http::api_info_handler)) // GET /api/info
        .route("/api/snapshot", get(http::snapshot_handler)) // GET /api/snapshot
        .route("/api/processes/{pid}", get(http::process_handler)) // GET /api/processes/{pid}
        .route(
            "/api/processes/{pid}/terminate",
            post(http::terminate_handler),
        ) // POST /api/processes/{pid}/terminate
        .route("/ws/cpu", get(ws::ws_cpu)) // WS /ws/cpu
        .route("/ws/system", get(ws::ws_system)) // WS /ws/system
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

//! Route definitions.

use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::intercept;
use crate::state::AppState;
use crate::ws;

/// WebSocket the foreground attaches to for health transitions.
pub const MONITOR_PATH: &str = "/__offgrid/monitor";

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(MONITOR_PATH, get(ws::monitor_ws))
        .fallback(intercept::intercept)
        .layer(middleware::from_fn(crate::middleware::request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

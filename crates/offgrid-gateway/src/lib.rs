//! HTTP/WebSocket host for offgrid.
//!
//! Every request that is not the bridge socket is handed to the configured
//! [`Interceptor`](offgrid_core::ports::Interceptor).

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod ws;

pub use routes::{MONITOR_PATH, create_router};
pub use state::AppState;

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Serve the gateway on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Gateway listening");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

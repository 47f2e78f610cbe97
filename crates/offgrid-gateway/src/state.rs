//! Application state shared across handlers.

use offgrid_core::ports::Interceptor;
use offgrid_monitor::BridgeEndpoint;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// Largest request body forwarded to the origin.
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub interceptor: Arc<dyn Interceptor>,
    /// Base the request path is resolved against.
    pub origin_url: Url,
    /// Foreground end of the health monitor channel, one session at a time.
    pub bridge: Option<Arc<Mutex<BridgeEndpoint>>>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(interceptor: Arc<dyn Interceptor>, origin_url: Url) -> Self {
        Self {
            interceptor,
            origin_url,
            bridge: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_bridge(mut self, bridge: BridgeEndpoint) -> Self {
        self.bridge = Some(Arc::new(Mutex::new(bridge)));
        self
    }
}

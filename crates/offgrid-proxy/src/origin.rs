//! HTTP origin adapter.

use async_trait::async_trait;
use http::HeaderMap;
use http::header::{CONNECTION, CONTENT_LENGTH, HOST, TE, TRAILER, TRANSFER_ENCODING, UPGRADE};
use offgrid_core::ports::Origin;
use offgrid_core::{AssetRequest, AssetResponse, Error, Result};
use std::time::Duration;
use tracing::debug;

/// Origin reached over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    client: reqwest::Client,
}

impl HttpOrigin {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Build an origin whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpOrigin {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();
    for name in [CONNECTION, TE, TRAILER, TRANSFER_ENCODING, UPGRADE, HOST, CONTENT_LENGTH] {
        headers.remove(name);
    }
    headers.remove("keep-alive");
    headers.remove("proxy-connection");
    headers
}

#[async_trait]
impl Origin for HttpOrigin {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse> {
        debug!(method = %request.method, url = %request.url, "Fetching from origin");

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(strip_hop_by_hop(&request.headers))
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        let headers = strip_hop_by_hop(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(AssetResponse::new(status, headers, body))
    }
}

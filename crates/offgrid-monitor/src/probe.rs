//! HTTP liveness probe.

use async_trait::async_trait;
use offgrid_core::ports::LivenessProbe;
use offgrid_core::{Error, ProbeOutcome, Result};
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Probes `GET <origin>/health`. Any 2xx is healthy.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    url: Url,
}

impl HttpProbe {
    pub fn new(url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    /// Probe `health_path` on the given origin.
    pub fn for_origin(origin: &Url, health_path: &str) -> Result<Self> {
        let url = origin
            .join(health_path)
            .map_err(|e| Error::Config(format!("Invalid health path {}: {}", health_path, e)))?;
        Ok(Self::new(url))
    }

    /// Rebuild the client so a probe gives up after `timeout`.
    pub fn with_timeout(self, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, self.url))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl LivenessProbe for HttpProbe {
    async fn probe(&self) -> ProbeOutcome {
        let result = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => ProbeOutcome::Healthy,
            Ok(response) => {
                debug!(url = %self.url, status = %response.status(), "Liveness probe failed");
                ProbeOutcome::Unhealthy {
                    reason: format!("origin returned {}", response.status()),
                }
            }
            Err(e) => {
                debug!(url = %self.url, error = %e, "Liveness probe failed");
                ProbeOutcome::Unhealthy {
                    reason: e.to_string(),
                }
            }
        }
    }
}

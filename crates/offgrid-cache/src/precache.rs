//! Install-time precache.
//!
//! On install, every asset in the manifest is fetched concurrently and the
//! whole set is written to the current generation in one `put_all`. A single
//! failed fetch abandons the batch. The failure is logged and the install
//! still completes; missing assets are filled lazily by the proxy.

use futures::future::try_join_all;
use offgrid_core::ports::{CacheStore, Origin};
use offgrid_core::{AssetRequest, CacheGeneration, CacheKey, Error, Result, StoredResponse};
use std::sync::Arc;
use tracing::{error, info};
use url::Url;

/// Assets seeded at install time.
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/favicon.ico",
    "/health-worker.js",
    "/index.html",
    "/manifest.json",
    "/style.css",
    "/wasm.js",
    "/audio/enemy_destroyed.wav",
    "/audio/enemy_hit.wav",
    "/audio/spaceship_acceleration.wav",
    "/audio/spaceship_boost.wav",
    "/audio/spaceship_cannon_fire.wav",
    "/audio/spaceship_crash.wav",
    "/audio/spaceship_deceleration.wav",
    "/audio/spaceship_freeze.wav",
    "/audio/spaceship_whoosh.wav",
    "/audio/theme_heroic.wav",
    "/icons/icon-192x192.png",
    "/icons/icon-512-512.png",
    "/external/ajax/libs/font-awesome/6.0.0/css/all.min.css",
];

/// Fixed list of asset paths, resolved against the origin at install time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecacheManifest {
    entries: Vec<String>,
}

impl PrecacheManifest {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, base: &Url) -> Result<Vec<Url>> {
        self.entries
            .iter()
            .map(|entry| {
                base.join(entry).map_err(|e| Error::Precache {
                    url: entry.clone(),
                    reason: format!("invalid manifest entry: {}", e),
                })
            })
            .collect()
    }
}

impl Default for PrecacheManifest {
    fn default() -> Self {
        Self::new(DEFAULT_MANIFEST.iter().copied())
    }
}

/// What an install left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Every manifest asset is now cached.
    Complete { assets: usize },
    /// Nothing was cached; assets will be fetched on first use.
    Degraded { reason: String },
}

impl InstallOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, InstallOutcome::Complete { .. })
    }
}

/// Seeds the cache for one generation from a manifest.
pub struct Precacher {
    origin: Arc<dyn Origin>,
    store: Arc<dyn CacheStore>,
    generation: CacheGeneration,
    manifest: PrecacheManifest,
    base_url: Url,
}

impl Precacher {
    pub fn new(
        origin: Arc<dyn Origin>,
        store: Arc<dyn CacheStore>,
        generation: CacheGeneration,
        manifest: PrecacheManifest,
        base_url: Url,
    ) -> Self {
        Self {
            origin,
            store,
            generation,
            manifest,
            base_url,
        }
    }

    /// Run the install step. Never fails; a failed batch degrades to lazy caching.
    pub async fn install(&self) -> InstallOutcome {
        match self.populate().await {
            Ok(assets) => {
                info!(
                    generation = %self.generation,
                    assets,
                    "Precache complete"
                );
                InstallOutcome::Complete { assets }
            }
            Err(e) => {
                error!(
                    generation = %self.generation,
                    error = %e,
                    "Failed to pre-cache assets"
                );
                InstallOutcome::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn populate(&self) -> Result<usize> {
        let urls = self.manifest.resolve(&self.base_url)?;
        let entries = try_join_all(urls.into_iter().map(|url| self.fetch_asset(url))).await?;
        self.store.put_all(&self.generation, &entries).await?;
        Ok(entries.len())
    }

    async fn fetch_asset(&self, url: Url) -> Result<(CacheKey, StoredResponse)> {
        let request = AssetRequest::get(url);
        let response = self
            .origin
            .fetch(&request)
            .await
            .map_err(|e| Error::Precache {
                url: request.url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.is_storable() {
            return Err(Error::Precache {
                url: request.url.to_string(),
                reason: format!("origin returned {}", response.status),
            });
        }

        Ok((request.cache_key(), StoredResponse::from_response(&response)))
    }
}

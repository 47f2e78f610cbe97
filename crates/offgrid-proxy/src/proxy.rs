//! The asset cache proxy.

use crate::classify::{Classification, Classifier, DEFAULT_DENYLIST, PassthroughReason};
use crate::revalidation::Revalidation;
use async_trait::async_trait;
use http::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use offgrid_core::ports::{CacheStore, Interceptor, Origin};
use offgrid_core::{
    AssetRequest, AssetResponse, CacheGeneration, CacheKey, Error, ResponseSource, StoredResponse,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Proxy configuration.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Generation every read and write goes to.
    pub generation: CacheGeneration,
    /// Path fragments that bypass the cache.
    pub denylist: Vec<String>,
    /// Write fresh responses on a spawned task instead of before returning.
    /// Turn off to have the write land before the response is handed back.
    pub detach_writes: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            generation: CacheGeneration::default(),
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
            detach_writes: true,
        }
    }
}

/// Serves intercepted requests from cache, revalidating against the origin.
pub struct AssetCacheProxy {
    generation: CacheGeneration,
    classifier: Classifier,
    detach_writes: bool,
    store: Arc<dyn CacheStore>,
    origin: Arc<dyn Origin>,
}

impl AssetCacheProxy {
    pub fn new(config: ProxyConfig, store: Arc<dyn CacheStore>, origin: Arc<dyn Origin>) -> Self {
        Self {
            classifier: Classifier::new(config.denylist),
            generation: config.generation,
            detach_writes: config.detach_writes,
            store,
            origin,
        }
    }

    pub fn generation(&self) -> &CacheGeneration {
        &self.generation
    }

    /// Produce a response for a request. Never fails.
    pub async fn handle(&self, request: AssetRequest) -> AssetResponse {
        let outcome = match self.classifier.classify(&request) {
            Classification::Passthrough(reason) => self.passthrough(request, reason).await,
            Classification::Cacheable => self.serve_cacheable(request).await,
        };
        outcome.into_response()
    }

    async fn passthrough(&self, request: AssetRequest, reason: PassthroughReason) -> Revalidation {
        debug!(
            method = %request.method,
            url = %request.url,
            reason = reason.as_str(),
            "Passing request through"
        );

        match self.origin.fetch(&request).await {
            Ok(response) => Revalidation::Fresh(response.with_source(ResponseSource::Passthrough)),
            Err(e) => {
                error!(url = %request.url, error = %e, "Fetch request failed");
                Revalidation::Unavailable(e)
            }
        }
    }

    async fn serve_cacheable(&self, mut request: AssetRequest) -> Revalidation {
        // Only the proxy decides what is conditional, so a 304 always has an entry behind it.
        request.headers.remove(IF_NONE_MATCH);
        request.headers.remove(IF_MODIFIED_SINCE);

        let key = request.cache_key();
        let cached = match self.store.get(&self.generation, &key).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        };

        match cached {
            Some(cached) => self.revalidate(request, key, cached).await,
            None => self.fetch_and_store(request, key).await,
        }
    }

    async fn revalidate(
        &self,
        mut request: AssetRequest,
        key: CacheKey,
        cached: StoredResponse,
    ) -> Revalidation {
        if let Some(etag) = cached.headers.get(ETAG) {
            request.headers.insert(IF_NONE_MATCH, etag.clone());
        }

        match self.origin.fetch(&request).await {
            Ok(response) if response.is_not_modified() => {
                debug!(key = %key, "Cached entry still current");
                Revalidation::NotModified(cached)
            }
            Ok(response) if response.is_storable() => {
                debug!(key = %key, etag = ?response.etag(), "Cached entry replaced");
                self.store_response(key, &response).await;
                Revalidation::Fresh(response.with_source(ResponseSource::Network))
            }
            Ok(response) if response.is_success() => {
                debug!(
                    key = %key,
                    status = %response.status,
                    "Keeping cached entry for partial response"
                );
                Revalidation::Fresh(response.with_source(ResponseSource::Network))
            }
            Ok(response) => {
                warn!(
                    key = %key,
                    status = %response.status,
                    "Origin failed during revalidation, returning cached response"
                );
                Revalidation::Hit {
                    cached,
                    cause: Error::Origin {
                        status: response.status.as_u16(),
                    },
                }
            }
            Err(e) => {
                warn!(
                    key = %key,
                    error = %e,
                    "Network request failed, returning cached response"
                );
                Revalidation::Hit { cached, cause: e }
            }
        }
    }

    async fn fetch_and_store(&self, request: AssetRequest, key: CacheKey) -> Revalidation {
        match self.origin.fetch(&request).await {
            Ok(response) => {
                if response.is_storable() {
                    self.store_response(key, &response).await;
                } else {
                    debug!(
                        key = %key,
                        status = %response.status,
                        "Not caching incomplete response"
                    );
                }
                Revalidation::Fresh(response.with_source(ResponseSource::Network))
            }
            Err(e) => {
                error!(key = %key, error = %e, "Fetch failed and no cache available");
                Revalidation::Unavailable(e)
            }
        }
    }

    /// Write failures are logged; they never change the response.
    async fn store_response(&self, key: CacheKey, response: &AssetResponse) {
        let stored = StoredResponse::from_response(response);

        if self.detach_writes {
            let store = Arc::clone(&self.store);
            let generation = self.generation.clone();
            tokio::spawn(async move {
                if let Err(e) = store.put(&generation, &key, &stored).await {
                    warn!(key = %key, error = %e, "Failed to update cache");
                }
            });
        } else if let Err(e) = self.store.put(&self.generation, &key, &stored).await {
            warn!(key = %key, error = %e, "Failed to update cache");
        }
    }
}

#[async_trait]
impl Interceptor for AssetCacheProxy {
    async fn on_intercept(&self, request: AssetRequest) -> AssetResponse {
        self.handle(request).await
    }
}

//! Port traits.
//!
//! These traits define the seams between the core algorithms and the
//! environment hosting them: storage, the origin, liveness, and the event
//! hooks a host loop drives.

use crate::asset::{AssetRequest, AssetResponse, StoredResponse};
use crate::cache::{CacheGeneration, CacheKey};
use crate::protocol::{MonitorMessage, ProbeOutcome};
use crate::Result;
use async_trait::async_trait;

/// Persistent keyed response store, partitioned by generation.
///
/// Implementations serialize concurrent puts to the same key and give
/// read-your-writes per key.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up an entry in the given generation.
    async fn get(
        &self,
        generation: &CacheGeneration,
        key: &CacheKey,
    ) -> Result<Option<StoredResponse>>;

    /// Insert or overwrite an entry.
    async fn put(
        &self,
        generation: &CacheGeneration,
        key: &CacheKey,
        response: &StoredResponse,
    ) -> Result<()>;

    /// Store every entry or none of them.
    async fn put_all(
        &self,
        generation: &CacheGeneration,
        entries: &[(CacheKey, StoredResponse)],
    ) -> Result<()>;
}

/// The upstream server.
///
/// `Err` means the origin could not be reached; any status the origin
/// actually sent, including 304 and 5xx, comes back as `Ok`.
#[async_trait]
pub trait Origin: Send + Sync {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse>;
}

/// One liveness check against the origin.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self) -> ProbeOutcome;
}

/// Hook invoked for every request the host intercepts. Never fails.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn on_intercept(&self, request: AssetRequest) -> AssetResponse;
}

/// Hook invoked for every message arriving over the bridge channel.
pub trait MessageHandler {
    fn on_message(&mut self, message: MonitorMessage);
}

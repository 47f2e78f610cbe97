//! offgrid core
//!
//! Shared vocabulary for the offline delivery layer: request and response
//! types, cache identities, the monitor/bridge message protocol, and the
//! port traits that adapters implement.

pub mod asset;
pub mod cache;
pub mod error;
pub mod ports;
pub mod protocol;

pub use asset::{AssetRequest, AssetResponse, ResponseSource, StoredResponse};
pub use cache::{CacheGeneration, CacheKey};
pub use error::{Error, Result};
pub use protocol::{HealthState, LinkState, MonitorMessage, ProbeOutcome};

//! Asset cache proxy for offgrid.
//!
//! Every intercepted request is classified, then either forwarded untouched
//! or served through the cache with `If-None-Match` revalidation. When the
//! origin is unreachable a cached entry is served as-is, and a request with
//! nothing cached gets a synthesized 503.

pub mod classify;
pub mod origin;
pub mod proxy;
pub mod revalidation;

pub use classify::{Classification, Classifier, DEFAULT_DENYLIST, PassthroughReason};
pub use origin::HttpOrigin;
pub use proxy::{AssetCacheProxy, ProxyConfig};
pub use revalidation::Revalidation;

//! Tagged outcome of serving one request.

use offgrid_core::{AssetResponse, Error, ResponseSource, StoredResponse};

/// What the proxy decided for a request. Turned into a response by
/// [`Revalidation::into_response`] and nowhere else.
#[derive(Debug)]
pub enum Revalidation {
    /// Cached entry served without confirmation because the origin failed.
    Hit { cached: StoredResponse, cause: Error },
    /// Response taken from the origin. Its entity tag, if any, is in the headers.
    Fresh(AssetResponse),
    /// Origin confirmed the cached entry with a 304.
    NotModified(StoredResponse),
    /// Neither cache nor origin could answer.
    Unavailable(Error),
}

impl Revalidation {
    pub fn into_response(self) -> AssetResponse {
        match self {
            Revalidation::Hit { cached, .. } => cached.to_response(ResponseSource::Stale),
            Revalidation::Fresh(response) => response,
            Revalidation::NotModified(cached) => cached.to_response(ResponseSource::Revalidated),
            Revalidation::Unavailable(error) => AssetResponse::service_unavailable(&error),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Revalidation::Hit { .. } => "hit",
            Revalidation::Fresh(_) => "fresh",
            Revalidation::NotModified(_) => "not_modified",
            Revalidation::Unavailable(_) => "unavailable",
        }
    }
}

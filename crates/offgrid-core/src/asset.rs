//! Request and response types exchanged between the host, the proxy, and the origin.

use crate::cache::CacheKey;
use crate::error::Error;
use ::http::header::{CONTENT_TYPE, ETAG, HeaderName};
use ::http::{HeaderMap, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

/// A request raised by the host environment.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl AssetRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Identity of this request in the cache store.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.method, &self.url)
    }
}

/// Where a response handed back to the host came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Body came from the origin (cache miss, or a refreshed entry).
    Network,
    /// Cached entry confirmed unchanged by a 304.
    Revalidated,
    /// Cached entry served because the origin could not be used.
    Stale,
    /// Uncacheable request answered by the origin.
    Passthrough,
    /// Built locally because neither cache nor network could answer.
    Synthesized,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Revalidated => "revalidated",
            ResponseSource::Stale => "stale",
            ResponseSource::Passthrough => "passthrough",
            ResponseSource::Synthesized => "synthesized",
        }
    }
}

/// A response returned to the host. Always well-formed, even when offline.
#[derive(Debug, Clone)]
pub struct AssetResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub source: ResponseSource,
}

#[derive(Serialize)]
struct FailureBody<'a> {
    kind: &'a str,
    error: String,
}

impl AssetResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            source: ResponseSource::Network,
        }
    }

    pub fn with_source(mut self, source: ResponseSource) -> Self {
        self.source = source;
        self
    }

    /// 503 carrying `{"kind": ..., "error": ...}` for the given failure.
    pub fn service_unavailable(error: &Error) -> Self {
        let body = FailureBody {
            kind: error.kind(),
            error: error.to_string(),
        };
        // Serializing two plain strings cannot fail.
        let body = serde_json::to_vec(&body).unwrap_or_default();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            headers,
            body: Bytes::from(body),
            source: ResponseSource::Synthesized,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// A complete 2xx body. Partial content answers a range, not the resource.
    pub fn is_storable(&self) -> bool {
        self.is_success() && self.status != StatusCode::PARTIAL_CONTENT
    }

    pub fn is_not_modified(&self) -> bool {
        self.status == StatusCode::NOT_MODIFIED
    }

    pub fn etag(&self) -> Option<&str> {
        self.headers.get(ETAG).and_then(|v| v.to_str().ok())
    }
}

/// The value half of a cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub stored_at: DateTime<Utc>,
}

impl StoredResponse {
    pub fn from_response(response: &AssetResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            stored_at: Utc::now(),
        }
    }

    pub fn to_response(&self, source: ResponseSource) -> AssetResponse {
        AssetResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
            source,
        }
    }

    /// Entity tag recorded with the entry, if the origin sent one.
    pub fn etag(&self) -> Option<&str> {
        self.headers.get(ETAG).and_then(|v| v.to_str().ok())
    }
}

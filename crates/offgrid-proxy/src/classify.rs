//! Request classification.

use http::Method;
use offgrid_core::AssetRequest;
use url::Position;

/// Path fragments that are never served from cache: the credential/config
/// endpoint, score persistence, and the liveness endpoint.
pub const DEFAULT_DENYLIST: &[&str] = &["/.env", "/scores", "/health"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Cacheable,
    Passthrough(PassthroughReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughReason {
    /// Anything but GET; mutating calls are never answered from cache.
    Method,
    /// Path matched the denylist.
    Denylisted,
}

impl PassthroughReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassthroughReason::Method => "method",
            PassthroughReason::Denylisted => "denylisted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    denylist: Vec<String>,
}

impl Classifier {
    pub fn new<I, S>(denylist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            denylist: denylist.into_iter().map(Into::into).collect(),
        }
    }

    pub fn classify(&self, request: &AssetRequest) -> Classification {
        if request.method != Method::GET {
            return Classification::Passthrough(PassthroughReason::Method);
        }

        let target = &request.url[Position::BeforePath..];
        if self
            .denylist
            .iter()
            .any(|fragment| target.contains(fragment.as_str()))
        {
            return Classification::Passthrough(PassthroughReason::Denylisted);
        }

        Classification::Cacheable
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST.iter().copied())
    }
}

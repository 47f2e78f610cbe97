//! Error types for offgrid.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Origin unreachable: DNS, connect, reset, or body read failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Origin reachable but answered with a non-success status.
    #[error("Origin returned {status}")]
    Origin { status: u16 },

    #[error("Cache store error: {0}")]
    CacheStore(String),

    #[error("Precache of {url} failed: {reason}")]
    Precache { url: String, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Short machine-readable category, used in synthesized failure bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Transport(_) => "transport",
            Error::Origin { .. } => "origin",
            Error::CacheStore(_) | Error::Io(_) => "cache_store",
            Error::Precache { .. } => "precache",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Config(_) => "config",
            Error::Serialization(_) => "serialization",
        }
    }

    /// Whether the failure means the origin could not be reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

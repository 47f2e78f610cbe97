//! Storage key derivation.

use offgrid_core::{CacheGeneration, CacheKey};
use sha2::{Digest, Sha256};

/// File-safe, fixed-length name for a cache key.
pub fn storage_key(key: &CacheKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.method.as_bytes());
    hasher.update(b" ");
    hasher.update(key.url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Directory name for a generation.
pub fn sanitize_generation(generation: &CacheGeneration) -> String {
    let name: String = generation
        .as_str()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();

    match name.as_str() {
        "" | "." | ".." => format!("_{}", name),
        _ => name,
    }
}

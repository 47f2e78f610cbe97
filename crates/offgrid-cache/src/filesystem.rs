//! Filesystem-backed cache store.
//!
//! Layout: `<root>/<generation>/<sha256 of key>.json`. Each file holds one
//! entry with a hex-encoded body. Writes go to a temporary file first and
//! are renamed into place, so readers never observe a partial entry.

use crate::keys::{sanitize_generation, storage_key};
use crate::types::{CacheStats, StatCounters};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use offgrid_core::ports::CacheStore;
use offgrid_core::{CacheGeneration, CacheKey, Error, Result, StoredResponse};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk representation of one entry.
#[derive(Debug, Serialize, Deserialize)]
struct DiskRecord {
    key: CacheKey,
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
    stored_at: DateTime<Utc>,
}

impl DiskRecord {
    fn encode(key: &CacheKey, response: &StoredResponse) -> Self {
        let headers = response
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        Self {
            key: key.clone(),
            status: response.status.as_u16(),
            headers,
            body: hex::encode(&response.body),
            stored_at: response.stored_at,
        }
    }

    fn decode(self) -> Result<StoredResponse> {
        let status = StatusCode::from_u16(self.status)
            .map_err(|e| Error::CacheStore(format!("Corrupt status in entry: {}", e)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::CacheStore(format!("Corrupt header name: {}", e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::CacheStore(format!("Corrupt header value: {}", e)))?;
            headers.append(name, value);
        }

        let body = hex::decode(&self.body)
            .map_err(|e| Error::CacheStore(format!("Corrupt body in entry: {}", e)))?;

        Ok(StoredResponse {
            status,
            headers,
            body: Bytes::from(body),
            stored_at: self.stored_at,
        })
    }
}

/// Store persisting entries as files under a root directory.
#[derive(Debug)]
pub struct FilesystemStore {
    root_dir: PathBuf,
    counters: StatCounters,
}

impl FilesystemStore {
    pub fn new(root_dir: PathBuf) -> Self {
        Self {
            root_dir,
            counters: StatCounters::default(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    fn generation_dir(&self, generation: &CacheGeneration) -> PathBuf {
        self.root_dir.join(sanitize_generation(generation))
    }

    fn entry_path(&self, generation: &CacheGeneration, key: &CacheKey) -> PathBuf {
        self.generation_dir(generation)
            .join(format!("{}.json", storage_key(key)))
    }

    /// Write `record` next to `path` under a temporary name.
    async fn stage_entry(&self, path: &Path, record: &DiskRecord) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::CacheStore(format!("Failed to create cache dir: {}", e))
            })?;
        }

        let contents = serde_json::to_vec(record)?;
        let tmp_path = sibling(path, "tmp");

        if let Err(e) = tokio::fs::write(&tmp_path, contents).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(Error::CacheStore(format!(
                "Failed to write cache entry: {}",
                e
            )));
        }

        Ok(tmp_path)
    }

    async fn write_entry(&self, path: &Path, record: &DiskRecord) -> Result<()> {
        let tmp_path = self.stage_entry(path, record).await?;

        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(commit_error(e));
        }

        Ok(())
    }

    /// Move a staged file into place, setting any existing entry aside first.
    async fn commit_entry(&self, staged: &Staged) -> Result<Option<PathBuf>> {
        let backup = match tokio::fs::metadata(&staged.path).await {
            Ok(meta) if meta.is_file() => {
                let backup = sibling(&staged.path, "bak");
                tokio::fs::rename(&staged.path, &backup)
                    .await
                    .map_err(commit_error)?;
                Some(backup)
            }
            _ => None,
        };

        if let Err(e) = tokio::fs::rename(&staged.tmp, &staged.path).await {
            if let Some(backup) = &backup {
                let _ = tokio::fs::rename(backup, &staged.path).await;
            }
            return Err(commit_error(e));
        }

        Ok(backup)
    }
}

/// One entry of a batch, written but not yet visible.
struct Staged {
    tmp: PathBuf,
    path: PathBuf,
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    path.with_extension(format!("json.{}.{}", uuid::Uuid::new_v4(), suffix))
}

fn commit_error(e: std::io::Error) -> Error {
    Error::CacheStore(format!("Failed to commit cache entry: {}", e))
}

async fn discard<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) {
    for path in paths {
        let _ = tokio::fs::remove_file(path).await;
    }
}

impl Default for FilesystemStore {
    fn default() -> Self {
        Self::new(PathBuf::from("/var/offgrid/cache"))
    }
}

#[async_trait]
impl CacheStore for FilesystemStore {
    async fn get(
        &self,
        generation: &CacheGeneration,
        key: &CacheKey,
    ) -> Result<Option<StoredResponse>> {
        let path = self.entry_path(generation, key);

        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.counters.record_lookup(false);
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::CacheStore(format!(
                    "Failed to read cache entry: {}",
                    e
                )));
            }
        };

        let record: DiskRecord = serde_json::from_slice(&contents)?;
        if record.key != *key {
            // sha256 collision or a hand-edited file; either way not ours.
            warn!(path = %path.display(), "Cache entry key mismatch");
            self.counters.record_lookup(false);
            return Ok(None);
        }

        self.counters.record_lookup(true);
        record.decode().map(Some)
    }

    async fn put(
        &self,
        generation: &CacheGeneration,
        key: &CacheKey,
        response: &StoredResponse,
    ) -> Result<()> {
        let path = self.entry_path(generation, key);
        self.write_entry(&path, &DiskRecord::encode(key, response))
            .await?;
        self.counters.record_writes(1);
        debug!(key = %key, generation = %generation, "Cache entry stored");
        Ok(())
    }

    async fn put_all(
        &self,
        generation: &CacheGeneration,
        entries: &[(CacheKey, StoredResponse)],
    ) -> Result<()> {
        // Stage the whole batch before any entry becomes visible.
        let mut staged: Vec<Staged> = Vec::with_capacity(entries.len());
        for (key, response) in entries {
            let path = self.entry_path(generation, key);
            match self.stage_entry(&path, &DiskRecord::encode(key, response)).await {
                Ok(tmp) => staged.push(Staged { tmp, path }),
                Err(e) => {
                    discard(staged.iter().map(|s| &s.tmp).collect::<Vec<_>>()).await;
                    return Err(e);
                }
            }
        }

        let mut committed: Vec<(&Staged, Option<PathBuf>)> = Vec::with_capacity(staged.len());
        for (i, entry) in staged.iter().enumerate() {
            match self.commit_entry(entry).await {
                Ok(backup) => committed.push((entry, backup)),
                Err(e) => {
                    discard(staged[i..].iter().map(|s| &s.tmp).collect::<Vec<_>>()).await;
                    for (entry, backup) in committed.iter().rev() {
                        match backup {
                            Some(backup) => {
                                let _ = tokio::fs::rename(backup, &entry.path).await;
                            }
                            None => {
                                let _ = tokio::fs::remove_file(&entry.path).await;
                            }
                        }
                    }
                    warn!(generation = %generation, error = %e, "Cache batch rolled back");
                    return Err(e);
                }
            }
        }

        discard(committed.iter().filter_map(|(_, backup)| backup.as_ref()).collect::<Vec<_>>()).await;
        self.counters.record_writes(committed.len() as u64);
        Ok(())
    }
}

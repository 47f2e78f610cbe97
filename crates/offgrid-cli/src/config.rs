//! Edge configuration.

use crate::commands::Overrides;
use anyhow::Context;
use offgrid_cache::DEFAULT_MANIFEST;
use offgrid_core::CacheGeneration;
use offgrid_monitor::DEFAULT_PROBE_INTERVAL;
use offgrid_proxy::DEFAULT_DENYLIST;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Where cache entries are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Filesystem,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Base URL of the origin every request is forwarded to.
    #[serde(default = "default_origin_url")]
    pub origin_url: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub generation: CacheGeneration,
    #[serde(default)]
    pub store: StoreKind,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Liveness endpoint, relative to the origin.
    #[serde(default = "default_health_path")]
    pub health_path: String,
    #[serde(default = "default_probe_interval")]
    pub probe_interval_ms: u64,
    /// Path fragments that bypass the cache.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
    /// Paths fetched at install. Change the generation when this changes.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,
    /// Return fresh responses before their cache write completes.
    #[serde(default = "default_detach_writes")]
    pub detach_writes: bool,
    /// Per-request origin timeout. Zero disables it.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_origin_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("/var/offgrid/cache")
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_probe_interval() -> u64 {
    DEFAULT_PROBE_INTERVAL.as_millis() as u64
}

fn default_denylist() -> Vec<String> {
    DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect()
}

fn default_manifest() -> Vec<String> {
    DEFAULT_MANIFEST.iter().map(|s| s.to_string()).collect()
}

fn default_detach_writes() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            origin_url: default_origin_url(),
            listen_addr: default_listen_addr(),
            generation: CacheGeneration::default(),
            store: StoreKind::default(),
            cache_dir: default_cache_dir(),
            health_path: default_health_path(),
            probe_interval_ms: default_probe_interval(),
            denylist: default_denylist(),
            manifest: default_manifest(),
            detach_writes: default_detach_writes(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl EdgeConfig {
    /// Load from `path`, or from the default location when it exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Default configuration file path.
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "offgrid", "offgrid")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(origin) = &overrides.origin {
            self.origin_url = origin.to_string();
        }
        if let Some(listen) = &overrides.listen {
            self.listen_addr = listen.clone();
        }
        if let Some(generation) = &overrides.generation {
            self.generation = CacheGeneration::new(generation.clone());
        }
        if let Some(cache_dir) = &overrides.cache_dir {
            self.cache_dir = cache_dir.clone();
        }
        if overrides.memory {
            self.store = StoreKind::Memory;
        }
        if overrides.await_writes {
            self.detach_writes = false;
        }
    }

    pub fn origin(&self) -> anyhow::Result<Url> {
        Url::parse(&self.origin_url)
            .with_context(|| format!("Invalid origin_url {:?}", self.origin_url))
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EdgeConfig::default();
        assert_eq!(config.generation.as_str(), "v1");
        assert_eq!(config.probe_interval(), Duration::from_millis(2500));
        assert_eq!(config.denylist, vec!["/.env", "/scores", "/health"]);
        assert_eq!(config.manifest.len(), DEFAULT_MANIFEST.len());
        assert_eq!(config.store, StoreKind::Filesystem);
        assert!(config.detach_writes);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let yaml = r#"
origin_url: "http://game.local:9000"
generation: v7
store: memory
manifest:
  - /
  - /index.html
"#;
        let config: EdgeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.origin().unwrap().as_str(), "http://game.local:9000/");
        assert_eq!(config.generation.as_str(), "v7");
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.manifest, vec!["/", "/index.html"]);
        assert_eq!(config.health_path, "/health");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_invalid_origin_is_reported() {
        let config: EdgeConfig = serde_yaml::from_str("origin_url: not a url").unwrap();
        assert!(config.origin().is_err());
    }

    #[test]
    fn test_awaited_writes_from_file() {
        let config: EdgeConfig = serde_yaml::from_str("detach_writes: false").unwrap();
        assert!(!config.detach_writes);
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let config: EdgeConfig = serde_yaml::from_str("request_timeout_secs: 0").unwrap();
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen_addr: \"0.0.0.0:3000\"").unwrap();

        let config = EdgeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EdgeConfig::load(Some(&dir.path().join("absent.yaml"))).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut config = EdgeConfig::default();
        config.apply(&Overrides {
            origin: Some(Url::parse("http://10.0.0.2:8000").unwrap()),
            generation: Some("v2".to_string()),
            memory: true,
            await_writes: true,
            ..Default::default()
        });

        assert_eq!(config.origin().unwrap().host_str(), Some("10.0.0.2"));
        assert_eq!(config.generation.as_str(), "v2");
        assert_eq!(config.store, StoreKind::Memory);
        assert!(!config.detach_writes);
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
    }
}

//! In-memory cache store.

use crate::types::{CacheStats, StatCounters};
use async_trait::async_trait;
use offgrid_core::ports::CacheStore;
use offgrid_core::{CacheGeneration, CacheKey, Result, StoredResponse};
use std::collections::HashMap;
use tokio::sync::RwLock;

type Partition = HashMap<CacheKey, StoredResponse>;

/// Store backed by a map per generation. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    generations: RwLock<HashMap<CacheGeneration, Partition>>,
    counters: StatCounters,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// Number of entries held for a generation.
    pub async fn len(&self, generation: &CacheGeneration) -> usize {
        self.generations
            .read()
            .await
            .get(generation)
            .map_or(0, HashMap::len)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(
        &self,
        generation: &CacheGeneration,
        key: &CacheKey,
    ) -> Result<Option<StoredResponse>> {
        let found = self
            .generations
            .read()
            .await
            .get(generation)
            .and_then(|partition| partition.get(key))
            .cloned();
        self.counters.record_lookup(found.is_some());
        Ok(found)
    }

    async fn put(
        &self,
        generation: &CacheGeneration,
        key: &CacheKey,
        response: &StoredResponse,
    ) -> Result<()> {
        self.generations
            .write()
            .await
            .entry(generation.clone())
            .or_default()
            .insert(key.clone(), response.clone());
        self.counters.record_writes(1);
        Ok(())
    }

    async fn put_all(
        &self,
        generation: &CacheGeneration,
        entries: &[(CacheKey, StoredResponse)],
    ) -> Result<()> {
        let mut generations = self.generations.write().await;
        let partition = generations.entry(generation.clone()).or_default();
        for (key, response) in entries {
            partition.insert(key.clone(), response.clone());
        }
        self.counters.record_writes(entries.len() as u64);
        Ok(())
    }
}

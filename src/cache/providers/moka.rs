//! In-process cache backend using Moka
//!
//! Entries carry their own TTL. Lookup records live in a size-bounded cache
//! whose TinyLFU policy may evict cold entries early; job records live in a
//! separate cache with no size bound, so a job stays readable until its TTL.
//! State is per process: two service instances backed by Moka do not see
//! each other's jobs.

use crate::cache::errors::CacheResult;
use crate::cache::traits::CacheService;
use crate::config::MokaConfig;
use crate::constants::namespaces;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    ttl: Duration,
}

/// Expire each entry after the TTL it was written with
struct PerEntryTtl;

impl Expiry<String, StoredValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

type EntryCache = moka::future::Cache<String, StoredValue>;

#[derive(Clone)]
pub struct MokaCacheService {
    /// `lookup:*` and any other non-job keys; bounded by `max_capacity`
    cache: EntryCache,
    /// `job:*`; expires by TTL only
    jobs: EntryCache,
}

impl std::fmt::Debug for MokaCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCacheService")
            .field("max_capacity", &self.cache.policy().max_capacity())
            .field("entry_count", &self.cache.entry_count())
            .field("job_entry_count", &self.jobs.entry_count())
            .finish()
    }
}

impl MokaCacheService {
    pub fn from_config(config: &MokaConfig) -> Self {
        let cache = moka::future::Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        let jobs = moka::future::Cache::builder()
            .expire_after(PerEntryTtl)
            .build();

        debug!(
            max_capacity = config.max_capacity,
            "Moka in-memory cache service created"
        );

        Self { cache, jobs }
    }

    pub fn new(max_capacity: u64) -> Self {
        Self::from_config(&MokaConfig { max_capacity })
    }

    fn cache_for(&self, key: &str) -> &EntryCache {
        match key.split_once(':') {
            Some((namespace, _)) if namespace == namespaces::JOB => &self.jobs,
            _ => &self.cache,
        }
    }
}

impl CacheService for MokaCacheService {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self
            .cache_for(key)
            .get(key)
            .await
            .map(|stored| stored.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.cache_for(key)
            .insert(
                key.to_string(),
                StoredValue {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.cache_for(key).invalidate(key).await;
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "moka"
    }
}

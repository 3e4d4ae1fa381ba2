//! # System Bootstrap
//!
//! Wires configuration into the shared store, the provider chain, the lookup
//! service and the job tracker. Both entry points share one store and one
//! chain.

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::cache::CacheProvider;
use crate::config::{ConfigLoader, LookupConfig};
use crate::error::LookupResult;
use crate::health::{ComponentHealth, SystemHealth};
use crate::jobs::JobTracker;
use crate::lookup::LookupService;
use crate::providers::ProviderChain;

#[derive(Debug)]
pub struct LookupSystem {
    config: LookupConfig,
    lookup: Arc<LookupService>,
    jobs: JobTracker,
}

impl LookupSystem {
    /// Build every component from a validated configuration
    ///
    /// Must be called from within a Tokio runtime; the job dispatch service
    /// is spawned here.
    pub async fn bootstrap(config: LookupConfig) -> LookupResult<Self> {
        config.validate()?;

        let store = CacheProvider::from_config(&config.cache, &config.circuit_breakers).await?;
        let chain = ProviderChain::from_config(&config.providers, &config.circuit_breakers)?;

        let lookup = Arc::new(LookupService::new(
            store.clone(),
            chain,
            config.cache.lookup_ttl(),
        ));
        let jobs = JobTracker::start(
            lookup.clone(),
            store.clone(),
            &config.jobs,
            config.cache.job_ttl(),
        );

        info!(
            store = store.provider_name(),
            distributed = store.is_distributed(),
            providers = ?lookup.chain().provider_tags(),
            mock_only = lookup.chain().is_mock_only(),
            "Lookup system ready"
        );

        Ok(Self {
            config,
            lookup,
            jobs,
        })
    }

    /// Load configuration from the default file and `VERIGOV_*` variables
    pub async fn from_environment() -> LookupResult<Self> {
        Self::bootstrap(ConfigLoader::load()?).await
    }

    /// Load configuration from an explicit file plus `VERIGOV_*` variables
    pub async fn from_config_file(path: &Path) -> LookupResult<Self> {
        Self::bootstrap(ConfigLoader::load_from(Some(path))?).await
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    pub fn lookup(&self) -> &LookupService {
        &self.lookup
    }

    pub fn jobs(&self) -> &JobTracker {
        &self.jobs
    }

    pub fn store(&self) -> &CacheProvider {
        self.lookup.cache()
    }

    /// Probe the store and snapshot every circuit breaker
    pub async fn health(&self) -> SystemHealth {
        let store = self.store();
        let reachable = matches!(store.health_check().await, Ok(true));
        let mut store_health =
            ComponentHealth::from_circuit(store.provider_name(), store.circuit_metrics());
        store_health.healthy &= reachable;

        let chain = self.lookup.chain();
        let providers = chain
            .circuit_metrics()
            .into_iter()
            .map(|(tag, metrics)| ComponentHealth::from_circuit(tag, metrics))
            .collect();

        SystemHealth::summarize(
            store_health,
            store.is_enabled(),
            providers,
            chain.is_mock_only(),
            chain.allows_mock_fallback(),
            self.jobs.is_accepting().await,
        )
    }

    /// Drain background jobs
    pub async fn shutdown(&self) {
        self.jobs.shutdown().await;
    }
}

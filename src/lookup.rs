//! # Lookup Orchestrator
//!
//! Normalize, read the store, fall through to the provider chain on a miss,
//! then write back. Store failures only cost a network round-trip; they never
//! fail the lookup.
//!
//! ```rust
//! use std::time::Duration;
//! use verigov_lookup::{CacheProvider, LookupService, ProviderChain};
//!
//! # tokio_test::block_on(async {
//! let service = LookupService::new(
//!     CacheProvider::in_memory(100),
//!     ProviderChain::mock_only(),
//!     Duration::from_secs(60),
//! );
//!
//! let record = service.lookup("12.345.678/0001-90").await.unwrap();
//! assert_eq!(record.identifier, "12345678000190");
//! assert!(record.source.is_mock());
//! # });
//! ```

use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::cache::{keys, CacheError, CacheProvider};
use crate::error::{LookupError, LookupResult};
use crate::identifier::Cnpj;
use crate::metrics;
use crate::providers::ProviderChain;
use crate::record::CanonicalRecord;

/// Single entry point for synchronous lookups
#[derive(Debug, Clone)]
pub struct LookupService {
    cache: CacheProvider,
    chain: ProviderChain,
    ttl: Duration,
}

impl LookupService {
    pub fn new(cache: CacheProvider, chain: ProviderChain, ttl: Duration) -> Self {
        Self { cache, chain, ttl }
    }

    pub fn cache(&self) -> &CacheProvider {
        &self.cache
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    /// Resolve a raw identifier to its canonical record
    ///
    /// Cache hits are returned unchanged, including their original source.
    /// Invalid identifiers fail before any I/O.
    #[instrument(skip(self), fields(identifier = tracing::field::Empty))]
    pub async fn lookup(&self, raw: &str) -> LookupResult<CanonicalRecord> {
        let started = Instant::now();

        let identifier = match Cnpj::parse(raw) {
            Ok(identifier) => identifier,
            Err(e) => {
                metrics::record_lookup("invalid", "none", elapsed_ms(started));
                return Err(e);
            }
        };
        tracing::Span::current().record("identifier", identifier.as_str());

        let key = keys::lookup_key(&identifier);

        if let Some(record) = self.read_cached(&key).await {
            debug!(source = %record.source, "Cache hit");
            metrics::record_lookup("hit", record.source.as_str(), elapsed_ms(started));
            return Ok(record);
        }

        let record = match self.chain.fetch(&identifier).await {
            Ok(record) => record,
            Err(e) => {
                metrics::record_lookup("unavailable", "none", elapsed_ms(started));
                warn!(error = %e, "Lookup failed");
                return Err(e);
            }
        };

        if let Err(e) = self.cache.set_json(&key, &record, self.ttl).await {
            debug!(error = %e, "Cache write skipped");
        }

        metrics::record_lookup("miss", record.source.as_str(), elapsed_ms(started));
        info!(
            source = %record.source,
            status = %record.status,
            duration_ms = started.elapsed().as_millis() as u64,
            "Lookup completed"
        );

        Ok(record)
    }

    /// Drop the cached record for an identifier
    ///
    /// Useful for evicting a mock placeholder once registries recover.
    pub async fn invalidate(&self, raw: &str) -> LookupResult<()> {
        let identifier = Cnpj::parse(raw)?;
        self.cache
            .delete(&keys::lookup_key(&identifier))
            .await
            .map_err(LookupError::from)?;
        info!(identifier = %identifier, "Cached lookup invalidated");
        Ok(())
    }

    async fn read_cached(&self, key: &str) -> Option<CanonicalRecord> {
        match self.cache.get_json::<CanonicalRecord>(key).await {
            Ok(record) => record,
            Err(CacheError::SerializationError(e)) => {
                warn!(key, error = %e, "Undecodable cache entry, treating as miss");
                None
            }
            // already logged by the provider
            Err(_) => None,
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

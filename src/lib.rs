#![allow(clippy::doc_markdown)] // Allow technical terms like CNPJ, BrasilAPI in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Verigov Lookup
//!
//! Resilient lookup of Brazilian company registrations (CNPJ) against public
//! registries.
//!
//! ## Overview
//!
//! A raw identifier is normalized to 14 digits, looked up in a TTL cache and,
//! on a miss, resolved through an ordered chain of registry providers. When
//! every registry fails the chain can return a clearly labelled placeholder
//! record so callers keep working. Lookups can run inline or as tracked
//! background jobs whose status lives in the same store.
//!
//! ## Module Organization
//!
//! - [`identifier`] - CNPJ normalization
//! - [`cache`] - TTL store (Redis, Moka, NoOp) with graceful degradation
//! - [`providers`] - Registry providers, field mapping and the fallback chain
//! - [`lookup`] - Cache-aside orchestration
//! - [`jobs`] - Background lookups on a bounded worker pool
//! - [`resilience`] - Circuit breakers for registries and the store
//! - [`config`] - Layered TOML + environment configuration
//! - [`bootstrap`] - Wires everything together
//! - [`health`] - Store and breaker health snapshot
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use verigov_lookup::{LookupConfig, LookupSystem};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let system = LookupSystem::bootstrap(LookupConfig::default()).await?;
//!
//! let record = system.lookup().lookup("12.345.678/0001-90").await?;
//! println!("{} is {}", record.identifier, record.status);
//!
//! let job_id = system.jobs().enqueue("12.345.678/0001-90").await?;
//! if let Some(job) = system.jobs().get_status(&job_id).await {
//!     println!("job {} is {}", job.job_id, job.status);
//! }
//!
//! system.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod health;
pub mod identifier;
pub mod jobs;
pub mod logging;
pub mod lookup;
pub mod metrics;
pub mod providers;
pub mod record;
pub mod resilience;

pub use bootstrap::LookupSystem;
pub use cache::{CacheError, CacheProvider, CacheResult};
pub use config::{ConfigLoader, ConfigurationError, LookupConfig};
pub use error::{LookupError, LookupResult};
pub use health::{ComponentHealth, SystemHealth};
pub use identifier::{normalize_cnpj, Cnpj};
pub use jobs::{JobError, JobId, JobRecord, JobStatus, JobTracker};
pub use lookup::LookupService;
pub use providers::{Provider, ProviderChain, ProviderFailure};
pub use record::{CanonicalRecord, LookupSummary, RecordSource};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

//! # Cache Store
//!
//! TTL key-value store used cache-aside around the provider chain and as the
//! only home of job records.
//!
//! ```text
//! CacheProvider (enum dispatch + breaker + timeout)
//!   ├── Redis(RedisCacheService)   <- shared across instances ("redis", "dragonfly")
//!   ├── Moka(MokaCacheService)     <- in-process ("moka", "memory", "in-memory")
//!   └── NoOp(NoOpCacheService)     <- store unavailable: always miss, always accept
//! ```
//!
//! Store failures never fail a lookup or a job: reads degrade to misses and
//! writes are dropped, with one warning per outage.

pub mod errors;
pub mod keys;
pub mod provider;
pub mod providers;
pub mod traits;

pub use errors::{CacheError, CacheResult};
pub use provider::CacheProvider;
pub use providers::NoOpCacheService;
pub use traits::CacheService;

#[cfg(feature = "cache-redis")]
pub use providers::RedisCacheService;

#[cfg(feature = "cache-moka")]
pub use providers::MokaCacheService;

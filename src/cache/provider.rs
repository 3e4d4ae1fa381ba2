//! Cache provider with integrated circuit breaker
//!
//! Enum dispatch over the concrete backends. Resilience for the networked
//! backend (breaker, per-operation timeout, outage logging) is internal:
//! consumers only see `CacheProvider`.

use super::errors::{CacheError, CacheResult};
use super::providers::NoOpCacheService;
use super::traits::CacheService;
use crate::config::{CacheConfig, CircuitBreakerSettings};
use crate::resilience::{CircuitBreaker, CircuitBreakerMetrics, CircuitState};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[cfg(feature = "cache-redis")]
use super::providers::RedisCacheService;

#[cfg(feature = "cache-moka")]
use super::providers::MokaCacheService;

#[derive(Debug, Clone)]
enum CacheBackend {
    #[cfg(feature = "cache-redis")]
    Redis(Box<RedisCacheService>),

    #[cfg(feature = "cache-moka")]
    Moka(Box<MokaCacheService>),

    NoOp(NoOpCacheService),

    /// Never answers; exercises the operation timeout in tests
    #[cfg(test)]
    Stalled,
}

impl CacheBackend {
    fn is_distributed(&self) -> bool {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.is_distributed(),
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.is_distributed(),
            Self::NoOp(s) => s.is_distributed(),
            #[cfg(test)]
            Self::Stalled => true,
        }
    }

    fn provider_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.provider_name(),
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.provider_name(),
            Self::NoOp(s) => s.provider_name(),
            #[cfg(test)]
            Self::Stalled => "stalled",
        }
    }

    fn is_enabled(&self) -> bool {
        !matches!(self, Self::NoOp(_))
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.get(key).await,
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.get(key).await,
            Self::NoOp(s) => s.get(key).await,
            #[cfg(test)]
            Self::Stalled => stall().await,
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.set(key, value, ttl).await,
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.set(key, value, ttl).await,
            Self::NoOp(s) => s.set(key, value, ttl).await,
            #[cfg(test)]
            Self::Stalled => stall().await,
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.delete(key).await,
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.delete(key).await,
            Self::NoOp(s) => s.delete(key).await,
            #[cfg(test)]
            Self::Stalled => stall().await,
        }
    }

    async fn health_check(&self) -> CacheResult<bool> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.health_check().await,
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.health_check().await,
            Self::NoOp(s) => s.health_check().await,
            #[cfg(test)]
            Self::Stalled => stall().await,
        }
    }
}

#[cfg(test)]
async fn stall<T>() -> CacheResult<T> {
    std::future::pending().await
}

/// Shared handle to the TTL store used for lookups and job records
///
/// Cheap to clone; clones share the backend connection, the circuit breaker
/// and the outage flag.
///
/// ## Failure behavior
///
/// - Every backend call is bounded by `cache.operation_timeout_ms`.
/// - Errors are returned to the caller, which treats them as a miss or a
///   dropped write. The first error of an outage is logged at `warn`, the
///   rest at `debug`, and the first success afterwards at `info`.
/// - For the networked backend, an open circuit short-circuits reads to
///   `Ok(None)` and writes to `Ok(())`.
#[derive(Clone)]
pub struct CacheProvider {
    backend: CacheBackend,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
    operation_timeout: Duration,
    in_outage: Arc<AtomicBool>,
}

impl std::fmt::Debug for CacheProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheProvider")
            .field("backend", &self.backend)
            .field(
                "circuit_breaker",
                &self.circuit_breaker.as_ref().map(|cb| cb.state()),
            )
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

impl CacheProvider {
    /// Build the store from configuration
    ///
    /// An unreachable or unusable backend degrades to NoOp with a warning,
    /// unless `cache.fail_on_unavailable` is set, in which case the
    /// connection error is returned.
    pub async fn from_config(
        config: &CacheConfig,
        breakers: &CircuitBreakerSettings,
    ) -> CacheResult<Self> {
        let backend = match Self::create_backend(config).await {
            Ok(backend) => backend,
            Err(e) if config.fail_on_unavailable => return Err(e),
            Err(e) => {
                warn!(
                    backend = %config.backend,
                    error = %e,
                    "Cache backend unavailable, continuing without a store"
                );
                CacheBackend::NoOp(NoOpCacheService::new())
            }
        };

        let circuit_breaker = if breakers.enabled && backend.is_distributed() {
            let component_config = breakers.config_for_component("cache");
            info!(
                failure_threshold = component_config.failure_threshold,
                timeout_seconds = component_config.timeout_seconds,
                "Cache circuit breaker initialized"
            );
            Some(Arc::new(CircuitBreaker::new(
                "cache".to_string(),
                component_config.to_resilience_config(),
            )))
        } else {
            None
        };

        Ok(Self {
            backend,
            circuit_breaker,
            operation_timeout: config.operation_timeout(),
            in_outage: Arc::new(AtomicBool::new(false)),
        })
    }

    async fn create_backend(config: &CacheConfig) -> CacheResult<CacheBackend> {
        if !config.enabled {
            info!("Cache disabled by configuration");
            return Ok(CacheBackend::NoOp(NoOpCacheService::new()));
        }

        match config.backend.as_str() {
            "redis" | "dragonfly" => Self::create_redis_backend(config).await,
            "moka" | "memory" | "in-memory" => Self::create_moka_backend(config),
            "none" | "noop" => Ok(CacheBackend::NoOp(NoOpCacheService::new())),
            other => Err(CacheError::ConnectionError(format!(
                "Unknown cache backend '{other}'"
            ))),
        }
    }

    #[cfg(feature = "cache-redis")]
    async fn create_redis_backend(config: &CacheConfig) -> CacheResult<CacheBackend> {
        let redis_config = config.redis.as_ref().ok_or_else(|| {
            CacheError::ConnectionError("Redis backend selected but [cache.redis] is missing".into())
        })?;

        let service = RedisCacheService::from_config(redis_config).await?;
        info!(backend = "redis", "Cache store connected");
        Ok(CacheBackend::Redis(Box::new(service)))
    }

    #[cfg(not(feature = "cache-redis"))]
    async fn create_redis_backend(_config: &CacheConfig) -> CacheResult<CacheBackend> {
        Err(CacheError::ConnectionError(
            "Redis backend requested but the 'cache-redis' feature is not enabled".into(),
        ))
    }

    #[cfg(feature = "cache-moka")]
    fn create_moka_backend(config: &CacheConfig) -> CacheResult<CacheBackend> {
        let service = MokaCacheService::from_config(&config.moka);
        info!(
            backend = "moka",
            max_capacity = config.moka.max_capacity,
            "In-process cache store initialized"
        );
        Ok(CacheBackend::Moka(Box::new(service)))
    }

    #[cfg(not(feature = "cache-moka"))]
    fn create_moka_backend(_config: &CacheConfig) -> CacheResult<CacheBackend> {
        Err(CacheError::ConnectionError(
            "Moka backend requested but the 'cache-moka' feature is not enabled".into(),
        ))
    }

    /// Always-miss store
    pub fn noop() -> Self {
        Self {
            backend: CacheBackend::NoOp(NoOpCacheService::new()),
            circuit_breaker: None,
            operation_timeout: Duration::from_secs(1),
            in_outage: Arc::new(AtomicBool::new(false)),
        }
    }

    /// In-process store with per-entry TTLs
    #[cfg(feature = "cache-moka")]
    pub fn in_memory(max_capacity: u64) -> Self {
        Self {
            backend: CacheBackend::Moka(Box::new(MokaCacheService::new(max_capacity))),
            circuit_breaker: None,
            operation_timeout: Duration::from_secs(1),
            in_outage: Arc::new(AtomicBool::new(false)),
        }
    }

    /// False for the NoOp sentinel
    pub fn is_enabled(&self) -> bool {
        self.backend.is_enabled()
    }

    pub fn is_distributed(&self) -> bool {
        self.backend.is_distributed()
    }

    pub fn provider_name(&self) -> &'static str {
        self.backend.provider_name()
    }

    pub fn circuit_state(&self) -> Option<CircuitState> {
        self.circuit_breaker.as_ref().map(|cb| cb.state())
    }

    pub fn circuit_metrics(&self) -> Option<CircuitBreakerMetrics> {
        self.circuit_breaker.as_ref().map(|cb| cb.metrics())
    }

    /// Store whose every call hangs until `operation_timeout`
    #[cfg(test)]
    pub(crate) fn stalled(operation_timeout: Duration) -> Self {
        Self {
            backend: CacheBackend::Stalled,
            circuit_breaker: None,
            operation_timeout,
            in_outage: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.guarded("get", key, None, || self.backend.get(key)).await
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.guarded("set", key, (), || self.backend.set(key, value, ttl))
            .await
    }

    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        self.guarded("delete", key, (), || self.backend.delete(key))
            .await
    }

    /// Reports unhealthy while the circuit is open
    pub async fn health_check(&self) -> CacheResult<bool> {
        if let Some(cb) = &self.circuit_breaker {
            if !cb.should_allow() {
                return Ok(false);
            }
        }
        self.guarded("health_check", "", false, || self.backend.health_check())
            .await
    }

    /// Read and decode a JSON value
    ///
    /// A stored value that fails to decode is reported as
    /// `CacheError::SerializationError`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> CacheResult<()> {
        let encoded = serde_json::to_string(value)?;
        self.set(key, &encoded, ttl).await
    }

    /// Run one backend call under the breaker and the operation timeout
    ///
    /// `open_value` is returned without calling the backend while the
    /// circuit is open.
    async fn guarded<T, F, Fut>(
        &self,
        operation: &'static str,
        key: &str,
        open_value: T,
        call: F,
    ) -> CacheResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<T>>,
    {
        let breaker = self.circuit_breaker.as_deref();
        if let Some(cb) = breaker {
            if !cb.should_allow() {
                debug!(operation, key, "Cache circuit open, skipping backend");
                return Ok(open_value);
            }
        }

        let started = Instant::now();
        let result = match tokio::time::timeout(self.operation_timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(format!(
                "{operation} exceeded {}ms",
                self.operation_timeout.as_millis()
            ))),
        };
        let elapsed = started.elapsed();

        match &result {
            Ok(_) => {
                if let Some(cb) = breaker {
                    cb.record_success(elapsed);
                }
                if self.in_outage.swap(false, Ordering::AcqRel) {
                    info!(
                        backend = self.provider_name(),
                        "Cache store reachable again"
                    );
                }
            }
            Err(e) => {
                if let Some(cb) = breaker {
                    cb.record_failure(elapsed);
                }
                if self.in_outage.swap(true, Ordering::AcqRel) {
                    debug!(operation, key, error = %e, "Cache store still unavailable");
                } else {
                    warn!(
                        backend = self.provider_name(),
                        operation,
                        key,
                        error = %e,
                        "Cache store unavailable, continuing without it"
                    );
                }
            }
        }

        result
    }
}

//! Cache service trait definition

use super::errors::CacheResult;
use std::time::Duration;

/// Key-value operations every store backend provides
///
/// Values are opaque strings; typed access lives on
/// [`super::CacheProvider::get_json`] and [`super::CacheProvider::set_json`].
pub trait CacheService: Send + Sync {
    /// `Ok(Some(value))` on hit, `Ok(None)` on miss or expiry
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = CacheResult<Option<String>>> + Send;

    /// Store a value that expires after `ttl`
    fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    fn delete(&self, key: &str) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    fn health_check(&self) -> impl std::future::Future<Output = CacheResult<bool>> + Send;

    fn provider_name(&self) -> &'static str;

    /// Whether calls cross the network (and so warrant a circuit breaker)
    fn is_distributed(&self) -> bool {
        false
    }
}

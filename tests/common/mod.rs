#![allow(dead_code)]

pub mod fake_registry;
pub mod gated_provider;
pub mod strategies;

pub use fake_registry::*;
pub use gated_provider::*;

use std::sync::Arc;
use std::time::Duration;

use verigov_lookup::config::{CircuitBreakerSettings, ProviderConfig, ProvidersConfig};
use verigov_lookup::providers::{Provider, ProviderChain};
use verigov_lookup::{CacheProvider, LookupService};

pub const LOOKUP_TTL: Duration = Duration::from_secs(60);

/// Lookup service over HTTP registries with circuit breakers disabled
pub fn http_service(registries: Vec<ProviderConfig>, allow_mock_fallback: bool) -> LookupService {
    http_service_with(registries, allow_mock_fallback, &CircuitBreakerSettings {
        enabled: false,
        ..CircuitBreakerSettings::default()
    })
}

pub fn http_service_with(
    registries: Vec<ProviderConfig>,
    allow_mock_fallback: bool,
    breakers: &CircuitBreakerSettings,
) -> LookupService {
    let config = ProvidersConfig {
        allow_mock_fallback,
        mock_only: false,
        registries,
    };
    let chain = ProviderChain::from_config(&config, breakers).expect("valid provider config");
    LookupService::new(CacheProvider::in_memory(1_000), chain, LOOKUP_TTL)
}

/// Lookup service with a single in-process provider
pub fn service_with(
    provider: Arc<dyn Provider>,
    store: CacheProvider,
    allow_mock_fallback: bool,
) -> Arc<LookupService> {
    Arc::new(LookupService::new(
        store,
        ProviderChain::new(vec![provider], allow_mock_fallback),
        LOOKUP_TTL,
    ))
}

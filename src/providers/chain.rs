//! Ordered provider fallback.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{mock_record, CircuitBreakerProvider, HttpProvider, Provider, ProviderFailure};
use crate::config::{CircuitBreakerSettings, ConfigurationError, ProvidersConfig};
use crate::error::{LookupError, LookupResult};
use crate::identifier::Cnpj;
use crate::metrics;
use crate::record::CanonicalRecord;
use crate::resilience::CircuitBreakerMetrics;

/// Registries tried in priority order, with an optional mock fallback
#[derive(Debug, Clone)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn Provider>>,
    allow_mock_fallback: bool,
    mock_only: bool,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn Provider>>, allow_mock_fallback: bool) -> Self {
        Self {
            providers,
            allow_mock_fallback,
            mock_only: false,
        }
    }

    /// A chain that never touches the network
    pub fn mock_only() -> Self {
        Self {
            providers: Vec::new(),
            allow_mock_fallback: true,
            mock_only: true,
        }
    }

    /// Build HTTP providers from configuration, each behind its own breaker
    /// when circuit breakers are enabled
    pub fn from_config(
        config: &ProvidersConfig,
        breakers: &CircuitBreakerSettings,
    ) -> Result<Self, ConfigurationError> {
        if config.mock_only {
            info!("Provider chain in mock-only mode, registries will not be queried");
            return Ok(Self::mock_only());
        }

        let mut providers: Vec<Arc<dyn Provider>> = Vec::with_capacity(config.registries.len());
        for registry in &config.registries {
            let http: Arc<dyn Provider> = Arc::new(HttpProvider::new(registry)?);
            let provider: Arc<dyn Provider> = if breakers.enabled {
                let cb_config = breakers
                    .config_for_component(&registry.tag)
                    .to_resilience_config();
                Arc::new(CircuitBreakerProvider::new(http, cb_config))
            } else {
                http
            };
            providers.push(provider);
        }

        info!(
            providers = ?providers.iter().map(|p| p.tag()).collect::<Vec<_>>(),
            allow_mock_fallback = config.allow_mock_fallback,
            "Provider chain configured"
        );

        Ok(Self::new(providers, config.allow_mock_fallback))
    }

    pub fn provider_tags(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.tag()).collect()
    }

    /// Breaker snapshot per provider, in chain order
    pub fn circuit_metrics(&self) -> Vec<(&str, Option<CircuitBreakerMetrics>)> {
        self.providers
            .iter()
            .map(|p| (p.tag(), p.circuit_metrics()))
            .collect()
    }

    pub fn allows_mock_fallback(&self) -> bool {
        self.allow_mock_fallback
    }

    pub fn is_mock_only(&self) -> bool {
        self.mock_only
    }

    /// Query providers in order until one succeeds
    ///
    /// When all fail, returns the mock record if allowed, otherwise
    /// `UpstreamUnavailable` carrying the last failure.
    pub async fn fetch(&self, identifier: &Cnpj) -> LookupResult<CanonicalRecord> {
        if self.mock_only {
            debug!(identifier = %identifier, "Mock-only chain, returning placeholder record");
            return Ok(mock_record(identifier));
        }

        let mut last_failure: Option<ProviderFailure> = None;

        for provider in &self.providers {
            match provider.fetch(identifier).await {
                Ok(record) => {
                    metrics::record_provider_attempt(provider.tag(), "success");
                    debug!(
                        identifier = %identifier,
                        provider = provider.tag(),
                        status = %record.status,
                        "Registry lookup succeeded"
                    );
                    return Ok(record);
                }
                Err(failure) => {
                    metrics::record_provider_attempt(provider.tag(), failure.kind());
                    warn!(
                        identifier = %identifier,
                        provider = provider.tag(),
                        failure = failure.kind(),
                        error = %failure,
                        "Registry lookup failed, trying next provider"
                    );
                    last_failure = Some(failure);
                }
            }
        }

        if self.allow_mock_fallback {
            warn!(
                identifier = %identifier,
                attempts = self.providers.len(),
                "All registries failed, returning mock record"
            );
            return Ok(mock_record(identifier));
        }

        Err(LookupError::UpstreamUnavailable {
            identifier: identifier.to_string(),
            attempts: self.providers.len(),
            last_failure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordSource;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Scripted {
        tag: &'static str,
        failure: Option<ProviderFailure>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(tag: &'static str) -> Arc<Self> {
            Arc::new(Self {
                tag,
                failure: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(tag: &'static str, code: u16) -> Arc<Self> {
            Arc::new(Self {
                tag,
                failure: Some(ProviderFailure::Status {
                    provider: tag.to_string(),
                    code,
                }),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Provider for Scripted {
        fn tag(&self) -> &str {
            self.tag
        }

        async fn fetch(&self, identifier: &Cnpj) -> Result<CanonicalRecord, ProviderFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.failure {
                Some(failure) => Err(failure.clone()),
                None => Ok(CanonicalRecord {
                    identifier: identifier.to_string(),
                    legal_name: Some(format!("{} record", self.tag)),
                    status: "ATIVA".to_string(),
                    registered_since: None,
                    retrieved_at: Utc::now(),
                    source: RecordSource::provider(self.tag),
                    raw: Some(serde_json::json!({})),
                }),
            }
        }
    }

    fn cnpj() -> Cnpj {
        Cnpj::parse("12345678000190").unwrap()
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let primary = Scripted::ok("primary");
        let fallback = Scripted::ok("fallback");
        let providers: Vec<Arc<dyn Provider>> = vec![primary.clone(), fallback.clone()];
        let chain = ProviderChain::new(providers, false);

        let record = chain.fetch(&cnpj()).await.unwrap();
        assert_eq!(record.source.as_str(), "primary");
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_in_order() {
        let primary = Scripted::failing("primary", 502);
        let fallback = Scripted::ok("fallback");
        let providers: Vec<Arc<dyn Provider>> = vec![primary.clone(), fallback.clone()];
        let chain = ProviderChain::new(providers, false);

        let record = chain.fetch(&cnpj()).await.unwrap();
        assert_eq!(record.source.as_str(), "fallback");
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_failing_with_mock_allowed() {
        let providers: Vec<Arc<dyn Provider>> =
            vec![Scripted::failing("primary", 500), Scripted::failing("fallback", 503)];
        let chain = ProviderChain::new(providers, true);

        let record = chain.fetch(&cnpj()).await.unwrap();
        assert!(record.source.is_mock());
        assert_eq!(record.identifier, "12345678000190");
    }

    #[tokio::test]
    async fn test_all_failing_without_mock_reports_last_failure() {
        let providers: Vec<Arc<dyn Provider>> =
            vec![Scripted::failing("primary", 500), Scripted::failing("fallback", 503)];
        let chain = ProviderChain::new(providers, false);

        let err = chain.fetch(&cnpj()).await.unwrap_err();
        assert_eq!(
            err,
            LookupError::UpstreamUnavailable {
                identifier: "12345678000190".to_string(),
                attempts: 2,
                last_failure: Some(ProviderFailure::Status {
                    provider: "fallback".to_string(),
                    code: 503,
                }),
            }
        );
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let err = ProviderChain::new(Vec::new(), false)
            .fetch(&cnpj())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LookupError::UpstreamUnavailable {
                attempts: 0,
                last_failure: None,
                ..
            }
        ));

        let record = ProviderChain::new(Vec::new(), true)
            .fetch(&cnpj())
            .await
            .unwrap();
        assert!(record.source.is_mock());
    }

    #[tokio::test]
    async fn test_mock_only_chain() {
        let chain = ProviderChain::mock_only();
        assert!(chain.is_mock_only());
        assert!(chain.provider_tags().is_empty());
        assert!(chain.fetch(&cnpj()).await.unwrap().source.is_mock());
    }

    #[test]
    fn test_from_config_wraps_registries() {
        let chain =
            ProviderChain::from_config(&ProvidersConfig::default(), &CircuitBreakerSettings::default())
                .unwrap();
        assert_eq!(chain.provider_tags(), vec!["publica.cnpj.ws", "brasilapi"]);
        assert!(chain.allows_mock_fallback());
        assert!(chain
            .circuit_metrics()
            .iter()
            .all(|(_, metrics)| metrics.as_ref().is_some_and(|m| m.total_calls == 0)));

        let unguarded = ProviderChain::from_config(
            &ProvidersConfig::default(),
            &CircuitBreakerSettings {
                enabled: false,
                ..CircuitBreakerSettings::default()
            },
        )
        .unwrap();
        assert!(unguarded
            .circuit_metrics()
            .iter()
            .all(|(_, metrics)| metrics.is_none()));

        let mock = ProviderChain::from_config(
            &ProvidersConfig {
                mock_only: true,
                ..ProvidersConfig::default()
            },
            &CircuitBreakerSettings::default(),
        )
        .unwrap();
        assert!(mock.is_mock_only());
    }
}

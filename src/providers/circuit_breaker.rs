//! Circuit breaker decorator for registry providers.
//!
//! While a registry's circuit is open the chain skips it without a network
//! call and moves straight to the next provider. Only outages count against
//! the circuit; a 4xx answer proves the registry is up.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use super::{Provider, ProviderFailure};
use crate::identifier::Cnpj;
use crate::record::CanonicalRecord;
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState};

#[derive(Debug)]
pub struct CircuitBreakerProvider {
    inner: Arc<dyn Provider>,
    breaker: CircuitBreaker,
}

impl CircuitBreakerProvider {
    pub fn new(inner: Arc<dyn Provider>, config: CircuitBreakerConfig) -> Self {
        let breaker = CircuitBreaker::new(inner.tag().to_string(), config);
        Self { inner, breaker }
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }
}

#[async_trait]
impl Provider for CircuitBreakerProvider {
    fn tag(&self) -> &str {
        self.inner.tag()
    }

    fn circuit_metrics(&self) -> Option<CircuitBreakerMetrics> {
        Some(self.breaker.metrics())
    }

    async fn fetch(&self, identifier: &Cnpj) -> Result<CanonicalRecord, ProviderFailure> {
        if !self.breaker.should_allow() {
            return Err(ProviderFailure::CircuitOpen {
                provider: self.inner.tag().to_string(),
            });
        }

        let started = Instant::now();
        let result = self.inner.fetch(identifier).await;
        match &result {
            Err(failure) if failure.indicates_outage() => {
                self.breaker.record_failure(started.elapsed())
            }
            _ => self.breaker.record_success(started.elapsed()),
        }
        result
    }
}

//! # Provider Chain
//!
//! Upstream registry clients and the ordered fallback chain that drives them.
//!
//! - [`HttpProvider`]: GET on a URL template, JSON body mapped by [`FieldMapping`]
//! - [`CircuitBreakerProvider`]: skips a provider whose circuit is open
//! - [`ProviderChain`]: tries providers in order, then the mock record or
//!   [`crate::LookupError::UpstreamUnavailable`]

pub mod chain;
pub mod circuit_breaker;
pub mod http;
pub mod mapping;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use crate::identifier::Cnpj;
use crate::record::CanonicalRecord;
use crate::resilience::CircuitBreakerMetrics;

pub use chain::ProviderChain;
pub use circuit_breaker::CircuitBreakerProvider;
pub use http::HttpProvider;
pub use mapping::FieldMapping;
pub use mock::mock_record;

/// One upstream registry
#[async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Stable tag recorded as the record's source
    fn tag(&self) -> &str;

    /// Breaker snapshot, for providers wrapped in a circuit breaker
    fn circuit_metrics(&self) -> Option<CircuitBreakerMetrics> {
        None
    }

    /// Fetch and map the record for a canonical identifier
    async fn fetch(&self, identifier: &Cnpj) -> Result<CanonicalRecord, ProviderFailure>;
}

/// Why a single provider attempt failed
///
/// Recovered by the chain; only ever surfaces as the `last_failure` of an
/// upstream-unavailable error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderFailure {
    #[error("{provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("{provider} network error: {message}")]
    Network { provider: String, message: String },

    #[error("{provider} responded with HTTP {code}")]
    Status { provider: String, code: u16 },

    #[error("{provider} returned an unusable body: {message}")]
    MalformedBody { provider: String, message: String },

    #[error("{provider} skipped: circuit open")]
    CircuitOpen { provider: String },
}

impl ProviderFailure {
    pub fn provider(&self) -> &str {
        match self {
            Self::Timeout { provider, .. }
            | Self::Network { provider, .. }
            | Self::Status { provider, .. }
            | Self::MalformedBody { provider, .. }
            | Self::CircuitOpen { provider } => provider,
        }
    }

    /// Whether the failure says the registry itself is unhealthy
    ///
    /// A 4xx answer (unknown CNPJ, rate limit) comes from a working registry
    /// and must not open its circuit.
    pub fn indicates_outage(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } | Self::MalformedBody { .. } => true,
            Self::Status { code, .. } => *code >= 500,
            Self::CircuitOpen { .. } => false,
        }
    }

    /// Metric label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Network { .. } => "network",
            Self::Status { .. } => "status",
            Self::MalformedBody { .. } => "malformed_body",
            Self::CircuitOpen { .. } => "circuit_open",
        }
    }
}

//! # Health Reporting
//!
//! Snapshot of the store, each registry's circuit breaker and the job queue,
//! as printed by `verigov-lookup health`.

use serde::{Deserialize, Serialize};

use crate::resilience::CircuitBreakerMetrics;

/// Health of one component; `circuit` is absent when it has no breaker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit: Option<CircuitBreakerMetrics>,
}

impl ComponentHealth {
    /// Healthy unless the breaker reports otherwise
    pub fn from_circuit(name: impl Into<String>, circuit: Option<CircuitBreakerMetrics>) -> Self {
        Self {
            name: name.into(),
            healthy: circuit.as_ref().map_or(true, CircuitBreakerMetrics::is_healthy),
            circuit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    /// Store reachable and at least one registry (or the mock chain) usable
    pub healthy: bool,
    /// `false` for the NoOp store: lookups work but job state is invisible
    pub store_enabled: bool,
    pub store: ComponentHealth,
    pub providers: Vec<ComponentHealth>,
    pub mock_only: bool,
    /// Lookups still answer (with placeholders) when every registry fails
    pub mock_fallback: bool,
    pub accepting_jobs: bool,
}

impl SystemHealth {
    pub(crate) fn summarize(
        store: ComponentHealth,
        store_enabled: bool,
        providers: Vec<ComponentHealth>,
        mock_only: bool,
        mock_fallback: bool,
        accepting_jobs: bool,
    ) -> Self {
        let registries_usable = mock_only || providers.iter().any(|p| p.healthy);
        Self {
            healthy: store.healthy && registries_usable,
            store_enabled,
            store,
            providers,
            mock_only,
            mock_fallback,
            accepting_jobs,
        }
    }
}

//! # Circuit Breaker Metrics
//!
//! Point-in-time snapshots of a breaker's counters, used by health reporting
//! and the CLI's diagnostics output.

use crate::resilience::CircuitState;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metrics for a single circuit breaker instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    pub total_calls: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub consecutive_failures: u64,
    /// Successful probes since the breaker last entered half-open
    pub half_open_calls: u64,
    pub total_duration: Duration,
    pub current_state: CircuitState,
    /// 0.0 to 1.0
    pub failure_rate: f64,
    pub average_duration: Duration,
}

impl CircuitBreakerMetrics {
    /// Check if metrics indicate healthy operation
    pub fn is_healthy(&self) -> bool {
        match self.current_state {
            CircuitState::Closed => self.failure_rate < 0.1,
            CircuitState::Open => false,
            CircuitState::HalfOpen => true,
        }
    }
}

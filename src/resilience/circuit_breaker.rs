//! # Circuit Breaker
//!
//! Closed (normal), Open (fail fast) and Half-Open (probing recovery), with
//! every counter held in atomics so the hot path never takes a lock.

use crate::resilience::{CircuitBreakerConfig, CircuitBreakerMetrics};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct AtomicCounters {
    total_calls: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    consecutive_failures: AtomicU64,
    half_open_successes: AtomicU64,
    total_duration_nanos: AtomicU64,
}

impl AtomicCounters {
    #[inline]
    fn record(&self, success: bool, duration: Duration) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        if success {
            self.success_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
        self.total_duration_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn snapshot(&self, state: CircuitState) -> CircuitBreakerMetrics {
        let total_calls = self.total_calls.load(Ordering::Relaxed);
        let success_count = self.success_count.load(Ordering::Relaxed);
        let failure_count = self.failure_count.load(Ordering::Relaxed);
        let total_nanos = self.total_duration_nanos.load(Ordering::Relaxed);

        let failure_rate = if total_calls > 0 {
            failure_count as f64 / total_calls as f64
        } else {
            0.0
        };
        let average_duration = if total_calls > 0 {
            Duration::from_nanos(total_nanos / total_calls)
        } else {
            Duration::ZERO
        };

        CircuitBreakerMetrics {
            total_calls,
            success_count,
            failure_count,
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            half_open_calls: self.half_open_successes.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(total_nanos),
            current_state: state,
            failure_rate,
            average_duration,
        }
    }
}

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// All calls are allowed through
    Closed = 0,
    /// All calls fail fast without executing
    Open = 1,
    /// Limited calls allowed to test recovery
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open,
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Lock-free circuit breaker
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    state: AtomicU8,
    config: CircuitBreakerConfig,
    counters: AtomicCounters,
    /// Monotonic reference point for `opened_at_nanos`
    epoch: Instant,
    /// Nanos since `epoch` when the circuit opened, plus one; 0 when not open
    opened_at_nanos: AtomicU64,
}

impl CircuitBreaker {
    pub fn new(name: String, config: CircuitBreakerConfig) -> Self {
        debug!(
            component = %name,
            failure_threshold = config.failure_threshold,
            timeout_seconds = config.timeout.as_secs(),
            success_threshold = config.success_threshold,
            "Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            config,
            counters: AtomicCounters::default(),
            epoch: Instant::now(),
            opened_at_nanos: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Pre-flight check; the caller records the outcome afterwards
    ///
    /// An open circuit whose timeout has elapsed moves to half-open and
    /// admits the call.
    pub fn should_allow(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let opened = self.opened_at_nanos.load(Ordering::Acquire);
                if opened == 0 {
                    return true;
                }

                let now = self.epoch.elapsed().as_nanos() as u64 + 1;
                if now.saturating_sub(opened) >= self.config.timeout.as_nanos() as u64 {
                    self.transition_to_half_open();
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                self.counters.half_open_successes.load(Ordering::Relaxed)
                    < self.config.success_threshold as u64
            }
        }
    }

    pub fn record_success(&self, duration: Duration) {
        self.counters.record(true, duration);

        match self.state() {
            CircuitState::HalfOpen => {
                let successes = self
                    .counters
                    .half_open_successes
                    .fetch_add(1, Ordering::Relaxed)
                    + 1;
                if successes >= self.config.success_threshold as u64 {
                    self.transition_to_closed();
                }
            }
            CircuitState::Closed => {
                self.counters
                    .consecutive_failures
                    .store(0, Ordering::Relaxed);
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self, duration: Duration) {
        self.counters.record(false, duration);

        match self.state() {
            CircuitState::Closed => {
                let failures = self
                    .counters
                    .consecutive_failures
                    .fetch_add(1, Ordering::Relaxed)
                    + 1;
                if failures >= self.config.failure_threshold as u64 {
                    self.transition_to_open();
                }
            }
            // a failed probe reopens immediately
            CircuitState::HalfOpen => self.transition_to_open(),
            CircuitState::Open => {}
        }
    }

    fn transition_to_closed(&self) {
        self.counters
            .consecutive_failures
            .store(0, Ordering::Relaxed);
        self.counters.half_open_successes.store(0, Ordering::Relaxed);
        self.opened_at_nanos.store(0, Ordering::Release);
        self.state
            .store(CircuitState::Closed as u8, Ordering::Release);

        info!(component = %self.name, "Circuit breaker closed (recovered)");
    }

    fn transition_to_open(&self) {
        let now = self.epoch.elapsed().as_nanos() as u64 + 1;
        self.opened_at_nanos.store(now, Ordering::Release);
        self.counters.half_open_successes.store(0, Ordering::Relaxed);
        self.state.store(CircuitState::Open as u8, Ordering::Release);

        warn!(
            component = %self.name,
            consecutive_failures = self.counters.consecutive_failures.load(Ordering::Relaxed),
            timeout_seconds = self.config.timeout.as_secs(),
            "Circuit breaker opened (failing fast)"
        );
    }

    fn transition_to_half_open(&self) {
        self.counters.half_open_successes.store(0, Ordering::Relaxed);
        self.state
            .store(CircuitState::HalfOpen as u8, Ordering::Release);

        info!(component = %self.name, "Circuit breaker half-open (testing recovery)");
    }

    /// Point-in-time counters for health reporting
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        self.counters.snapshot(self.state())
    }
}

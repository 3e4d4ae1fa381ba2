//! # Resilience
//!
//! Lock-free circuit breaker shared by the networked cache backend and the
//! upstream registry clients. A breaker that has seen `failure_threshold`
//! consecutive failures rejects calls until `timeout` elapses, then admits
//! probes until `success_threshold` of them succeed.
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use verigov_lookup::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
//!
//! let breaker = CircuitBreaker::new("brasilapi".to_string(), CircuitBreakerConfig::default());
//!
//! if breaker.should_allow() {
//!     let started = Instant::now();
//!     // ... call the registry ...
//!     breaker.record_success(started.elapsed());
//! }
//! assert_eq!(breaker.metrics().current_state, CircuitState::Closed);
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod metrics;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use config::CircuitBreakerConfig;
pub use metrics::CircuitBreakerMetrics;

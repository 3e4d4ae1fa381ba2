//! # Lookup Metrics
//!
//! OpenTelemetry instruments for the lookup path and the job tracker. They
//! record into the global meter provider, which is a no-op until the host
//! application installs an exporter.
//!
//! ```rust
//! use opentelemetry::KeyValue;
//! use verigov_lookup::metrics::lookups_total;
//!
//! lookups_total().add(
//!     1,
//!     &[
//!         KeyValue::new("outcome", "miss"),
//!         KeyValue::new("source", "brasilapi"),
//!     ],
//! );
//! ```

use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

static LOOKUP_METER: OnceLock<Meter> = OnceLock::new();
static LOOKUPS_TOTAL: OnceLock<Counter<u64>> = OnceLock::new();
static PROVIDER_ATTEMPTS_TOTAL: OnceLock<Counter<u64>> = OnceLock::new();
static LOOKUP_DURATION: OnceLock<Histogram<f64>> = OnceLock::new();
static JOB_TRANSITIONS_TOTAL: OnceLock<Counter<u64>> = OnceLock::new();

fn meter() -> &'static Meter {
    LOOKUP_METER.get_or_init(|| opentelemetry::global::meter_provider().meter("verigov-lookup"))
}

/// Completed lookups
///
/// Labels:
/// - outcome: hit, miss, invalid, unavailable
/// - source: provider tag, mock, or none
pub fn lookups_total() -> &'static Counter<u64> {
    LOOKUPS_TOTAL.get_or_init(|| {
        meter()
            .u64_counter("verigov.lookups.total")
            .with_description("Total number of registry lookups")
            .build()
    })
}

/// Individual provider calls made by the chain
///
/// Labels:
/// - provider: provider tag
/// - result: success, timeout, network, status, malformed_body, circuit_open
pub fn provider_attempts_total() -> &'static Counter<u64> {
    PROVIDER_ATTEMPTS_TOTAL.get_or_init(|| {
        meter()
            .u64_counter("verigov.provider.attempts.total")
            .with_description("Total number of upstream registry calls")
            .build()
    })
}

/// End-to-end lookup latency in milliseconds
pub fn lookup_duration() -> &'static Histogram<f64> {
    LOOKUP_DURATION.get_or_init(|| {
        meter()
            .f64_histogram("verigov.lookup.duration")
            .with_description("Lookup duration including cache and provider calls")
            .with_unit("ms")
            .build()
    })
}

/// Job status transitions
///
/// Labels:
/// - status: queued, running, done, error
pub fn job_transitions_total() -> &'static Counter<u64> {
    JOB_TRANSITIONS_TOTAL.get_or_init(|| {
        meter()
            .u64_counter("verigov.jobs.transitions.total")
            .with_description("Total number of job status transitions")
            .build()
    })
}

pub(crate) fn record_lookup(outcome: &'static str, source: &str, duration_ms: f64) {
    lookups_total().add(
        1,
        &[
            KeyValue::new("outcome", outcome),
            KeyValue::new("source", source.to_string()),
        ],
    );
    lookup_duration().record(duration_ms, &[KeyValue::new("outcome", outcome)]);
}

pub(crate) fn record_provider_attempt(provider: &str, result: &'static str) {
    provider_attempts_total().add(
        1,
        &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("result", result),
        ],
    );
}

pub(crate) fn record_job_transition(status: &'static str) {
    job_transitions_total().add(1, &[KeyValue::new("status", status)]);
}

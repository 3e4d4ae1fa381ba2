//! # Structured Logging
//!
//! Environment-aware console logging. `RUST_LOG` wins when set; otherwise the
//! level follows `VERIGOV_ENV` / `APP_ENV`. Set `VERIGOV_LOG_FORMAT=json` for
//! one JSON object per line.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::ConfigLoader;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

const LOG_FORMAT_ENV: &str = "VERIGOV_LOG_FORMAT";

/// Install the global subscriber once; later calls are no-ops
pub fn init_tracing() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = ConfigLoader::detect_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = wants_json(std::env::var(LOG_FORMAT_ENV).ok().as_deref());

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // another subscriber (e.g. a host application's) may already be set
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        }

        tracing::debug!(environment = %environment, json, "Logging initialized");
    });
}

fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

fn wants_json(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.eq_ignore_ascii_case("json"))
}

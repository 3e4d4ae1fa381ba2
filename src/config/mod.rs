//! # Lookup Configuration
//!
//! Typed configuration for the cache store, the provider chain and the job
//! tracker. Every section carries serde defaults, so an empty source yields a
//! working configuration pointed at the two public registries.
//!
//! ## Sources
//!
//! [`ConfigLoader`] layers, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`config/verigov.toml`, or the path in `VERIGOV_CONFIG`)
//! 3. `VERIGOV_*` environment variables, with `__` separating nested keys
//!
//! ```rust,no_run
//! use verigov_lookup::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // VERIGOV_CACHE__LOOKUP_TTL_SECONDS=3600 overrides cache.lookup_ttl_seconds
//! let config = ConfigLoader::load()?;
//! assert!(config.jobs.max_workers > 0);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::constants::{defaults, providers};
use crate::providers::FieldMapping;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Root configuration for the lookup core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub cache: CacheConfig,
    pub jobs: JobsConfig,
    pub providers: ProvidersConfig,
    pub circuit_breakers: CircuitBreakerSettings,
}

/// Cache store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false the store is the always-miss NoOp backend
    pub enabled: bool,
    /// `redis` / `dragonfly`, `moka` / `memory` / `in-memory`, or `none`
    pub backend: String,
    pub lookup_ttl_seconds: u64,
    pub job_ttl_seconds: u64,
    /// Refuse to start instead of degrading to NoOp when the backend is unreachable
    pub fail_on_unavailable: bool,
    /// Upper bound for a single store round-trip
    pub operation_timeout_ms: u64,
    pub redis: Option<RedisConfig>,
    pub moka: MokaConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: "redis".to_string(),
            lookup_ttl_seconds: defaults::LOOKUP_TTL.as_secs(),
            job_ttl_seconds: defaults::JOB_TTL.as_secs(),
            fail_on_unavailable: false,
            operation_timeout_ms: 1_000,
            redis: Some(RedisConfig::default()),
            moka: MokaConfig::default(),
        }
    }
}

impl CacheConfig {
    /// In-process store, used by tests and single-instance deployments
    pub fn in_memory() -> Self {
        Self {
            backend: "moka".to_string(),
            redis: None,
            ..Self::default()
        }
    }

    pub fn lookup_ttl(&self) -> Duration {
        Duration::from_secs(self.lookup_ttl_seconds)
    }

    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_seconds)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,
    pub connection_timeout_seconds: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: defaults::REDIS_URL.to_string(),
            connection_timeout_seconds: 5,
        }
    }
}

impl RedisConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MokaConfig {
    /// Bound on cached lookup records; job records are bounded by TTL only
    pub max_capacity: u64,
}

impl Default for MokaConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
        }
    }
}

/// Background job settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Upper bound on concurrently executing jobs
    pub max_workers: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_workers: defaults::MAX_WORKERS,
        }
    }
}

/// Provider chain settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Return the placeholder record when every registry fails
    pub allow_mock_fallback: bool,
    /// Never touch the network; every lookup yields the placeholder record
    pub mock_only: bool,
    /// Registries in priority order
    pub registries: Vec<ProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            allow_mock_fallback: true,
            mock_only: false,
            registries: vec![ProviderConfig::publica_cnpj_ws(), ProviderConfig::brasilapi()],
        }
    }
}

/// One upstream registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub tag: String,
    /// GET target; `{cnpj}` is replaced with the canonical identifier
    pub url_template: String,
    pub timeout_ms: u64,
    #[serde(default)]
    pub mapping: FieldMapping,
}

impl ProviderConfig {
    pub fn publica_cnpj_ws() -> Self {
        Self {
            tag: providers::PUBLICA_CNPJ_WS.to_string(),
            url_template: providers::PUBLICA_CNPJ_WS_URL.to_string(),
            timeout_ms: defaults::PRIMARY_TIMEOUT_MS,
            mapping: FieldMapping::publica_cnpj_ws(),
        }
    }

    pub fn brasilapi() -> Self {
        Self {
            tag: providers::BRASILAPI.to_string(),
            url_template: providers::BRASILAPI_URL.to_string(),
            timeout_ms: defaults::FALLBACK_TIMEOUT_MS,
            mapping: FieldMapping::brasilapi(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Circuit breaker settings keyed by component (`cache` or a provider tag)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub enabled: bool,
    pub default_config: CircuitBreakerComponentConfig,
    pub component_configs: HashMap<String, CircuitBreakerComponentConfig>,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        let mut component_configs = HashMap::new();
        component_configs.insert(
            "cache".to_string(),
            CircuitBreakerComponentConfig {
                failure_threshold: 3,
                timeout_seconds: 15,
                success_threshold: 1,
            },
        );

        Self {
            enabled: true,
            default_config: CircuitBreakerComponentConfig::default(),
            component_configs,
        }
    }
}

impl CircuitBreakerSettings {
    pub fn config_for_component(&self, component_name: &str) -> CircuitBreakerComponentConfig {
        self.component_configs
            .get(component_name)
            .cloned()
            .unwrap_or_else(|| self.default_config.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerComponentConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerComponentConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout_seconds: 30,
            success_threshold: 2,
        }
    }
}

impl CircuitBreakerComponentConfig {
    pub fn to_resilience_config(&self) -> crate::resilience::CircuitBreakerConfig {
        crate::resilience::CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            timeout: Duration::from_secs(self.timeout_seconds),
            success_threshold: self.success_threshold,
        }
    }
}

impl LookupConfig {
    /// Configuration suited to tests: in-process store, no registries, mock allowed
    pub fn for_testing() -> Self {
        Self {
            cache: CacheConfig::in_memory(),
            providers: ProvidersConfig {
                registries: Vec::new(),
                ..ProvidersConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate configuration for consistency and required fields
    pub fn validate(&self) -> ConfigResult<()> {
        if self.cache.lookup_ttl_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "cache.lookup_ttl_seconds",
                "0",
                "lookup TTL must be greater than 0",
            ));
        }

        if self.cache.job_ttl_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "cache.job_ttl_seconds",
                "0",
                "job TTL must be greater than 0",
            ));
        }

        if self.cache.operation_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "cache.operation_timeout_ms",
                "0",
                "store operation timeout must be greater than 0",
            ));
        }

        if self.jobs.max_workers == 0 {
            return Err(ConfigurationError::invalid_value(
                "jobs.max_workers",
                "0",
                "at least one worker is required",
            ));
        }

        let mut seen = HashSet::new();
        for (index, registry) in self.providers.registries.iter().enumerate() {
            if registry.tag.trim().is_empty() {
                return Err(ConfigurationError::missing_required_field(
                    format!("providers.registries[{index}].tag"),
                    "provider configuration",
                ));
            }

            if !seen.insert(registry.tag.as_str()) {
                return Err(ConfigurationError::invalid_value(
                    format!("providers.registries[{index}].tag"),
                    &registry.tag,
                    "provider tags must be unique",
                ));
            }

            if !registry.url_template.contains(providers::IDENTIFIER_PLACEHOLDER) {
                return Err(ConfigurationError::invalid_value(
                    format!("providers.registries[{index}].url_template"),
                    &registry.url_template,
                    format!(
                        "URL template must contain the {} placeholder",
                        providers::IDENTIFIER_PLACEHOLDER
                    ),
                ));
            }

            if registry.timeout_ms == 0 {
                return Err(ConfigurationError::invalid_value(
                    format!("providers.registries[{index}].timeout_ms"),
                    "0",
                    "provider timeout must be greater than 0",
                ));
            }
        }

        if self.providers.registries.is_empty()
            && !self.providers.allow_mock_fallback
            && !self.providers.mock_only
        {
            return Err(ConfigurationError::missing_required_field(
                "providers.registries",
                "no registries configured and mock fallback disabled",
            ));
        }

        if self.circuit_breakers.enabled {
            let components = std::iter::once(&self.circuit_breakers.default_config)
                .chain(self.circuit_breakers.component_configs.values());
            for component in components {
                component
                    .to_resilience_config()
                    .validate()
                    .map_err(|reason| {
                        ConfigurationError::invalid_value(
                            "circuit_breakers",
                            format!("{component:?}"),
                            reason,
                        )
                    })?;
            }
        }

        Ok(())
    }
}

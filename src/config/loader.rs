//! Configuration Loader
//!
//! Layers built-in defaults, an optional TOML file and `VERIGOV_*` environment
//! overrides using the `config` crate, then validates the result.

use super::error::{ConfigResult, ConfigurationError};
use super::LookupConfig;
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Prefix for environment overrides (`VERIGOV_JOBS__MAX_WORKERS=4`)
pub const ENV_PREFIX: &str = "VERIGOV";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "VERIGOV_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "config/verigov.toml";

/// Loads [`LookupConfig`] from layered sources
#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the default file location and the environment
    pub fn load() -> ConfigResult<LookupConfig> {
        Self::load_from(None)
    }

    /// Load configuration with an explicit file path
    ///
    /// Without a path, `VERIGOV_CONFIG` is consulted, then
    /// `config/verigov.toml`. A missing default file is not an error; a
    /// missing explicit file is.
    pub fn load_from(path: Option<&Path>) -> ConfigResult<LookupConfig> {
        let environment = Self::detect_environment();
        let (config_path, required) = Self::resolve_config_path(path);

        debug!(
            environment = %environment,
            config_path = %config_path.display(),
            required = required,
            "Loading lookup configuration"
        );

        if required && !config_path.exists() {
            return Err(ConfigurationError::load_error(
                config_path.display().to_string(),
                "configuration file not found",
            ));
        }

        let source_name = config_path.display().to_string();
        let layered = Config::builder()
            .add_source(
                File::from(config_path.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigurationError::load_error(&source_name, e))?;

        let config: LookupConfig =
            layered
                .try_deserialize()
                .map_err(|e| ConfigurationError::DeserializeError {
                    error: e.to_string(),
                })?;

        config.validate()?;

        info!(
            environment = %environment,
            cache_backend = %config.cache.backend,
            cache_enabled = config.cache.enabled,
            max_workers = config.jobs.max_workers,
            registries = config.providers.registries.len(),
            mock_only = config.providers.mock_only,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Detect the deployment environment (`VERIGOV_ENV`, then `APP_ENV`)
    pub fn detect_environment() -> String {
        env::var("VERIGOV_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn resolve_config_path(explicit: Option<&Path>) -> (PathBuf, bool) {
        if let Some(path) = explicit {
            return (path.to_path_buf(), true);
        }

        match env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => (PathBuf::from(path), true),
            _ => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        }
    }
}

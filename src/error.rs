//! Error types for the lookup core.
//!

use crate::cache::CacheError;
use crate::config::ConfigurationError;
use crate::providers::ProviderFailure;
use thiserror::Error;

/// Terminal errors surfaced to callers of [`crate::lookup::LookupService`].
///
/// Per-provider failures and store failures are recovered locally and never
/// reach this type directly; they only appear as the `last_failure` of an
/// [`LookupError::UpstreamUnavailable`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    /// Caller error: the identifier does not normalize to 14 digits
    #[error("Invalid identifier '{input}': {reason}")]
    InvalidIdentifier { input: String, reason: String },

    /// Every provider failed and the mock fallback is disallowed
    #[error("Upstream registries unavailable for {identifier} after {attempts} attempt(s){}", describe_last(.last_failure))]
    UpstreamUnavailable {
        identifier: String,
        attempts: usize,
        last_failure: Option<ProviderFailure>,
    },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LookupError {
    pub fn invalid_identifier(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Caller errors are never worth retrying
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidIdentifier { .. })
    }

    /// Short label used for metrics and job error classification
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::ConfigurationError(_) => "configuration",
            Self::CacheError(_) => "cache",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<ConfigurationError> for LookupError {
    fn from(error: ConfigurationError) -> Self {
        LookupError::ConfigurationError(error.to_string())
    }
}

impl From<CacheError> for LookupError {
    fn from(error: CacheError) -> Self {
        LookupError::CacheError(error.to_string())
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(error: serde_json::Error) -> Self {
        LookupError::Internal(format!("JSON serialization error: {error}"))
    }
}

fn describe_last(last_failure: &Option<ProviderFailure>) -> String {
    last_failure
        .as_ref()
        .map(|failure| format!(": {failure}"))
        .unwrap_or_default()
}

pub type LookupResult<T> = std::result::Result<T, LookupError>;

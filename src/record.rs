//! Canonical lookup record and its provenance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{registry_status, MOCK_SOURCE_TAG};

/// Which provider produced a record
///
/// Serialized as a plain string: the provider tag, or `"mock"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordSource {
    /// A live upstream registry, identified by its configured tag
    Provider(String),
    /// Synthetic placeholder produced when every provider failed
    Mock,
}

impl RecordSource {
    pub fn provider(tag: impl Into<String>) -> Self {
        Self::Provider(tag.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Provider(tag) => tag,
            Self::Mock => MOCK_SOURCE_TAG,
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Self::Mock)
    }
}

impl From<String> for RecordSource {
    fn from(value: String) -> Self {
        if value == MOCK_SOURCE_TAG {
            Self::Mock
        } else {
            Self::Provider(value)
        }
    }
}

impl From<RecordSource> for String {
    fn from(value: RecordSource) -> Self {
        match value {
            RecordSource::Provider(tag) => tag,
            RecordSource::Mock => MOCK_SOURCE_TAG.to_string(),
        }
    }
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized result of a registry lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Canonical 14-digit identifier
    pub identifier: String,
    pub legal_name: Option<String>,
    /// Controlled vocabulary where recognized, verbatim otherwise
    pub status: String,
    /// ISO date
    pub registered_since: Option<String>,
    pub retrieved_at: DateTime<Utc>,
    pub source: RecordSource,
    /// Untouched upstream payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

impl CanonicalRecord {
    /// Derive the report summary consumed by the surrounding application
    pub fn summary(&self) -> LookupSummary {
        LookupSummary {
            status: self.status.clone(),
            legal_name: self.legal_name.clone(),
            document: self.identifier.clone(),
            snapshot_at: self.retrieved_at,
        }
    }
}

/// Compact view of a record used when building compliance reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupSummary {
    pub status: String,
    pub legal_name: Option<String>,
    pub document: String,
    pub snapshot_at: DateTime<Utc>,
}

/// Map a registry status to the controlled vocabulary
///
/// Accepts the registry's numeric codes and case/whitespace variants of the
/// textual labels. Anything unrecognized is passed through verbatim; a
/// missing or blank status becomes [`registry_status::UNDEFINED`].
pub fn normalize_status(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return registry_status::UNDEFINED.to_string();
    };

    let mapped = match raw.to_uppercase().as_str() {
        "1" | "01" | "NULA" => Some(registry_status::NULL),
        "2" | "02" | "ATIVA" => Some(registry_status::ACTIVE),
        "3" | "03" | "SUSPENSA" => Some(registry_status::SUSPENDED),
        "4" | "04" | "INAPTA" => Some(registry_status::UNFIT),
        "8" | "08" | "BAIXADA" => Some(registry_status::CLOSED),
        _ => None,
    };

    mapped.map(str::to_string).unwrap_or_else(|| raw.to_string())
}

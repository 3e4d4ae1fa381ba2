//! Response mapping from a registry's JSON body to a [`CanonicalRecord`].
//!
//! Each canonical field lists candidate locations in the body, tried in order;
//! the first non-null, non-blank value wins. Locations are JSON pointers
//! (`/estabelecimento/situacao_cadastral`) or dotted paths
//! (`estabelecimento.situacao_cadastral`), so mappings read naturally in TOML.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ProviderFailure;
use crate::identifier::Cnpj;
use crate::record::{normalize_status, CanonicalRecord, RecordSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub legal_name: Vec<String>,
    pub status: Vec<String>,
    pub registered_since: Vec<String>,
}

/// Covers both built-in registry layouts
impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            legal_name: paths(&["/razao_social", "/nome"]),
            status: paths(&[
                "/estabelecimento/situacao_cadastral",
                "/descricao_situacao_cadastral",
                "/situacao_cadastral",
                "/situacao",
            ]),
            registered_since: paths(&[
                "/estabelecimento/data_inicio_atividade",
                "/data_inicio_atividade",
                "/abertura",
            ]),
        }
    }
}

impl FieldMapping {
    /// publica.cnpj.ws nests establishment data under `estabelecimento`
    pub fn publica_cnpj_ws() -> Self {
        Self {
            legal_name: paths(&["/razao_social"]),
            status: paths(&["/estabelecimento/situacao_cadastral"]),
            registered_since: paths(&["/estabelecimento/data_inicio_atividade"]),
        }
    }

    /// BrasilAPI is flat; prefer the textual status over the numeric code
    pub fn brasilapi() -> Self {
        Self {
            legal_name: paths(&["/razao_social"]),
            status: paths(&["/descricao_situacao_cadastral", "/situacao_cadastral"]),
            registered_since: paths(&["/data_inicio_atividade"]),
        }
    }

    /// Build the canonical record for `identifier` from a registry body
    ///
    /// The identifier always comes from the request, never from the body.
    pub fn map_record(
        &self,
        identifier: &Cnpj,
        provider: &str,
        body: Value,
    ) -> Result<CanonicalRecord, ProviderFailure> {
        if !body.is_object() {
            return Err(ProviderFailure::MalformedBody {
                provider: provider.to_string(),
                message: format!("expected a JSON object, got {}", json_kind(&body)),
            });
        }

        let legal_name = first_text(&body, &self.legal_name);
        let status = normalize_status(first_text(&body, &self.status).as_deref());
        let registered_since = first_text(&body, &self.registered_since).map(iso_date);

        Ok(CanonicalRecord {
            identifier: identifier.to_string(),
            legal_name,
            status,
            registered_since,
            retrieved_at: Utc::now(),
            source: RecordSource::provider(provider),
            raw: Some(body),
        })
    }
}

fn paths(items: &[&str]) -> Vec<String> {
    items.iter().map(|p| p.to_string()).collect()
}

fn first_text(body: &Value, candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|path| lookup(body, path))
        .find_map(as_text)
}

fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    if path.starts_with('/') {
        body.pointer(path)
    } else {
        path.split('.')
            .try_fold(body, |value, segment| value.get(segment))
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Trim timestamps such as `2012-05-14T00:00:00Z` to the date; leave other text alone
fn iso_date(raw: String) -> String {
    match raw.get(..10).map(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d")) {
        Some(Ok(date)) => date.format("%Y-%m-%d").to_string(),
        _ => raw,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! Namespaced store keys
//!
//! Lookups and jobs share one store; the namespace prefix keeps them apart.

use crate::constants::namespaces;
use crate::identifier::Cnpj;

/// `lookup:<14 digits>`
pub fn lookup_key(identifier: &Cnpj) -> String {
    format!("{}:{}", namespaces::LOOKUP, identifier)
}

/// `job:<job id>`
pub fn job_key(job_id: &str) -> String {
    format!("{}:{}", namespaces::JOB, job_id)
}

//! # System Constants
//!
//! Fixed values that define the operational boundaries of the lookup core:
//! cache key namespaces, default TTLs, provider tags and the registry status
//! vocabulary.

use std::time::Duration;

/// Source tag carried by synthetic placeholder records
pub const MOCK_SOURCE_TAG: &str = "mock";

/// Cache key namespaces; lookups and jobs share one store
pub mod namespaces {
    pub const LOOKUP: &str = "lookup";
    pub const JOB: &str = "job";
}

/// Built-in upstream registries
pub mod providers {
    pub const PUBLICA_CNPJ_WS: &str = "publica.cnpj.ws";
    pub const PUBLICA_CNPJ_WS_URL: &str = "https://publica.cnpj.ws/cnpj/{cnpj}";
    pub const BRASILAPI: &str = "brasilapi";
    pub const BRASILAPI_URL: &str = "https://brasilapi.com.br/api/cnpj/v1/{cnpj}";

    /// Placeholder substituted with the canonical identifier
    pub const IDENTIFIER_PLACEHOLDER: &str = "{cnpj}";

    pub const USER_AGENT: &str = concat!("verigov-lookup/", env!("CARGO_PKG_VERSION"));
}

/// Controlled vocabulary for registry status
pub mod registry_status {
    pub const ACTIVE: &str = "ATIVA";
    pub const SUSPENDED: &str = "SUSPENSA";
    pub const UNFIT: &str = "INAPTA";
    pub const CLOSED: &str = "BAIXADA";
    pub const NULL: &str = "NULA";
    pub const UNDEFINED: &str = "INDEFINIDO";
}

/// Placeholder values used by the mock fallback record
pub mod mock_values {
    pub const LEGAL_NAME: &str = "ACME TECNOLOGIA LTDA";
    pub const STATUS: &str = super::registry_status::ACTIVE;
    pub const REGISTERED_SINCE: &str = "2012-05-14";
}

pub mod defaults {
    use super::Duration;

    pub const LOOKUP_TTL: Duration = Duration::from_secs(24 * 3600);
    pub const JOB_TTL: Duration = Duration::from_secs(6 * 3600);
    pub const MAX_WORKERS: usize = 2;
    pub const PRIMARY_TIMEOUT_MS: u64 = 5_000;
    pub const FALLBACK_TIMEOUT_MS: u64 = 15_000;
    pub const REDIS_URL: &str = "redis://localhost:6379";
}

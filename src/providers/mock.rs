//! Placeholder record returned when every registry fails and mock fallback
//! is allowed, or unconditionally in mock-only mode.

use chrono::Utc;

use crate::constants::mock_values;
use crate::identifier::Cnpj;
use crate::record::{CanonicalRecord, RecordSource};

/// Fixed placeholder for `identifier`, tagged with the `mock` source
pub fn mock_record(identifier: &Cnpj) -> CanonicalRecord {
    CanonicalRecord {
        identifier: identifier.to_string(),
        legal_name: Some(mock_values::LEGAL_NAME.to_string()),
        status: mock_values::STATUS.to_string(),
        registered_since: Some(mock_values::REGISTERED_SINCE.to_string()),
        retrieved_at: Utc::now(),
        source: RecordSource::Mock,
        raw: None,
    }
}

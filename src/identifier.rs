//! # CNPJ Identifier Normalization
//!
//! Canonicalizes raw entity identifiers into the fixed 14-digit form used as
//! the cache key and the cross-provider join key. The surrounding application
//! validates input with the same function, so both sides always agree on the
//! cache key.

use crate::error::{LookupError, LookupResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of digits in a canonical CNPJ
pub const CANONICAL_LENGTH: usize = 14;

/// Strip every non-digit character and require exactly [`CANONICAL_LENGTH`] digits.
///
/// ```
/// use verigov_lookup::identifier::normalize_cnpj;
///
/// assert_eq!(normalize_cnpj("12.345.678/0001-90").unwrap(), "12345678000190");
/// assert!(normalize_cnpj("1234").is_err());
/// ```
pub fn normalize_cnpj(raw: &str) -> LookupResult<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.len() != CANONICAL_LENGTH {
        return Err(LookupError::invalid_identifier(
            raw,
            format!(
                "CNPJ must have {CANONICAL_LENGTH} digits, found {}",
                digits.len()
            ),
        ));
    }

    Ok(digits)
}

/// A validated, canonical CNPJ
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cnpj(String);

impl Cnpj {
    /// Parse and canonicalize a raw identifier
    pub fn parse(raw: &str) -> LookupResult<Self> {
        normalize_cnpj(raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable form: `12.345.678/0001-90`
    pub fn formatted(&self) -> String {
        let d = &self.0;
        format!(
            "{}.{}.{}/{}-{}",
            &d[0..2],
            &d[2..5],
            &d[5..8],
            &d[8..12],
            &d[12..14]
        )
    }
}

impl fmt::Display for Cnpj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Cnpj {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Cnpj {
    type Error = LookupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cnpj> for String {
    fn from(value: Cnpj) -> Self {
        value.0
    }
}

impl AsRef<str> for Cnpj {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

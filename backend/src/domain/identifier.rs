//! Drug lookup identifiers and their provenance.
//!
//! Both ledger-issued transaction hashes and locally derived content hashes
//! share one canonical shape: `0x` followed by 64 lower-case hex digits.
//! Callers may submit identifiers with or without the prefix and in any case;
//! parsing conforms them before any I/O happens.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of hex digits in a 32-byte digest.
pub const IDENTIFIER_HEX_LEN: usize = 64;

const PREFIX: &str = "0x";

/// Validation errors returned by [`DrugIdentifier::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrugIdentifierValidationError {
    Empty,
    Malformed,
}

impl fmt::Display for DrugIdentifierValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "identifier must not be empty"),
            Self::Malformed => write!(
                f,
                "identifier must be {IDENTIFIER_HEX_LEN} hexadecimal digits, optionally prefixed with 0x",
            ),
        }
    }
}

impl std::error::Error for DrugIdentifierValidationError {}

/// Canonical drug identifier.
///
/// # Examples
/// ```
/// use medverify::domain::DrugIdentifier;
///
/// let raw = "AB".repeat(32);
/// let id = DrugIdentifier::parse(&raw).expect("valid identifier");
/// assert_eq!(id.as_ref(), format!("0x{}", "ab".repeat(32)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DrugIdentifier(String);

impl DrugIdentifier {
    /// Validate and normalise a raw identifier.
    pub fn parse(raw: &str) -> Result<Self, DrugIdentifierValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DrugIdentifierValidationError::Empty);
        }
        let digits = trimmed
            .strip_prefix(PREFIX)
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() != IDENTIFIER_HEX_LEN || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DrugIdentifierValidationError::Malformed);
        }
        Ok(Self(format!("{PREFIX}{}", digits.to_ascii_lowercase())))
    }

    /// Build an identifier from a raw 32-byte digest.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(format!("{PREFIX}{}", hex::encode(digest)))
    }
}

impl AsRef<str> for DrugIdentifier {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DrugIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DrugIdentifier> for String {
    fn from(value: DrugIdentifier) -> Self {
        value.0
    }
}

impl TryFrom<String> for DrugIdentifier {
    type Error = DrugIdentifierValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Where a registration's identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierOrigin {
    /// Issued by a confirmed ledger transaction.
    Ledger,
    /// Derived locally from the drug's descriptive fields.
    Fallback,
}

impl IdentifierOrigin {
    /// Stable lower-case label used in logs and responses.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ledger => "ledger",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for IdentifierOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which system answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LookupSource {
    Ledger,
    Store,
}

impl fmt::Display for LookupSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ledger => "ledger",
            Self::Store => "store",
        })
    }
}

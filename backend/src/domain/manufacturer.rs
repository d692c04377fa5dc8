//! Manufacturer accounts.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng as _;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CredentialHash;

const GOV_CODE_PREFIX: &str = "MED-";
const GOV_CODE_SUFFIX_LEN: usize = 5;
const GOV_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Validation errors for manufacturer fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManufacturerValidationError {
    InvalidId,
    EmptyName,
    InvalidEmail,
    EmptyLicenseNumber,
    InvalidGovCode,
}

impl fmt::Display for ManufacturerValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "manufacturer id must be a valid UUID"),
            Self::EmptyName => write!(f, "manufacturer name must not be empty"),
            Self::InvalidEmail => write!(f, "email address is invalid"),
            Self::EmptyLicenseNumber => write!(f, "license number must not be empty"),
            Self::InvalidGovCode => write!(
                f,
                "government code must be {GOV_CODE_PREFIX} followed by {GOV_CODE_SUFFIX_LEN} upper-case letters or digits",
            ),
        }
    }
}

impl std::error::Error for ManufacturerValidationError {}

/// Stable manufacturer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManufacturerId(Uuid);

impl ManufacturerId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ManufacturerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ManufacturerId {
    type Err = ManufacturerValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ManufacturerValidationError::InvalidId)
    }
}

/// Government registration code, `MED-` followed by five upper-case
/// alphanumerics. Assigned once and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GovCode(String);

impl GovCode {
    /// Generate a fresh random code.
    ///
    /// # Examples
    /// ```
    /// use medverify::domain::GovCode;
    ///
    /// let code = GovCode::generate();
    /// assert!(code.as_ref().starts_with("MED-"));
    /// assert!(GovCode::new(code.as_ref()).is_ok());
    /// ```
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..GOV_CODE_SUFFIX_LEN)
            .map(|_| {
                let pick = rng.gen_range(0..GOV_CODE_ALPHABET.len());
                GOV_CODE_ALPHABET.get(pick).copied().map_or('A', char::from)
            })
            .collect();
        Self(format!("{GOV_CODE_PREFIX}{suffix}"))
    }

    pub fn new(code: impl Into<String>) -> Result<Self, ManufacturerValidationError> {
        let code = code.into();
        let valid = code.strip_prefix(GOV_CODE_PREFIX).is_some_and(|suffix| {
            suffix.len() == GOV_CODE_SUFFIX_LEN
                && suffix
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        });
        if valid {
            Ok(Self(code))
        } else {
            Err(ManufacturerValidationError::InvalidGovCode)
        }
    }
}

impl AsRef<str> for GovCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for GovCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<GovCode> for String {
    fn from(value: GovCode) -> Self {
        value.0
    }
}

impl TryFrom<String> for GovCode {
    type Error = ManufacturerValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Input for creating a manufacturer account.
#[derive(Debug, Clone)]
pub struct ManufacturerDraft {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub license_number: String,
    pub gov_code: Option<GovCode>,
}

impl ManufacturerDraft {
    pub fn validate(&self) -> Result<(), ManufacturerValidationError> {
        if self.name.trim().is_empty() {
            return Err(ManufacturerValidationError::EmptyName);
        }
        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !well_formed {
            return Err(ManufacturerValidationError::InvalidEmail);
        }
        if self.license_number.trim().is_empty() {
            return Err(ManufacturerValidationError::EmptyLicenseNumber);
        }
        Ok(())
    }
}

/// Persisted manufacturer account.
///
/// ## Invariants
/// - `email`, `gov_code`, and `license_number` are unique across accounts.
/// - `is_verified` only moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manufacturer {
    pub id: ManufacturerId,
    pub name: String,
    pub email: String,
    pub credential: CredentialHash,
    pub gov_code: GovCode,
    pub phone: Option<String>,
    pub license_number: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

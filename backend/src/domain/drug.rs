//! Drug batch data model.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DrugIdentifier, ManufacturerId};

/// Maximum length, in characters, of a drug name or batch code.
pub const DRUG_FIELD_MAX: usize = 100;

/// Validation errors for drug submission fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrugValidationError {
    EmptyName,
    NameTooLong { max: usize },
    EmptyBatch,
    BatchTooLong { max: usize },
    EmptyManufacturerName,
}

impl fmt::Display for DrugValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "drug name must not be empty"),
            Self::NameTooLong { max } => write!(f, "drug name must be at most {max} characters"),
            Self::EmptyBatch => write!(f, "batch must not be empty"),
            Self::BatchTooLong { max } => write!(f, "batch must be at most {max} characters"),
            Self::EmptyManufacturerName => write!(f, "manufacturer name must not be empty"),
        }
    }
}

impl std::error::Error for DrugValidationError {}

fn bounded(
    value: String,
    empty: DrugValidationError,
    too_long: DrugValidationError,
) -> Result<String, DrugValidationError> {
    if value.trim().is_empty() {
        return Err(empty);
    }
    if value.chars().count() > DRUG_FIELD_MAX {
        return Err(too_long);
    }
    Ok(value)
}

/// Trade name of a drug, as entered by the manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DrugName(String);

impl DrugName {
    pub fn new(name: impl Into<String>) -> Result<Self, DrugValidationError> {
        bounded(
            name.into(),
            DrugValidationError::EmptyName,
            DrugValidationError::NameTooLong {
                max: DRUG_FIELD_MAX,
            },
        )
        .map(Self)
    }
}

/// Manufacturer-assigned batch code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BatchCode(String);

impl BatchCode {
    pub fn new(batch: impl Into<String>) -> Result<Self, DrugValidationError> {
        bounded(
            batch.into(),
            DrugValidationError::EmptyBatch,
            DrugValidationError::BatchTooLong {
                max: DRUG_FIELD_MAX,
            },
        )
        .map(Self)
    }
}

macro_rules! string_newtype_conversions {
    ($($ty:ident),*) => {
        $(
            impl AsRef<str> for $ty {
                fn as_ref(&self) -> &str {
                    self.0.as_str()
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_ref())
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.0
                }
            }

            impl TryFrom<String> for $ty {
                type Error = DrugValidationError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    Self::new(value)
                }
            }
        )*
    };
}

string_newtype_conversions!(DrugName, BatchCode);

/// Calendar expiry date of a batch.
///
/// The ledger and the fallback digest both carry expiry as whole seconds
/// since the Unix epoch at UTC midnight of this date.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use medverify::domain::ExpiryDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date");
/// assert_eq!(ExpiryDate::new(date).timestamp(), 1_735_689_600);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpiryDate(NaiveDate);

impl ExpiryDate {
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Interpret a Unix timestamp, flooring to the UTC calendar day.
    pub fn from_timestamp(seconds: i64) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0).map(|moment| Self(moment.date_naive()))
    }

    pub fn timestamp(self) -> i64 {
        self.0.and_time(NaiveTime::MIN).and_utc().timestamp()
    }

    pub const fn date(self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for ExpiryDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl fmt::Display for ExpiryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Descriptive fields of a registration, as sent to the ledger and hashed
/// by the fallback deriver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugSubmission {
    name: DrugName,
    batch: BatchCode,
    manufacturer_name: String,
    expiry: ExpiryDate,
}

impl DrugSubmission {
    pub fn new(
        name: DrugName,
        batch: BatchCode,
        manufacturer_name: impl Into<String>,
        expiry: ExpiryDate,
    ) -> Result<Self, DrugValidationError> {
        let manufacturer_name = manufacturer_name.into();
        if manufacturer_name.trim().is_empty() {
            return Err(DrugValidationError::EmptyManufacturerName);
        }
        Ok(Self {
            name,
            batch,
            manufacturer_name,
            expiry,
        })
    }

    pub fn name(&self) -> &DrugName {
        &self.name
    }

    pub fn batch(&self) -> &BatchCode {
        &self.batch
    }

    pub fn manufacturer_name(&self) -> &str {
        self.manufacturer_name.as_str()
    }

    pub fn expiry(&self) -> ExpiryDate {
        self.expiry
    }
}

/// Row to be inserted into the authoritative store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrugRecord {
    pub identifier: DrugIdentifier,
    pub name: DrugName,
    pub batch: BatchCode,
    pub manufacturer_id: ManufacturerId,
    pub expiry: ExpiryDate,
}

/// Persisted drug registration.
///
/// ## Invariants
/// - `identifier` is unique and never changes after insert.
/// - `verification_artifact` is the only field written after insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugRecord {
    pub identifier: DrugIdentifier,
    pub name: String,
    pub batch: String,
    pub manufacturer_id: ManufacturerId,
    pub manufacturer_name: String,
    pub expiry: ExpiryDate,
    pub verification_artifact: Option<String>,
    pub created_at: DateTime<Utc>,
}

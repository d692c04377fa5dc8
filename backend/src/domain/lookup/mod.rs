//! Public drug lookup across the ledger and the authoritative store.
//!
//! The ledger is consulted first, but the store is always consulted too and
//! wins field by field wherever it has a value. Identifiers are validated
//! before either is touched.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::ledger_policy::{LedgerFailureKind, LookupDisposition, lookup_disposition};
use super::ports::{
    DrugRepository, DrugRepositoryError, DrugVerification, LedgerClient, LedgerDrug, LedgerError,
};
use super::{
    DrugIdentifier, DrugIdentifierValidationError, DrugRecord, Error, ExpiryDate, LookupSource,
};

/// Message used whenever neither source knows the identifier.
pub const NOT_FOUND_MESSAGE: &str = "no medicine found for the given identifier";

/// Merged view of one drug as shown to the public.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResult {
    pub name: String,
    pub batch: String,
    pub manufacturer_name: String,
    pub expiry: ExpiryDate,
    pub identifier: DrugIdentifier,
    pub source: LookupSource,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(DrugIdentifierValidationError),
    #[error("{NOT_FOUND_MESSAGE}")]
    NotFound,
    #[error(transparent)]
    Ledger(LedgerError),
    #[error(transparent)]
    Store(DrugRepositoryError),
}

impl From<LookupError> for Error {
    fn from(value: LookupError) -> Self {
        match value {
            LookupError::InvalidIdentifier(err) => Self::invalid_request(err.to_string()),
            LookupError::NotFound => Self::not_found(NOT_FOUND_MESSAGE),
            LookupError::Ledger(err) => Self::service_unavailable(err.to_string()),
            LookupError::Store(DrugRepositoryError::Connection { message }) => {
                Self::service_unavailable(format!("store unavailable: {message}"))
            }
            LookupError::Store(err) => Self::internal(err.to_string()),
        }
    }
}

/// Field set used for the overlay; `None` means the source had no value.
#[derive(Debug, Default)]
struct Fields {
    name: Option<String>,
    batch: Option<String>,
    manufacturer_name: Option<String>,
    expiry: Option<ExpiryDate>,
}

impl Fields {
    fn from_ledger(drug: LedgerDrug) -> Self {
        let expiry = ExpiryDate::from_timestamp(drug.expiry_timestamp);
        if expiry.is_none() {
            warn!(
                expiry_timestamp = drug.expiry_timestamp,
                "ledger expiry is out of range; ignoring it"
            );
        }
        Self {
            name: Some(drug.name),
            batch: Some(drug.batch),
            manufacturer_name: Some(drug.manufacturer_name),
            expiry,
        }
    }

    fn from_store(record: DrugRecord) -> Self {
        Self {
            name: Some(record.name),
            batch: Some(record.batch),
            manufacturer_name: Some(record.manufacturer_name),
            expiry: Some(record.expiry),
        }
    }

    /// Take each field from `winner` when present, else from `self`.
    fn overlaid_by(self, winner: Self) -> Self {
        Self {
            name: winner.name.or(self.name),
            batch: winner.batch.or(self.batch),
            manufacturer_name: winner.manufacturer_name.or(self.manufacturer_name),
            expiry: winner.expiry.or(self.expiry),
        }
    }

    fn complete(self, identifier: DrugIdentifier, source: LookupSource) -> Option<LookupResult> {
        Some(LookupResult {
            name: self.name?,
            batch: self.batch?,
            manufacturer_name: self.manufacturer_name?,
            expiry: self.expiry?,
            identifier,
            source,
        })
    }
}

/// Lookup use-case behind the [`DrugVerification`] port.
#[derive(Clone)]
pub struct LookupReconciler {
    ledger: Arc<dyn LedgerClient>,
    drugs: Arc<dyn DrugRepository>,
}

impl LookupReconciler {
    pub fn new(ledger: Arc<dyn LedgerClient>, drugs: Arc<dyn DrugRepository>) -> Self {
        Self { ledger, drugs }
    }

    /// Resolve `raw` to a merged drug view.
    ///
    /// # Errors
    ///
    /// - [`LookupError::InvalidIdentifier`] for empty or malformed input,
    ///   raised before any I/O.
    /// - [`LookupError::NotFound`] when neither source has the record.
    /// - [`LookupError::Store`] when the store query fails.
    pub async fn lookup(&self, raw: &str) -> Result<LookupResult, LookupError> {
        let identifier = DrugIdentifier::parse(raw).map_err(LookupError::InvalidIdentifier)?;

        let ledger = self.fetch_from_ledger(&identifier).await?;
        let store = self
            .drugs
            .find_by_identifier(&identifier)
            .await
            .map_err(LookupError::Store)?;

        let source = if store.is_some() {
            LookupSource::Store
        } else {
            LookupSource::Ledger
        };
        if let (Some(on_ledger), Some(stored)) = (&ledger, &store) {
            if on_ledger.name != stored.name || on_ledger.batch != stored.batch {
                debug!(identifier = %identifier, "ledger and store disagree; store wins");
            }
        }

        let merged = ledger
            .map(Fields::from_ledger)
            .unwrap_or_default()
            .overlaid_by(store.map(Fields::from_store).unwrap_or_default());

        match merged.complete(identifier.clone(), source) {
            Some(result) => {
                info!(identifier = %identifier, source = %source, "lookup resolved");
                Ok(result)
            }
            None => {
                info!(identifier = %identifier, "lookup found no record");
                Err(LookupError::NotFound)
            }
        }
    }

    async fn fetch_from_ledger(
        &self,
        identifier: &DrugIdentifier,
    ) -> Result<Option<LedgerDrug>, LookupError> {
        match self.ledger.fetch(identifier).await {
            Ok(drug) => Ok(Some(drug)),
            Err(error) => {
                let kind = LedgerFailureKind::from(&error);
                match lookup_disposition(kind) {
                    LookupDisposition::Miss => {
                        debug!(identifier = %identifier, failure = %kind, "ledger miss");
                        Ok(None)
                    }
                    LookupDisposition::Propagate => Err(LookupError::Ledger(error)),
                }
            }
        }
    }
}

#[async_trait]
impl DrugVerification for LookupReconciler {
    async fn verify(&self, identifier: &str) -> Result<LookupResult, Error> {
        self.lookup(identifier).await.map_err(Error::from)
    }
}

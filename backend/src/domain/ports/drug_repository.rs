//! Port abstraction for the authoritative drug store.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{DrugIdentifier, DrugRecord, NewDrugRecord};

define_port_error! {
    /// Persistence errors raised by drug repository adapters.
    pub enum DrugRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "drug repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "drug repository query failed: {message}",
        /// A drug with the same identifier is already stored.
        Duplicate { identifier: String } =>
            "a drug with identifier {identifier} is already registered",
        /// The referenced manufacturer does not exist.
        UnknownManufacturer { manufacturer_id: String } =>
            "manufacturer {manufacturer_id} does not exist",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DrugRepository: Send + Sync {
    /// Insert a new record; the identifier must not already exist.
    async fn insert(&self, record: &NewDrugRecord) -> Result<DrugRecord, DrugRepositoryError>;

    async fn find_by_identifier(
        &self,
        identifier: &DrugIdentifier,
    ) -> Result<Option<DrugRecord>, DrugRepositoryError>;

    /// Attach an artifact if the record has none yet.
    ///
    /// Returns `false` when the record is missing or already carries one.
    async fn attach_verification_artifact(
        &self,
        identifier: &DrugIdentifier,
        artifact: &str,
    ) -> Result<bool, DrugRepositoryError>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<DrugRecord>, DrugRepositoryError>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, identifier: &DrugIdentifier) -> Result<bool, DrugRepositoryError>;
}

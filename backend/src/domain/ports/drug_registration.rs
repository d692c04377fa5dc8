//! Driving port for drug registration by an authenticated manufacturer.

use async_trait::async_trait;

use crate::domain::{
    BatchCode, DrugName, Error, ExpiryDate, ManufacturerId, RegistrationResult,
};

/// Validated registration input from an inbound adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugRegistrationRequest {
    pub manufacturer_id: ManufacturerId,
    pub name: DrugName,
    pub batch: BatchCode,
    pub expiry: ExpiryDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugRegistrationResponse {
    pub result: RegistrationResult,
    /// Public link encoded in the verification artifact.
    pub verification_url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DrugRegistration: Send + Sync {
    /// Register a batch and persist it, whichever identifier origin wins.
    async fn register(
        &self,
        request: &DrugRegistrationRequest,
    ) -> Result<DrugRegistrationResponse, Error>;
}

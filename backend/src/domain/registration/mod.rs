//! Drug registration: ledger-first identifier assignment with a
//! deterministic fallback, followed by an unconditional store write.
//!
//! [`RegistrationReconciler`] decides the identifier. It attempts exactly one
//! ledger submission and consults [`registration_disposition`] for any
//! failure; it never retries. [`DrugRegistrationService`] wraps it with the
//! manufacturer check, the store write, and the one-time verification
//! artifact.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::ledger_policy::{LedgerFailureKind, RegistrationDisposition, registration_disposition};
use super::ports::{
    DrugRegistration, DrugRegistrationRequest, DrugRegistrationResponse, DrugRepository,
    DrugRepositoryError, LedgerClient, LedgerError, LedgerReceipt, ManufacturerRepository,
    ManufacturerRepositoryError, VerificationArtifactGenerator,
};
use super::{
    DrugIdentifier, DrugSubmission, DrugValidationError, Error, IdentifierOrigin, NewDrugRecord,
    fallback_identifier,
};

/// Audit trail of a ledger transaction that was confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfirmation {
    pub confirmation_id: String,
    pub drug_id: Option<String>,
}

/// Identifier decision for one registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationResult {
    pub identifier: DrugIdentifier,
    pub origin: IdentifierOrigin,
    /// Present whenever the ledger confirmed, even if its identifier could
    /// not be used.
    pub ledger_confirmation: Option<LedgerConfirmation>,
}

/// Chooses between the ledger identifier and the derived one.
#[derive(Clone)]
pub struct RegistrationReconciler {
    ledger: Arc<dyn LedgerClient>,
}

impl RegistrationReconciler {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }

    /// Assign an identifier to `submission`.
    ///
    /// # Errors
    ///
    /// Returns the ledger error only when the disposition table says to
    /// propagate that failure kind.
    pub async fn reconcile(
        &self,
        submission: &DrugSubmission,
    ) -> Result<RegistrationResult, LedgerError> {
        match self.ledger.submit(submission).await {
            Ok(receipt) => Ok(Self::from_receipt(submission, receipt)),
            Err(error) => {
                let kind = LedgerFailureKind::from(&error);
                match registration_disposition(kind) {
                    RegistrationDisposition::Fallback => {
                        let identifier = fallback_identifier(submission);
                        warn!(
                            failure = %kind,
                            error = %error,
                            identifier = %identifier,
                            "ledger submission failed; using derived identifier"
                        );
                        Ok(RegistrationResult {
                            identifier,
                            origin: IdentifierOrigin::Fallback,
                            ledger_confirmation: None,
                        })
                    }
                    RegistrationDisposition::Propagate => Err(error),
                }
            }
        }
    }

    fn from_receipt(submission: &DrugSubmission, receipt: LedgerReceipt) -> RegistrationResult {
        let confirmed = DrugIdentifier::parse(&receipt.confirmation_id).ok();
        let confirmation = LedgerConfirmation {
            confirmation_id: receipt.confirmation_id,
            drug_id: receipt.drug_id,
        };

        match (confirmed, confirmation.drug_id.is_some()) {
            (Some(identifier), true) => {
                info!(
                    identifier = %identifier,
                    drug_id = confirmation.drug_id.as_deref().unwrap_or_default(),
                    "ledger confirmed registration"
                );
                RegistrationResult {
                    identifier,
                    origin: IdentifierOrigin::Ledger,
                    ledger_confirmation: Some(confirmation),
                }
            }
            _ => {
                let identifier = fallback_identifier(submission);
                warn!(
                    confirmation_id = %confirmation.confirmation_id,
                    identifier = %identifier,
                    "ledger confirmed without a usable identifier; using derived identifier"
                );
                RegistrationResult {
                    identifier,
                    origin: IdentifierOrigin::Fallback,
                    ledger_confirmation: Some(confirmation),
                }
            }
        }
    }
}

/// Failures surfaced by [`DrugRegistrationService`].
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("drug {identifier} is already registered")]
    StoreConstraintViolation { identifier: DrugIdentifier },
    #[error("manufacturer account not found")]
    UnknownManufacturer,
    #[error("manufacturer account is not verified")]
    UnverifiedManufacturer,
    #[error(transparent)]
    InvalidSubmission(DrugValidationError),
    #[error(transparent)]
    Ledger(LedgerError),
    #[error(transparent)]
    Store(DrugRepositoryError),
    #[error(transparent)]
    Manufacturers(ManufacturerRepositoryError),
}

impl From<RegistrationError> for Error {
    fn from(value: RegistrationError) -> Self {
        match value {
            RegistrationError::StoreConstraintViolation { identifier } => {
                Self::conflict("a medicine with this identifier is already registered")
                    .with_details(serde_json::json!({ "identifier": identifier.as_ref() }))
            }
            RegistrationError::UnknownManufacturer => {
                Self::unauthorized("manufacturer account not found")
            }
            RegistrationError::UnverifiedManufacturer => {
                Self::forbidden("manufacturer account is not verified")
            }
            RegistrationError::InvalidSubmission(err) => Self::invalid_request(err.to_string()),
            RegistrationError::Ledger(err) => Self::service_unavailable(err.to_string()),
            RegistrationError::Store(DrugRepositoryError::Connection { message })
            | RegistrationError::Manufacturers(ManufacturerRepositoryError::Connection {
                message,
            }) => Self::service_unavailable(format!("store unavailable: {message}")),
            RegistrationError::Store(err) => Self::internal(err.to_string()),
            RegistrationError::Manufacturers(err) => Self::internal(err.to_string()),
        }
    }
}

/// Registration use-case behind the [`DrugRegistration`] port.
#[derive(Clone)]
pub struct DrugRegistrationService {
    reconciler: RegistrationReconciler,
    drugs: Arc<dyn DrugRepository>,
    manufacturers: Arc<dyn ManufacturerRepository>,
    artifacts: Arc<dyn VerificationArtifactGenerator>,
}

impl DrugRegistrationService {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        drugs: Arc<dyn DrugRepository>,
        manufacturers: Arc<dyn ManufacturerRepository>,
        artifacts: Arc<dyn VerificationArtifactGenerator>,
    ) -> Self {
        Self {
            reconciler: RegistrationReconciler::new(ledger),
            drugs,
            manufacturers,
            artifacts,
        }
    }

    /// Register a batch on behalf of a manufacturer.
    ///
    /// The store is written in both the ledger and the fallback branch. No
    /// record is written when the manufacturer check or the insert fails.
    pub async fn register_drug(
        &self,
        request: &DrugRegistrationRequest,
    ) -> Result<DrugRegistrationResponse, RegistrationError> {
        let manufacturer = self
            .manufacturers
            .find_by_id(&request.manufacturer_id)
            .await
            .map_err(RegistrationError::Manufacturers)?
            .ok_or(RegistrationError::UnknownManufacturer)?;
        if !manufacturer.is_verified {
            return Err(RegistrationError::UnverifiedManufacturer);
        }

        let submission = DrugSubmission::new(
            request.name.clone(),
            request.batch.clone(),
            manufacturer.name,
            request.expiry,
        )
        .map_err(RegistrationError::InvalidSubmission)?;

        let result = self
            .reconciler
            .reconcile(&submission)
            .await
            .map_err(RegistrationError::Ledger)?;

        let record = NewDrugRecord {
            identifier: result.identifier.clone(),
            name: request.name.clone(),
            batch: request.batch.clone(),
            manufacturer_id: request.manufacturer_id,
            expiry: request.expiry,
        };
        self.drugs.insert(&record).await.map_err(|err| match err {
            DrugRepositoryError::Duplicate { .. } => RegistrationError::StoreConstraintViolation {
                identifier: result.identifier.clone(),
            },
            DrugRepositoryError::UnknownManufacturer { .. } => {
                RegistrationError::UnknownManufacturer
            }
            other => RegistrationError::Store(other),
        })?;
        info!(
            identifier = %result.identifier,
            origin = %result.origin,
            manufacturer_id = %request.manufacturer_id,
            "drug registered"
        );

        self.attach_artifact(&result.identifier).await;

        Ok(DrugRegistrationResponse {
            verification_url: self.artifacts.verification_url(&result.identifier),
            result,
        })
    }

    async fn attach_artifact(&self, identifier: &DrugIdentifier) {
        let artifact = match self.artifacts.generate(identifier).await {
            Ok(artifact) => artifact,
            Err(error) => {
                warn!(identifier = %identifier, error = %error, "verification artifact not generated");
                return;
            }
        };
        match self
            .drugs
            .attach_verification_artifact(identifier, &artifact.url)
            .await
        {
            Ok(true) => debug!(identifier = %identifier, "verification artifact attached"),
            Ok(false) => debug!(identifier = %identifier, "verification artifact already present"),
            Err(error) => {
                warn!(identifier = %identifier, error = %error, "verification artifact not stored");
            }
        }
    }
}

#[async_trait]
impl DrugRegistration for DrugRegistrationService {
    async fn register(
        &self,
        request: &DrugRegistrationRequest,
    ) -> Result<DrugRegistrationResponse, Error> {
        self.register_drug(request).await.map_err(Error::from)
    }
}

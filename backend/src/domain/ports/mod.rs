//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod drug_registration;
mod drug_repository;
mod drug_verification;
mod ledger_client;
mod manufacturer_login;
mod manufacturer_repository;
mod verification_artifacts;

#[cfg(test)]
pub use drug_registration::MockDrugRegistration;
pub use drug_registration::{
    DrugRegistration, DrugRegistrationRequest, DrugRegistrationResponse,
};
#[cfg(test)]
pub use drug_repository::MockDrugRepository;
pub use drug_repository::{DrugRepository, DrugRepositoryError};
#[cfg(test)]
pub use drug_verification::MockDrugVerification;
pub use drug_verification::DrugVerification;
#[cfg(test)]
pub use ledger_client::MockLedgerClient;
pub use ledger_client::{
    DisabledLedgerClient, LedgerClient, LedgerDrug, LedgerError, LedgerReceipt,
};
#[cfg(test)]
pub use manufacturer_login::MockManufacturerLogin;
pub use manufacturer_login::ManufacturerLogin;
#[cfg(test)]
pub use manufacturer_repository::MockManufacturerRepository;
pub use manufacturer_repository::{ManufacturerRepository, ManufacturerRepositoryError};
#[cfg(test)]
pub use verification_artifacts::MockVerificationArtifactGenerator;
pub use verification_artifacts::{
    ArtifactError, VerificationArtifact, VerificationArtifactGenerator,
};

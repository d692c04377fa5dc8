//! Domain primitives, use-cases, and ports.
//!
//! Purpose: define strongly typed domain entities and the reconciliation
//! logic that decides between the ledger and the authoritative store. Keep
//! transport and persistence concerns out of this module; adapters live under
//! `inbound` and `outbound`.
//!
//! Public surface:
//! - Error / ErrorCode (alias: `DomainError`) for transport-agnostic failures.
//! - DrugIdentifier, IdentifierOrigin, LookupSource for lookup keys.
//! - DrugSubmission, DrugRecord, ExpiryDate and friends for drug batches.
//! - Manufacturer, GovCode, CredentialHash, ManufacturerCredentials for
//!   accounts and login.
//! - RegistrationReconciler / DrugRegistrationService and LookupReconciler
//!   for the two core flows.
//! - TraceId for request correlation.

pub mod auth;
pub mod credential;
pub mod drug;
pub mod error;
pub mod fallback_identifier;
pub mod identifier;
pub mod ledger_policy;
pub mod login_service;
pub mod lookup;
pub mod manufacturer;
pub mod manufacturer_admin;
pub mod ports;
pub mod registration;
pub mod trace_id;

pub use self::auth::{LoginValidationError, ManufacturerCredentials};
pub use self::credential::{CredentialHash, CredentialHashError, DEFAULT_ITERATIONS};
pub use self::drug::{
    BatchCode, DRUG_FIELD_MAX, DrugName, DrugRecord, DrugSubmission, DrugValidationError,
    ExpiryDate, NewDrugRecord,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::fallback_identifier::{derive_fallback_digest, fallback_identifier};
pub use self::identifier::{
    DrugIdentifier, DrugIdentifierValidationError, IdentifierOrigin, LookupSource,
};
pub use self::login_service::ManufacturerLoginService;
pub use self::lookup::{LookupError, LookupReconciler, LookupResult, NOT_FOUND_MESSAGE};
pub use self::manufacturer::{
    GovCode, Manufacturer, ManufacturerDraft, ManufacturerId, ManufacturerValidationError,
};
pub use self::manufacturer_admin::ManufacturerAdminService;
pub use self::registration::{
    DrugRegistrationService, LedgerConfirmation, RegistrationError, RegistrationReconciler,
    RegistrationResult,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient alias for the domain error type.
pub type DomainError = Error;

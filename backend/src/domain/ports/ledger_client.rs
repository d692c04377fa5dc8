//! Port for the external drug registry ledger.
//!
//! `submit` changes external state irreversibly and is not idempotent: a
//! second call for the same drug creates a second ledger transaction.
//! Callers never retry it.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{DrugIdentifier, DrugSubmission};

define_port_error! {
    /// Failures raised by ledger adapters.
    pub enum LedgerError {
        /// The node could not be reached or answered with a transport error.
        Unavailable { message: String } => "ledger unavailable: {message}",
        /// The transaction was sent but not confirmed within the bound.
        Timeout { waited_ms: u64 } => "ledger confirmation timed out after {waited_ms} ms",
        /// The node or contract refused the transaction.
        Rejected { message: String } => "ledger rejected the transaction: {message}",
        /// No registration exists for the confirmation id.
        NotFound => "no ledger registration for the given confirmation id",
    }
}

/// Outcome of a confirmed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReceipt {
    /// Transaction hash as reported by the node.
    pub confirmation_id: String,
    /// Contract-issued drug id, when the registration event was emitted.
    pub drug_id: Option<String>,
}

/// Drug fields recorded on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerDrug {
    pub name: String,
    pub batch: String,
    pub manufacturer_name: String,
    pub expiry_timestamp: i64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Record a registration and wait, bounded, for its confirmation.
    async fn submit(&self, submission: &DrugSubmission) -> Result<LedgerReceipt, LedgerError>;

    /// Read a prior registration by its confirmation id.
    async fn fetch(&self, confirmation_id: &DrugIdentifier) -> Result<LedgerDrug, LedgerError>;
}

/// Ledger stand-in used when no node is configured.
///
/// Every call reports the ledger as unavailable, so registrations take the
/// fallback path and lookups are served from the store.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledLedgerClient;

#[async_trait]
impl LedgerClient for DisabledLedgerClient {
    async fn submit(&self, _submission: &DrugSubmission) -> Result<LedgerReceipt, LedgerError> {
        Err(LedgerError::unavailable("ledger integration is disabled"))
    }

    async fn fetch(&self, _confirmation_id: &DrugIdentifier) -> Result<LedgerDrug, LedgerError> {
        Err(LedgerError::unavailable("ledger integration is disabled"))
    }
}

//! Driving port for the public authenticity check.

use async_trait::async_trait;

use crate::domain::{Error, LookupResult};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DrugVerification: Send + Sync {
    /// Resolve a raw, caller-supplied identifier.
    ///
    /// Malformed input fails with `invalid_request` before any I/O; unknown
    /// identifiers fail with `not_found`.
    async fn verify(&self, identifier: &str) -> Result<LookupResult, Error>;
}

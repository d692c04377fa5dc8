//! Driving port for manufacturer authentication.
//!
//! Inbound adapters call this without importing persistence, so handler
//! tests can substitute a double.

use async_trait::async_trait;

use crate::domain::{Error, ManufacturerCredentials, ManufacturerId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManufacturerLogin: Send + Sync {
    /// Validate credentials for a verified manufacturer.
    async fn authenticate(
        &self,
        credentials: &ManufacturerCredentials,
    ) -> Result<ManufacturerId, Error>;
}

//! Port abstraction for manufacturer account persistence.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{Manufacturer, ManufacturerId};

define_port_error! {
    /// Persistence errors raised by manufacturer repository adapters.
    pub enum ManufacturerRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "manufacturer repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "manufacturer repository query failed: {message}",
        /// A unique column collided with an existing account.
        Duplicate { field: String } => "a manufacturer with this {field} already exists",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManufacturerRepository: Send + Sync {
    async fn insert(&self, manufacturer: &Manufacturer) -> Result<(), ManufacturerRepositoryError>;

    async fn find_by_id(
        &self,
        id: &ManufacturerId,
    ) -> Result<Option<Manufacturer>, ManufacturerRepositoryError>;

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Manufacturer>, ManufacturerRepositoryError>;

    /// Set the verified flag; returns `false` when the account is missing.
    async fn mark_verified(&self, id: &ManufacturerId) -> Result<bool, ManufacturerRepositoryError>;

    /// Delete the account together with every drug it registered.
    async fn delete(&self, id: &ManufacturerId) -> Result<bool, ManufacturerRepositoryError>;

    async fn list(&self) -> Result<Vec<Manufacturer>, ManufacturerRepositoryError>;
}

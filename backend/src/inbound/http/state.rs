//! Shared HTTP adapter state.
//!
//! Handlers receive this via `web::Data` and depend only on driving ports,
//! so they can be tested with doubles and no I/O.

use std::sync::Arc;

use crate::domain::ports::{DrugRegistration, DrugVerification, ManufacturerLogin};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn ManufacturerLogin>,
    pub registration: Arc<dyn DrugRegistration>,
    pub verification: Arc<dyn DrugVerification>,
}

impl HttpState {
    pub fn new(
        login: Arc<dyn ManufacturerLogin>,
        registration: Arc<dyn DrugRegistration>,
        verification: Arc<dyn DrugVerification>,
    ) -> Self {
        Self {
            login,
            registration,
            verification,
        }
    }
}

//! HTTP inbound adapter exposing REST endpoints.
//!
//! Handlers translate JSON and the cookie session into driving-port calls;
//! they never touch the ledger or the store directly.

pub mod drugs;
pub mod error;
pub mod health;
pub mod manufacturers;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod verify;

pub use error::ApiResult;

use actix_web::web;

/// Register the `/api/v1` routes on `cfg`.
///
/// The caller wraps the scope with the session middleware.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(manufacturers::login)
        .service(manufacturers::logout)
        .service(drugs::register_drug)
        .service(verify::verify_drug);
}

/// Register the session-free routes served outside `/api/v1`.
///
/// Verification links printed on packaging resolve here.
pub fn configure_public(cfg: &mut web::ServiceConfig) {
    cfg.service(verify::verify_link);
}

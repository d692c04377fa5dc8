//! Backend library modules.
//!
//! Drug batches are registered on a ledger when it confirms and under a
//! deterministic content hash when it does not; the public verification
//! endpoint resolves either kind of identifier.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;

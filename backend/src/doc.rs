//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer, the
//! request and response bodies they exchange, and the session cookie
//! security scheme. Swagger UI serves it in debug builds.

use crate::domain::{Error, ErrorCode, IdentifierOrigin, LookupSource};
use crate::inbound::http::drugs::{DrugSubmissionRequest, DrugSubmissionResponse};
use crate::inbound::http::manufacturers::LoginRequest;
use crate::inbound::http::verify::VerificationResponse;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Medicine verification API",
        description = "Drug batch registration for verified manufacturers and public authenticity checks."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::manufacturers::login,
        crate::inbound::http::manufacturers::logout,
        crate::inbound::http::drugs::register_drug,
        crate::inbound::http::verify::verify_drug,
        crate::inbound::http::verify::verify_link,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        LoginRequest,
        DrugSubmissionRequest,
        DrugSubmissionResponse,
        VerificationResponse,
        IdentifierOrigin,
        LookupSource,
    )),
    tags(
        (name = "manufacturers", description = "Manufacturer sessions"),
        (name = "drugs", description = "Drug batch registration"),
        (name = "verification", description = "Public authenticity checks"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

//! Public authenticity check.
//!
//! ```text
//! GET /api/v1/verify?tx_hash=0x5c7e...
//! ```
//!
//! No session is required. `identifier` is accepted as an alias of
//! `tx_hash` so printed links and hand-typed codes both work.
//!
//! The same check also answers at `GET /verify/result/?tx_hash=...`, the
//! fixed-format link handed out at registration and encoded in the
//! verification artifact.

use actix_web::{HttpResponse, get, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Error, LookupResult, LookupSource};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VerifyQuery {
    /// Ledger transaction hash or fallback identifier.
    #[serde(alias = "identifier")]
    pub tx_hash: Option<String>,
}

/// Public view of a verified drug.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    pub name: String,
    pub batch: String,
    pub manufacturer_name: String,
    #[schema(example = "2025-01-01")]
    pub expiry: String,
    pub identifier: String,
    pub source: LookupSource,
}

impl From<LookupResult> for VerificationResponse {
    fn from(value: LookupResult) -> Self {
        Self {
            name: value.name,
            batch: value.batch,
            manufacturer_name: value.manufacturer_name,
            expiry: value.expiry.to_string(),
            identifier: value.identifier.into(),
            source: value.source,
        }
    }
}

/// Look up a drug by its identifier.
#[utoipa::path(
    get,
    path = "/api/v1/verify",
    params(VerifyQuery),
    responses(
        (status = 200, description = "Drug found", body = VerificationResponse),
        (status = 400, description = "Missing or malformed identifier", body = Error),
        (status = 404, description = "No medicine found for the given identifier", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["verification"],
    operation_id = "verifyDrug",
    security([])
)]
#[get("/verify")]
pub async fn verify_drug(
    state: web::Data<HttpState>,
    query: web::Query<VerifyQuery>,
) -> ApiResult<HttpResponse> {
    respond(&state, &query).await
}

/// Resolve a printed verification link.
#[utoipa::path(
    get,
    path = "/verify/result/",
    params(VerifyQuery),
    responses(
        (status = 200, description = "Drug found", body = VerificationResponse),
        (status = 400, description = "Missing or malformed identifier", body = Error),
        (status = 404, description = "No medicine found for the given identifier", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["verification"],
    operation_id = "verifyDrugLink",
    security([])
)]
#[get("/verify/result/")]
pub async fn verify_link(
    state: web::Data<HttpState>,
    query: web::Query<VerifyQuery>,
) -> ApiResult<HttpResponse> {
    respond(&state, &query).await
}

async fn respond(state: &HttpState, query: &VerifyQuery) -> ApiResult<HttpResponse> {
    let raw = query.tx_hash.as_deref().unwrap_or_default();
    let result = state.verification.verify(raw).await?;
    Ok(HttpResponse::Ok().json(VerificationResponse::from(result)))
}

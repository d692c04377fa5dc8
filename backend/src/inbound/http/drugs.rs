//! Drug batch submission for logged-in manufacturers.
//!
//! ```text
//! POST /api/v1/drugs {"name":"Paracetamol","batch":"B100","expiry":"2025-01-01"}
//! ```
//!
//! Each login grants exactly one submission; the grant is spent only after
//! the registration has been stored.

use actix_web::{HttpResponse, post, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::ports::{DrugRegistrationRequest, DrugRegistrationResponse};
use crate::domain::{
    BatchCode, DrugName, DrugValidationError, Error, ExpiryDate, IdentifierOrigin, ManufacturerId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/drugs`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct DrugSubmissionRequest {
    #[schema(example = "Paracetamol")]
    pub name: String,
    #[schema(example = "B100")]
    pub batch: String,
    #[schema(value_type = String, format = Date, example = "2025-01-01")]
    pub expiry: NaiveDate,
}

/// Response body for a stored registration.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DrugSubmissionResponse {
    #[schema(example = "0x5c7e1b2f0d9a4c3e8b6f7a1d2c3b4a5968776655443322110ffeeddccbbaa998")]
    pub identifier: String,
    pub origin: IdentifierOrigin,
    /// Ledger transaction hash, when the ledger confirmed.
    pub ledger_confirmation: Option<String>,
    pub verification_url: String,
}

impl From<DrugRegistrationResponse> for DrugSubmissionResponse {
    fn from(value: DrugRegistrationResponse) -> Self {
        let DrugRegistrationResponse {
            result,
            verification_url,
        } = value;
        Self {
            identifier: result.identifier.into(),
            origin: result.origin,
            ledger_confirmation: result
                .ledger_confirmation
                .map(|confirmation| confirmation.confirmation_id),
            verification_url,
        }
    }
}

fn map_drug_validation_error(err: &DrugValidationError) -> Error {
    let (field, code) = match err {
        DrugValidationError::EmptyName => ("name", "empty_name"),
        DrugValidationError::NameTooLong { .. } => ("name", "name_too_long"),
        DrugValidationError::EmptyBatch => ("batch", "empty_batch"),
        DrugValidationError::BatchTooLong { .. } => ("batch", "batch_too_long"),
        DrugValidationError::EmptyManufacturerName => ("manufacturer", "empty_manufacturer"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

fn parse_submission(
    manufacturer_id: ManufacturerId,
    payload: DrugSubmissionRequest,
) -> Result<DrugRegistrationRequest, Error> {
    let DrugSubmissionRequest {
        name,
        batch,
        expiry,
    } = payload;
    let name = DrugName::new(name).map_err(|err| map_drug_validation_error(&err))?;
    let batch = BatchCode::new(batch).map_err(|err| map_drug_validation_error(&err))?;
    Ok(DrugRegistrationRequest {
        manufacturer_id,
        name,
        batch,
        expiry: ExpiryDate::new(expiry),
    })
}

/// Register one drug batch for the logged-in manufacturer.
#[utoipa::path(
    post,
    path = "/api/v1/drugs",
    request_body = DrugSubmissionRequest,
    responses(
        (status = 201, description = "Drug registered", body = DrugSubmissionResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Registration permission already used", body = Error),
        (status = 409, description = "Identifier already registered", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["drugs"],
    operation_id = "registerDrug",
    security(("SessionCookie" = []))
)]
#[post("/drugs")]
pub async fn register_drug(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<DrugSubmissionRequest>,
) -> ApiResult<HttpResponse> {
    let manufacturer_id = session.require_registration_grant()?;
    let request = parse_submission(manufacturer_id, payload.into_inner())?;
    let response = state.registration.register(&request).await?;
    session.consume_registration_grant();
    info!(
        identifier = %response.result.identifier,
        origin = %response.result.origin,
        "registration grant consumed"
    );
    Ok(HttpResponse::Created().json(DrugSubmissionResponse::from(response)))
}

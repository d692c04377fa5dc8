//! Manufacturer session endpoints.
//!
//! ```text
//! POST /api/v1/login {"email":"ops@acme.test","password":"...","govCode":"MED-AB12Z"}
//! POST /api/v1/logout
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{Error, LoginValidationError, ManufacturerCredentials};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[schema(example = "MED-AB12Z")]
    pub gov_code: String,
}

impl TryFrom<&LoginRequest> for ManufacturerCredentials {
    type Error = LoginValidationError;

    fn try_from(value: &LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password, &value.gov_code)
    }
}

fn map_login_validation_error(err: &LoginValidationError) -> Error {
    let (field, code) = match err {
        LoginValidationError::EmptyEmail => ("email", "empty_email"),
        LoginValidationError::EmptyPassword => ("password", "empty_password"),
        LoginValidationError::EmptyGovCode => ("govCode", "empty_gov_code"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Authenticate a verified manufacturer and grant one registration.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials or unverified account", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["manufacturers"],
    operation_id = "login"
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials =
        ManufacturerCredentials::try_from(&*payload).map_err(|err| map_login_validation_error(&err))?;
    let manufacturer_id = state.login.authenticate(&credentials).await?;
    session.persist_login(&manufacturer_id)?;
    Ok(HttpResponse::Ok().finish())
}

/// End the manufacturer session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["manufacturers"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ManufacturerId;
    use crate::domain::ports::{MockDrugRegistration, MockDrugVerification, MockManufacturerLogin};
    use crate::inbound::http::test_utils::test_session_middleware;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;
    use std::sync::Arc;

    fn state(login_mock: MockManufacturerLogin) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(
            Arc::new(login_mock),
            Arc::new(MockDrugRegistration::new()),
            Arc::new(MockDrugVerification::new()),
        ))
    }

    fn body(email: &str, password: &str, gov_code: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_owned(),
            password: password.to_owned(),
            gov_code: gov_code.to_owned(),
        }
    }

    #[actix_web::test]
    async fn successful_login_sets_session_cookie() {
        let mut login_mock = MockManufacturerLogin::new();
        login_mock
            .expect_authenticate()
            .times(1)
            .returning(|_| Ok(ManufacturerId::random()));
        let app = actix_test::init_service(
            App::new()
                .app_data(state(login_mock))
                .wrap(test_session_middleware())
                .service(web::scope("/api/v1").service(super::login)),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(body("ops@acme.test", "pw", "MED-AB12Z"))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.response().cookies().any(|c| c.name() == "session"));
    }

    #[actix_web::test]
    async fn rejected_login_is_unauthorised() {
        let mut login_mock = MockManufacturerLogin::new();
        login_mock
            .expect_authenticate()
            .returning(|_| Err(Error::unauthorized("invalid credentials or unverified account")));
        let app = actix_test::init_service(
            App::new()
                .app_data(state(login_mock))
                .wrap(test_session_middleware())
                .service(web::scope("/api/v1").service(super::login)),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(body("ops@acme.test", "pw", "MED-AB12Z"))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case("", "pw", "MED-AB12Z", "email")]
    #[case("ops@acme.test", "", "MED-AB12Z", "password")]
    #[case("ops@acme.test", "pw", " ", "govCode")]
    #[actix_web::test]
    async fn blank_fields_are_rejected_before_authentication(
        #[case] email: &str,
        #[case] password: &str,
        #[case] gov_code: &str,
        #[case] field: &str,
    ) {
        let mut login_mock = MockManufacturerLogin::new();
        login_mock.expect_authenticate().times(0);
        let app = actix_test::init_service(
            App::new()
                .app_data(state(login_mock))
                .wrap(test_session_middleware())
                .service(web::scope("/api/v1").service(super::login)),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(body(email, password, gov_code))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let value: Value = actix_test::read_body_json(res).await;
        assert_eq!(
            value
                .pointer("/details/field")
                .and_then(Value::as_str),
            Some(field)
        );
    }
}

//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The cookie session carries the logged-in manufacturer and a one-time
//! permission to register a single drug batch.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, ManufacturerId};

pub(crate) const MANUFACTURER_ID_KEY: &str = "manufacturer_id";
pub(crate) const CAN_REGISTER_KEY: &str = "can_register";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Record a successful login and grant one registration.
    pub fn persist_login(&self, manufacturer_id: &ManufacturerId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(MANUFACTURER_ID_KEY, manufacturer_id.to_string())
            .and_then(|()| self.0.insert(CAN_REGISTER_KEY, true))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the logged-in manufacturer, if any.
    pub fn manufacturer_id(&self) -> Result<Option<ManufacturerId>, Error> {
        let raw = self
            .0
            .get::<String>(MANUFACTURER_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|value| match value.parse::<ManufacturerId>() {
            Ok(id) => Some(id),
            Err(error) => {
                tracing::warn!("invalid manufacturer id in session cookie: {error}");
                None
            }
        }))
    }

    /// Require a manufacturer that still holds its registration grant.
    ///
    /// Missing login is `401`; a spent grant is `403`.
    pub fn require_registration_grant(&self) -> Result<ManufacturerId, Error> {
        let id = self
            .manufacturer_id()?
            .ok_or_else(|| Error::unauthorized("login required"))?;
        let granted = self
            .0
            .get::<bool>(CAN_REGISTER_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?
            .unwrap_or(false);
        if granted {
            Ok(id)
        } else {
            Err(Error::forbidden(
                "registration permission already used; log in again to register another batch",
            ))
        }
    }

    /// Spend the registration grant after a successful registration.
    pub fn consume_registration_grant(&self) {
        self.0.remove(CAN_REGISTER_KEY);
    }

    /// Drop every session value.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

//! Manufacturer authentication against stored credentials.

use std::sync::Arc;

use async_trait::async_trait;
use subtle::ConstantTimeEq as _;
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::manufacturer_admin::map_manufacturer_store_error;
use super::ports::{ManufacturerLogin, ManufacturerRepository};
use super::{CredentialHash, DEFAULT_ITERATIONS, Error, ManufacturerCredentials, ManufacturerId};

const REJECTED: &str = "invalid credentials or unverified account";

/// [`ManufacturerLogin`] backed by the manufacturer repository.
///
/// Unknown email, wrong government code, unverified account, and wrong
/// password all produce the same `unauthorized` error. The password is
/// checked on every attempt, against a placeholder hash when no account
/// matches, and always on the blocking pool.
#[derive(Clone)]
pub struct ManufacturerLoginService {
    manufacturers: Arc<dyn ManufacturerRepository>,
    placeholder: CredentialHash,
}

impl ManufacturerLoginService {
    pub fn new(manufacturers: Arc<dyn ManufacturerRepository>) -> Self {
        Self {
            manufacturers,
            placeholder: CredentialHash::placeholder(DEFAULT_ITERATIONS),
        }
    }

    /// Match the placeholder's work factor to the stored credentials.
    pub fn with_credential_iterations(mut self, iterations: u32) -> Self {
        self.placeholder = CredentialHash::placeholder(iterations);
        self
    }
}

async fn verify_off_thread(credential: CredentialHash, password: &str) -> Result<bool, Error> {
    let password = Zeroizing::new(password.to_owned());
    tokio::task::spawn_blocking(move || credential.verify(&password))
        .await
        .map_err(|err| Error::internal(format!("credential check failed: {err}")))
}

#[async_trait]
impl ManufacturerLogin for ManufacturerLoginService {
    async fn authenticate(
        &self,
        credentials: &ManufacturerCredentials,
    ) -> Result<ManufacturerId, Error> {
        let account = self
            .manufacturers
            .find_by_email(credentials.email())
            .await
            .map_err(map_manufacturer_store_error)?;
        let credential = account
            .as_ref()
            .map_or_else(|| self.placeholder.clone(), |found| found.credential.clone());
        let password_matches = verify_off_thread(credential, credentials.password()).await?;

        let Some(manufacturer) = account else {
            debug!("login rejected: unknown email");
            return Err(Error::unauthorized(REJECTED));
        };
        let code_matches: bool = manufacturer
            .gov_code
            .as_ref()
            .as_bytes()
            .ct_eq(credentials.gov_code().as_bytes())
            .into();
        if !code_matches {
            debug!(manufacturer_id = %manufacturer.id, "login rejected: government code mismatch");
            return Err(Error::unauthorized(REJECTED));
        }
        if !manufacturer.is_verified {
            debug!(manufacturer_id = %manufacturer.id, "login rejected: unverified");
            return Err(Error::unauthorized(REJECTED));
        }
        if !password_matches {
            debug!(manufacturer_id = %manufacturer.id, "login rejected: bad password");
            return Err(Error::unauthorized(REJECTED));
        }

        info!(manufacturer_id = %manufacturer.id, "manufacturer logged in");
        Ok(manufacturer.id)
    }
}

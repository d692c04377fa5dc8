//! Administrative operations on manufacturer accounts and their drugs.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::ports::{
    DrugRepository, DrugRepositoryError, ManufacturerRepository, ManufacturerRepositoryError,
};
use super::{
    CredentialHash, DEFAULT_ITERATIONS, DrugIdentifier, DrugRecord, Error, GovCode, Manufacturer,
    ManufacturerDraft, ManufacturerId,
};

pub(crate) fn map_manufacturer_store_error(error: ManufacturerRepositoryError) -> Error {
    match error {
        ManufacturerRepositoryError::Duplicate { field } => {
            Error::conflict(format!("a manufacturer with this {field} already exists"))
        }
        ManufacturerRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("store unavailable: {message}"))
        }
        ManufacturerRepositoryError::Query { message } => Error::internal(message),
    }
}

fn map_drug_store_error(error: DrugRepositoryError) -> Error {
    match error {
        DrugRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("store unavailable: {message}"))
        }
        other => Error::internal(other.to_string()),
    }
}

/// Account administration used by the operator CLI.
#[derive(Clone)]
pub struct ManufacturerAdminService {
    manufacturers: Arc<dyn ManufacturerRepository>,
    drugs: Arc<dyn DrugRepository>,
    credential_iterations: u32,
}

impl ManufacturerAdminService {
    pub fn new(
        manufacturers: Arc<dyn ManufacturerRepository>,
        drugs: Arc<dyn DrugRepository>,
    ) -> Self {
        Self {
            manufacturers,
            drugs,
            credential_iterations: DEFAULT_ITERATIONS,
        }
    }

    /// Override the PBKDF2 work factor for new credentials.
    pub fn with_credential_iterations(mut self, iterations: u32) -> Self {
        self.credential_iterations = iterations.max(1);
        self
    }

    /// Create an unverified account, generating a government code when the
    /// draft carries none.
    pub async fn create_manufacturer(
        &self,
        draft: ManufacturerDraft,
        password: &str,
    ) -> Result<Manufacturer, Error> {
        draft
            .validate()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        if password.is_empty() {
            return Err(Error::invalid_request("password must not be empty"));
        }

        let manufacturer = Manufacturer {
            id: ManufacturerId::random(),
            name: draft.name.trim().to_owned(),
            email: draft.email.trim().to_owned(),
            credential: CredentialHash::derive(password, self.credential_iterations),
            gov_code: draft.gov_code.unwrap_or_else(GovCode::generate),
            phone: draft.phone.filter(|phone| !phone.trim().is_empty()),
            license_number: draft.license_number.trim().to_owned(),
            is_verified: false,
            created_at: Utc::now(),
        };
        self.manufacturers
            .insert(&manufacturer)
            .await
            .map_err(map_manufacturer_store_error)?;
        info!(
            manufacturer_id = %manufacturer.id,
            gov_code = %manufacturer.gov_code,
            "manufacturer created"
        );
        Ok(manufacturer)
    }

    /// Mark an account as verified so it may log in and register drugs.
    pub async fn approve_manufacturer(&self, id: &ManufacturerId) -> Result<(), Error> {
        let updated = self
            .manufacturers
            .mark_verified(id)
            .await
            .map_err(map_manufacturer_store_error)?;
        if !updated {
            return Err(Error::not_found(format!("manufacturer {id} not found")));
        }
        info!(manufacturer_id = %id, "manufacturer approved");
        Ok(())
    }

    /// Delete an account. Its drugs are deleted with it.
    pub async fn delete_manufacturer(&self, id: &ManufacturerId) -> Result<(), Error> {
        let deleted = self
            .manufacturers
            .delete(id)
            .await
            .map_err(map_manufacturer_store_error)?;
        if !deleted {
            return Err(Error::not_found(format!("manufacturer {id} not found")));
        }
        info!(manufacturer_id = %id, "manufacturer deleted with its drugs");
        Ok(())
    }

    pub async fn list_manufacturers(&self) -> Result<Vec<Manufacturer>, Error> {
        self.manufacturers
            .list()
            .await
            .map_err(map_manufacturer_store_error)
    }

    pub async fn list_drugs(&self) -> Result<Vec<DrugRecord>, Error> {
        self.drugs.list().await.map_err(map_drug_store_error)
    }

    pub async fn delete_drug(&self, raw_identifier: &str) -> Result<(), Error> {
        let identifier = DrugIdentifier::parse(raw_identifier)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let deleted = self
            .drugs
            .delete(&identifier)
            .await
            .map_err(map_drug_store_error)?;
        if !deleted {
            return Err(Error::not_found(format!("drug {identifier} not found")));
        }
        info!(identifier = %identifier, "drug deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockDrugRepository, MockManufacturerRepository};
    use rstest::rstest;

    fn draft() -> ManufacturerDraft {
        ManufacturerDraft {
            name: " Acme ".to_owned(),
            email: "ops@acme.test".to_owned(),
            phone: Some(String::new()),
            license_number: "LIC-7".to_owned(),
            gov_code: None,
        }
    }

    fn service(
        manufacturers: MockManufacturerRepository,
        drugs: MockDrugRepository,
    ) -> ManufacturerAdminService {
        ManufacturerAdminService::new(Arc::new(manufacturers), Arc::new(drugs))
            .with_credential_iterations(1)
    }

    #[tokio::test]
    async fn create_hashes_password_and_generates_code() {
        let mut manufacturers = MockManufacturerRepository::new();
        manufacturers
            .expect_insert()
            .withf(|m| !m.is_verified && m.name == "Acme" && m.phone.is_none())
            .times(1)
            .returning(|_| Ok(()));

        let created = service(manufacturers, MockDrugRepository::new())
            .create_manufacturer(draft(), "hunter2")
            .await
            .expect("created");

        assert!(created.credential.verify("hunter2"));
        assert!(!created.credential.as_str().contains("hunter2"));
        assert!(GovCode::new(created.gov_code.as_ref()).is_ok());
    }

    #[tokio::test]
    async fn create_keeps_supplied_code() {
        let mut manufacturers = MockManufacturerRepository::new();
        manufacturers.expect_insert().returning(|_| Ok(()));
        let mut input = draft();
        input.gov_code = Some(GovCode::new("MED-ZZ999").expect("code"));

        let created = service(manufacturers, MockDrugRepository::new())
            .create_manufacturer(input, "pw")
            .await
            .expect("created");

        assert_eq!(created.gov_code.as_ref(), "MED-ZZ999");
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let mut manufacturers = MockManufacturerRepository::new();
        manufacturers
            .expect_insert()
            .returning(|_| Err(ManufacturerRepositoryError::duplicate("email")));

        let err = service(manufacturers, MockDrugRepository::new())
            .create_manufacturer(draft(), "pw")
            .await
            .expect_err("duplicate");

        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[case(true, None)]
    #[case(false, Some(ErrorCode::NotFound))]
    #[tokio::test]
    async fn approve_reports_missing_accounts(
        #[case] exists: bool,
        #[case] expected: Option<ErrorCode>,
    ) {
        let mut manufacturers = MockManufacturerRepository::new();
        manufacturers
            .expect_mark_verified()
            .times(1)
            .returning(move |_| Ok(exists));

        let result = service(manufacturers, MockDrugRepository::new())
            .approve_manufacturer(&ManufacturerId::random())
            .await;

        assert_eq!(result.err().map(|err| err.code()), expected);
    }

    #[tokio::test]
    async fn delete_drug_validates_identifier_first() {
        let mut drugs = MockDrugRepository::new();
        drugs.expect_delete().times(0);

        let err = service(MockManufacturerRepository::new(), drugs)
            .delete_drug("nope")
            .await
            .expect_err("invalid");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}

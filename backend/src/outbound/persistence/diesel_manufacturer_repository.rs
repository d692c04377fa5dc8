//! PostgreSQL-backed `ManufacturerRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::RunQueryDsl;
use tracing::info;

use crate::domain::ports::{ManufacturerRepository, ManufacturerRepositoryError};
use crate::domain::{CredentialHash, GovCode, Manufacturer, ManufacturerId};

use super::error_mapping::{StoreFailure, classify_diesel_error, classify_pool_error};
use super::models::{ManufacturerRow, NewManufacturerRow};
use super::pool::DbPool;
use super::schema::manufacturers;

#[derive(Clone)]
pub struct DieselManufacturerRepository {
    pool: DbPool,
}

impl DieselManufacturerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Name the column behind a unique constraint from the migrations.
fn duplicate_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("manufacturers_email_key") => "email",
        Some("manufacturers_gov_code_key") => "government code",
        Some("manufacturers_license_number_key") => "license number",
        Some("manufacturers_pkey") => "id",
        _ => "unique field",
    }
}

fn to_repository_error(failure: StoreFailure) -> ManufacturerRepositoryError {
    match failure {
        StoreFailure::Connection(message) => ManufacturerRepositoryError::connection(message),
        StoreFailure::Query(message) => ManufacturerRepositoryError::query(message),
        StoreFailure::UniqueViolation { constraint } => {
            ManufacturerRepositoryError::duplicate(duplicate_field(constraint.as_deref()))
        }
        StoreFailure::ForeignKeyViolation => {
            ManufacturerRepositoryError::query("unexpected foreign key violation")
        }
    }
}

fn map_diesel_error(error: DieselError) -> ManufacturerRepositoryError {
    to_repository_error(classify_diesel_error(error))
}

fn row_to_manufacturer(row: ManufacturerRow) -> Result<Manufacturer, ManufacturerRepositoryError> {
    let credential = CredentialHash::parse(&row.password_hash).map_err(|err| {
        ManufacturerRepositoryError::query(format!("corrupt credential for {}: {err}", row.id))
    })?;
    let gov_code = GovCode::new(row.gov_code).map_err(|err| {
        ManufacturerRepositoryError::query(format!("corrupt government code for {}: {err}", row.id))
    })?;
    Ok(Manufacturer {
        id: ManufacturerId::from_uuid(row.id),
        name: row.name,
        email: row.email,
        credential,
        gov_code,
        phone: row.phone,
        license_number: row.license_number,
        is_verified: row.is_verified,
        created_at: row.created_at,
    })
}

#[async_trait]
impl ManufacturerRepository for DieselManufacturerRepository {
    async fn insert(&self, manufacturer: &Manufacturer) -> Result<(), ManufacturerRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| to_repository_error(classify_pool_error(err)))?;
        let row = NewManufacturerRow {
            id: *manufacturer.id.as_uuid(),
            name: &manufacturer.name,
            email: &manufacturer.email,
            password_hash: manufacturer.credential.as_str(),
            gov_code: manufacturer.gov_code.as_ref(),
            phone: manufacturer.phone.as_deref(),
            license_number: &manufacturer.license_number,
            is_verified: manufacturer.is_verified,
            created_at: manufacturer.created_at,
        };

        diesel::insert_into(manufacturers::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        id: &ManufacturerId,
    ) -> Result<Option<Manufacturer>, ManufacturerRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| to_repository_error(classify_pool_error(err)))?;

        let row: Option<ManufacturerRow> = manufacturers::table
            .filter(manufacturers::id.eq(id.as_uuid()))
            .select(ManufacturerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_manufacturer).transpose()
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Manufacturer>, ManufacturerRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| to_repository_error(classify_pool_error(err)))?;

        let row: Option<ManufacturerRow> = manufacturers::table
            .filter(manufacturers::email.eq(email))
            .select(ManufacturerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_manufacturer).transpose()
    }

    async fn mark_verified(&self, id: &ManufacturerId) -> Result<bool, ManufacturerRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| to_repository_error(classify_pool_error(err)))?;

        let updated = diesel::update(manufacturers::table.filter(manufacturers::id.eq(id.as_uuid())))
            .set(manufacturers::is_verified.eq(true))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn delete(&self, id: &ManufacturerId) -> Result<bool, ManufacturerRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| to_repository_error(classify_pool_error(err)))?;

        // Drugs go with it through ON DELETE CASCADE.
        let deleted = diesel::delete(manufacturers::table.filter(manufacturers::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if deleted > 0 {
            info!(manufacturer_id = %id, "manufacturer deleted with its drugs");
        }
        Ok(deleted > 0)
    }

    async fn list(&self) -> Result<Vec<Manufacturer>, ManufacturerRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| to_repository_error(classify_pool_error(err)))?;

        let rows: Vec<ManufacturerRow> = manufacturers::table
            .order_by(manufacturers::created_at.desc())
            .select(ManufacturerRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_manufacturer).collect()
    }
}

//! PostgreSQL-backed `DrugRepository`.
//!
//! Reads always join `manufacturers` so records carry the manufacturer's
//! current name.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;

use crate::domain::ports::{DrugRepository, DrugRepositoryError};
use crate::domain::{DrugIdentifier, DrugRecord, ExpiryDate, ManufacturerId, NewDrugRecord};

use super::error_mapping::{StoreFailure, classify_diesel_error, classify_pool_error};
use super::models::{DrugRow, NewDrugRow};
use super::pool::DbPool;
use super::schema::{drugs, manufacturers};

#[derive(Clone)]
pub struct DieselDrugRepository {
    pool: DbPool,
}

impl DieselDrugRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_repository_error(failure: StoreFailure) -> DrugRepositoryError {
    match failure {
        StoreFailure::Connection(message) => DrugRepositoryError::connection(message),
        StoreFailure::Query(message) => DrugRepositoryError::query(message),
        StoreFailure::UniqueViolation { .. } => {
            DrugRepositoryError::query("unexpected unique constraint violation")
        }
        StoreFailure::ForeignKeyViolation => {
            DrugRepositoryError::query("unexpected foreign key violation")
        }
    }
}

fn map_diesel_error(error: DieselError) -> DrugRepositoryError {
    to_repository_error(classify_diesel_error(error))
}

fn map_insert_error(error: DieselError, record: &NewDrugRecord) -> DrugRepositoryError {
    match classify_diesel_error(error) {
        StoreFailure::UniqueViolation { .. } => {
            DrugRepositoryError::duplicate(record.identifier.as_ref())
        }
        StoreFailure::ForeignKeyViolation => {
            DrugRepositoryError::unknown_manufacturer(record.manufacturer_id.to_string())
        }
        other => to_repository_error(other),
    }
}

fn row_to_record(
    (row, manufacturer_name): (DrugRow, String),
) -> Result<DrugRecord, DrugRepositoryError> {
    let identifier = DrugIdentifier::parse(&row.identifier).map_err(|err| {
        DrugRepositoryError::query(format!("corrupt identifier in database: {err}"))
    })?;
    Ok(DrugRecord {
        identifier,
        name: row.name,
        batch: row.batch,
        manufacturer_id: ManufacturerId::from_uuid(row.manufacturer_id),
        manufacturer_name,
        expiry: ExpiryDate::new(row.expiry),
        verification_artifact: row.verification_artifact,
        created_at: row.created_at,
    })
}

#[async_trait]
impl DrugRepository for DieselDrugRepository {
    async fn insert(&self, record: &NewDrugRecord) -> Result<DrugRecord, DrugRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| to_repository_error(classify_pool_error(err)))?;
        let identifier = record.identifier.as_ref();
        let row = NewDrugRow {
            identifier,
            name: record.name.as_ref(),
            batch: record.batch.as_ref(),
            manufacturer_id: *record.manufacturer_id.as_uuid(),
            expiry: record.expiry.date(),
        };

        let stored: (DrugRow, String) = conn
            .transaction::<_, DieselError, _>(|conn| {
                async move {
                    diesel::insert_into(drugs::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    drugs::table
                        .inner_join(manufacturers::table)
                        .filter(drugs::identifier.eq(identifier))
                        .select((DrugRow::as_select(), manufacturers::name))
                        .first(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_insert_error(err, record))?;

        row_to_record(stored)
    }

    async fn find_by_identifier(
        &self,
        identifier: &DrugIdentifier,
    ) -> Result<Option<DrugRecord>, DrugRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| to_repository_error(classify_pool_error(err)))?;

        let found: Option<(DrugRow, String)> = drugs::table
            .inner_join(manufacturers::table)
            .filter(drugs::identifier.eq(identifier.as_ref()))
            .select((DrugRow::as_select(), manufacturers::name))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        found.map(row_to_record).transpose()
    }

    async fn attach_verification_artifact(
        &self,
        identifier: &DrugIdentifier,
        artifact: &str,
    ) -> Result<bool, DrugRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| to_repository_error(classify_pool_error(err)))?;

        let updated = diesel::update(
            drugs::table
                .filter(drugs::identifier.eq(identifier.as_ref()))
                .filter(drugs::verification_artifact.is_null()),
        )
        .set(drugs::verification_artifact.eq(artifact))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn list(&self) -> Result<Vec<DrugRecord>, DrugRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| to_repository_error(classify_pool_error(err)))?;

        let rows: Vec<(DrugRow, String)> = drugs::table
            .inner_join(manufacturers::table)
            .order_by(drugs::created_at.desc())
            .select((DrugRow::as_select(), manufacturers::name))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_record).collect()
    }

    async fn delete(&self, identifier: &DrugIdentifier) -> Result<bool, DrugRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| to_repository_error(classify_pool_error(err)))?;

        let deleted = diesel::delete(drugs::table.filter(drugs::identifier.eq(identifier.as_ref())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}

//! Internal Diesel row structs. Never exposed to the domain.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{drugs, manufacturers};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = manufacturers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ManufacturerRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub gov_code: String,
    pub phone: Option<String>,
    pub license_number: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = manufacturers)]
pub(crate) struct NewManufacturerRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub gov_code: &'a str,
    pub phone: Option<&'a str>,
    pub license_number: &'a str,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = drugs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DrugRow {
    pub identifier: String,
    pub name: String,
    pub batch: String,
    pub manufacturer_id: Uuid,
    pub expiry: NaiveDate,
    pub verification_artifact: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = drugs)]
pub(crate) struct NewDrugRow<'a> {
    pub identifier: &'a str,
    pub name: &'a str,
    pub batch: &'a str,
    pub manufacturer_id: Uuid,
    pub expiry: NaiveDate,
}

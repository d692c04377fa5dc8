//! In-process stores for tests and database-less runs.
//!
//! Both repositories share one [`InMemoryStore`] so they enforce the same
//! rules as the PostgreSQL schema: unique identifiers, unique manufacturer
//! email, government code and license number, a foreign key from drugs to
//! manufacturers, and cascading deletes.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::ports::{
    DrugRepository, DrugRepositoryError, ManufacturerRepository, ManufacturerRepositoryError,
};
use crate::domain::{
    DrugIdentifier, DrugRecord, ExpiryDate, Manufacturer, ManufacturerId, NewDrugRecord,
};

#[derive(Debug, Clone)]
struct StoredDrug {
    sequence: u64,
    name: String,
    batch: String,
    manufacturer_id: ManufacturerId,
    expiry: ExpiryDate,
    verification_artifact: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    manufacturers: BTreeMap<Uuid, Manufacturer>,
    drugs: BTreeMap<String, StoredDrug>,
    next_sequence: u64,
}

impl Tables {
    fn record(&self, identifier: &str, drug: &StoredDrug) -> Result<DrugRecord, DrugRepositoryError> {
        let manufacturer = self
            .manufacturers
            .get(drug.manufacturer_id.as_uuid())
            .ok_or_else(|| DrugRepositoryError::query("drug references a missing manufacturer"))?;
        let identifier = DrugIdentifier::parse(identifier)
            .map_err(|err| DrugRepositoryError::query(format!("corrupt identifier: {err}")))?;
        Ok(DrugRecord {
            identifier,
            name: drug.name.clone(),
            batch: drug.batch.clone(),
            manufacturer_id: drug.manufacturer_id,
            manufacturer_name: manufacturer.name.clone(),
            expiry: drug.expiry,
            verification_artifact: drug.verification_artifact.clone(),
            created_at: drug.created_at,
        })
    }

    fn duplicate_field(&self, candidate: &Manufacturer) -> Option<&'static str> {
        if self.manufacturers.contains_key(candidate.id.as_uuid()) {
            return Some("id");
        }
        self.manufacturers.values().find_map(|existing| {
            if existing.email == candidate.email {
                Some("email")
            } else if existing.gov_code == candidate.gov_code {
                Some("government code")
            } else if existing.license_number == candidate.license_number {
                Some("license number")
            } else {
                None
            }
        })
    }
}

/// Shared backing tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drugs(&self) -> InMemoryDrugRepository {
        InMemoryDrugRepository {
            store: self.clone(),
        }
    }

    pub fn manufacturers(&self) -> InMemoryManufacturerRepository {
        InMemoryManufacturerRepository {
            store: self.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryDrugRepository {
    store: InMemoryStore,
}

#[async_trait]
impl DrugRepository for InMemoryDrugRepository {
    async fn insert(&self, record: &NewDrugRecord) -> Result<DrugRecord, DrugRepositoryError> {
        let mut tables = self.store.tables.lock().await;
        let key = record.identifier.as_ref().to_owned();
        if tables.drugs.contains_key(&key) {
            return Err(DrugRepositoryError::duplicate(key));
        }
        if !tables
            .manufacturers
            .contains_key(record.manufacturer_id.as_uuid())
        {
            return Err(DrugRepositoryError::unknown_manufacturer(
                record.manufacturer_id.to_string(),
            ));
        }
        let sequence = tables.next_sequence;
        tables.next_sequence += 1;
        let stored = StoredDrug {
            sequence,
            name: record.name.as_ref().to_owned(),
            batch: record.batch.as_ref().to_owned(),
            manufacturer_id: record.manufacturer_id,
            expiry: record.expiry,
            verification_artifact: None,
            created_at: Utc::now(),
        };
        let created = tables.record(&key, &stored)?;
        tables.drugs.insert(key, stored);
        Ok(created)
    }

    async fn find_by_identifier(
        &self,
        identifier: &DrugIdentifier,
    ) -> Result<Option<DrugRecord>, DrugRepositoryError> {
        let tables = self.store.tables.lock().await;
        tables
            .drugs
            .get(identifier.as_ref())
            .map(|drug| tables.record(identifier.as_ref(), drug))
            .transpose()
    }

    async fn attach_verification_artifact(
        &self,
        identifier: &DrugIdentifier,
        artifact: &str,
    ) -> Result<bool, DrugRepositoryError> {
        let mut tables = self.store.tables.lock().await;
        match tables.drugs.get_mut(identifier.as_ref()) {
            Some(drug) if drug.verification_artifact.is_none() => {
                drug.verification_artifact = Some(artifact.to_owned());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<DrugRecord>, DrugRepositoryError> {
        let tables = self.store.tables.lock().await;
        let mut entries: Vec<(&String, &StoredDrug)> = tables.drugs.iter().collect();
        entries.sort_by(|(_, a), (_, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.sequence.cmp(&a.sequence))
        });
        entries
            .into_iter()
            .map(|(identifier, drug)| tables.record(identifier, drug))
            .collect()
    }

    async fn delete(&self, identifier: &DrugIdentifier) -> Result<bool, DrugRepositoryError> {
        let mut tables = self.store.tables.lock().await;
        Ok(tables.drugs.remove(identifier.as_ref()).is_some())
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryManufacturerRepository {
    store: InMemoryStore,
}

#[async_trait]
impl ManufacturerRepository for InMemoryManufacturerRepository {
    async fn insert(&self, manufacturer: &Manufacturer) -> Result<(), ManufacturerRepositoryError> {
        let mut tables = self.store.tables.lock().await;
        if let Some(field) = tables.duplicate_field(manufacturer) {
            return Err(ManufacturerRepositoryError::duplicate(field));
        }
        tables
            .manufacturers
            .insert(*manufacturer.id.as_uuid(), manufacturer.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &ManufacturerId,
    ) -> Result<Option<Manufacturer>, ManufacturerRepositoryError> {
        let tables = self.store.tables.lock().await;
        Ok(tables.manufacturers.get(id.as_uuid()).cloned())
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Manufacturer>, ManufacturerRepositoryError> {
        let tables = self.store.tables.lock().await;
        Ok(tables
            .manufacturers
            .values()
            .find(|manufacturer| manufacturer.email == email)
            .cloned())
    }

    async fn mark_verified(&self, id: &ManufacturerId) -> Result<bool, ManufacturerRepositoryError> {
        let mut tables = self.store.tables.lock().await;
        let Some(manufacturer) = tables.manufacturers.get_mut(id.as_uuid()) else {
            return Ok(false);
        };
        manufacturer.is_verified = true;
        Ok(true)
    }

    async fn delete(&self, id: &ManufacturerId) -> Result<bool, ManufacturerRepositoryError> {
        let mut tables = self.store.tables.lock().await;
        if tables.manufacturers.remove(id.as_uuid()).is_none() {
            return Ok(false);
        }
        tables.drugs.retain(|_, drug| drug.manufacturer_id != *id);
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<Manufacturer>, ManufacturerRepositoryError> {
        let tables = self.store.tables.lock().await;
        let mut all: Vec<Manufacturer> = tables.manufacturers.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

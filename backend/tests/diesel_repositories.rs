//! Diesel repositories against embedded PostgreSQL.
//!
//! Covers what only the real schema enforces: unique constraints surfacing
//! as domain conflicts, the foreign key to `manufacturers`, `ON DELETE
//! CASCADE`, and the attach-once update on the artifact column.
//!
//! Cluster bootstrap is blocking, so tests are synchronous and drive the
//! repositories through a runtime owned by the fixture.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use medverify::domain::ports::{
    DisabledLedgerClient, DrugRegistrationRequest, DrugRepository, DrugRepositoryError,
    ManufacturerRepository, ManufacturerRepositoryError,
};
use medverify::domain::{
    BatchCode, CredentialHash, DrugIdentifier, DrugName, DrugRegistrationService, ExpiryDate,
    GovCode, LookupReconciler, LookupSource, Manufacturer, ManufacturerId, NewDrugRecord,
    RegistrationError,
};
use medverify::outbound::artifacts::LinkArtifactGenerator;
use medverify::outbound::persistence::{
    DbPool, DieselDrugRepository, DieselManufacturerRepository, PoolConfig,
};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;
use url::Url;

mod support;

use support::{handle_cluster_setup_failure, provision_database, shared_cluster};

const FALLBACK_ID: &str = "0xe2061a314b82820b3bd0af759caca65c27a1d3b3dd3015524bf7feca0020d5a7";
const OTHER_ID: &str = "0x3d6f0a2b9c8e7d1f4a5b6c7d8e9f0a1b2c3d4e5f60718293a4b5c6d7e8f90a1b";

struct Store {
    runtime: Runtime,
    drugs: DieselDrugRepository,
    manufacturers: DieselManufacturerRepository,
    _database: TemporaryDatabase,
}

fn setup_store() -> Result<Store, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_database(cluster)?;
    let config = PoolConfig::new(database.url().to_string())
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    Ok(Store {
        runtime,
        drugs: DieselDrugRepository::new(pool.clone()),
        manufacturers: DieselManufacturerRepository::new(pool),
        _database: database,
    })
}

#[fixture]
fn store() -> Option<Store> {
    match setup_store() {
        Ok(store) => Some(store),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn manufacturer(email: &str, gov_code: &str, license_number: &str) -> Manufacturer {
    Manufacturer {
        id: ManufacturerId::random(),
        name: "Acme".to_owned(),
        email: email.to_owned(),
        credential: CredentialHash::derive("s3cret", 1),
        gov_code: GovCode::new(gov_code).expect("gov code"),
        phone: None,
        license_number: license_number.to_owned(),
        is_verified: true,
        created_at: Utc::now(),
    }
}

fn acme() -> Manufacturer {
    manufacturer("ops@acme.test", "MED-AB12Z", "LIC-1")
}

fn expiry() -> ExpiryDate {
    ExpiryDate::new(NaiveDate::from_ymd_opt(2025, 1, 1).expect("date"))
}

fn drug(identifier: &str, manufacturer_id: ManufacturerId) -> NewDrugRecord {
    NewDrugRecord {
        identifier: DrugIdentifier::parse(identifier).expect("identifier"),
        name: DrugName::new("Paracetamol").expect("name"),
        batch: BatchCode::new("B100").expect("batch"),
        manufacturer_id,
        expiry: expiry(),
    }
}

#[rstest]
fn duplicate_registration_is_a_store_constraint_violation(store: Option<Store>) {
    let Some(store) = store else { return };
    store.runtime.block_on(async {
        let acme = acme();
        store.manufacturers.insert(&acme).await.expect("manufacturer");
        let artifacts =
            LinkArtifactGenerator::new(&Url::parse("https://verify.example.org").expect("url"))
                .expect("artifact generator");
        let registration = DrugRegistrationService::new(
            Arc::new(DisabledLedgerClient),
            Arc::new(store.drugs.clone()),
            Arc::new(store.manufacturers.clone()),
            Arc::new(artifacts),
        );
        let request = DrugRegistrationRequest {
            manufacturer_id: acme.id,
            name: DrugName::new("Paracetamol").expect("name"),
            batch: BatchCode::new("B100").expect("batch"),
            expiry: expiry(),
        };

        let first = registration.register_drug(&request).await.expect("first");
        let err = registration
            .register_drug(&request)
            .await
            .expect_err("duplicate");

        assert_eq!(first.result.identifier.as_ref(), FALLBACK_ID);
        assert!(matches!(
            err,
            RegistrationError::StoreConstraintViolation { .. }
        ));
        assert_eq!(store.drugs.list().await.expect("list").len(), 1);

        let stored = store
            .drugs
            .find_by_identifier(&first.result.identifier)
            .await
            .expect("query")
            .expect("stored");
        assert_eq!(stored.manufacturer_name, "Acme");
        assert_eq!(
            stored.verification_artifact.as_deref(),
            Some(first.verification_url.as_str())
        );

        let lookup = LookupReconciler::new(
            Arc::new(DisabledLedgerClient),
            Arc::new(store.drugs.clone()),
        );
        let found = lookup.lookup(FALLBACK_ID).await.expect("found");
        assert_eq!(found.source, LookupSource::Store);
        assert_eq!(found.expiry, expiry());
    });
}

#[rstest]
fn drugs_require_an_existing_manufacturer(store: Option<Store>) {
    let Some(store) = store else { return };
    store.runtime.block_on(async {
        let missing = ManufacturerId::random();

        let err = store
            .drugs
            .insert(&drug(FALLBACK_ID, missing))
            .await
            .expect_err("foreign key");

        assert_eq!(
            err,
            DrugRepositoryError::unknown_manufacturer(missing.to_string())
        );
    });
}

#[rstest]
fn artifact_is_attached_only_once(store: Option<Store>) {
    let Some(store) = store else { return };
    store.runtime.block_on(async {
        let acme = acme();
        store.manufacturers.insert(&acme).await.expect("manufacturer");
        let stored = store
            .drugs
            .insert(&drug(FALLBACK_ID, acme.id))
            .await
            .expect("insert");
        assert_eq!(stored.verification_artifact, None);

        let first = store
            .drugs
            .attach_verification_artifact(&stored.identifier, "https://verify.example.org/first")
            .await
            .expect("attach");
        let second = store
            .drugs
            .attach_verification_artifact(&stored.identifier, "https://verify.example.org/second")
            .await
            .expect("attach");

        assert!(first);
        assert!(!second);
        let found = store
            .drugs
            .find_by_identifier(&stored.identifier)
            .await
            .expect("query")
            .expect("present");
        assert_eq!(
            found.verification_artifact.as_deref(),
            Some("https://verify.example.org/first")
        );
    });
}

#[rstest]
fn deleting_a_manufacturer_cascades_to_its_drugs(store: Option<Store>) {
    let Some(store) = store else { return };
    store.runtime.block_on(async {
        let acme = acme();
        let other = manufacturer("qa@other.test", "MED-QQ77X", "LIC-2");
        store.manufacturers.insert(&acme).await.expect("acme");
        store.manufacturers.insert(&other).await.expect("other");
        store
            .drugs
            .insert(&drug(FALLBACK_ID, acme.id))
            .await
            .expect("acme drug");
        store
            .drugs
            .insert(&drug(OTHER_ID, other.id))
            .await
            .expect("other drug");

        assert!(store.manufacturers.delete(&acme.id).await.expect("delete"));

        let remaining = store.drugs.list().await.expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(
            remaining.first().map(|record| record.identifier.as_ref()),
            Some(OTHER_ID)
        );
        assert!(!store.manufacturers.delete(&acme.id).await.expect("delete again"));
    });
}

#[rstest]
#[case::email("ops@acme.test", "MED-ZZ99Y", "LIC-9", "email")]
#[case::gov_code("new@acme.test", "MED-AB12Z", "LIC-9", "government code")]
#[case::license("new@acme.test", "MED-ZZ99Y", "LIC-1", "license number")]
fn unique_manufacturer_columns_name_the_clash(
    store: Option<Store>,
    #[case] email: &str,
    #[case] gov_code: &str,
    #[case] license_number: &str,
    #[case] field: &str,
) {
    let Some(store) = store else { return };
    store.runtime.block_on(async {
        store.manufacturers.insert(&acme()).await.expect("acme");

        let err = store
            .manufacturers
            .insert(&manufacturer(email, gov_code, license_number))
            .await
            .expect_err("duplicate");

        assert_eq!(err, ManufacturerRepositoryError::duplicate(field));
    });
}

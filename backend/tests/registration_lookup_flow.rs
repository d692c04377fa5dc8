//! Register → lookup flows over the in-memory stores.
//!
//! The ledger is either disabled or a scripted double, so every branch of
//! the identifier decision and the lookup overlay runs without a node.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use medverify::domain::ports::{
    DisabledLedgerClient, DrugRegistration, DrugRegistrationRequest, DrugRepository, LedgerClient,
    LedgerDrug, LedgerError, LedgerReceipt,
};
use medverify::domain::{
    BatchCode, DrugIdentifier, DrugName, DrugRegistrationService, DrugSubmission, ErrorCode,
    ExpiryDate, IdentifierOrigin, LookupError, LookupReconciler, LookupSource,
    ManufacturerAdminService, ManufacturerDraft, ManufacturerId, RegistrationError,
};
use medverify::outbound::artifacts::LinkArtifactGenerator;
use medverify::outbound::memory::InMemoryStore;
use rstest::{fixture, rstest};
use url::Url;

const FALLBACK_ID: &str = "0xe2061a314b82820b3bd0af759caca65c27a1d3b3dd3015524bf7feca0020d5a7";
const TX_HASH: &str = "0x9b2f4c61d0a7e83b5c1f6e2d9a4b7c0e3f8d1a5b6c9e2f4a7d0b3c6e9f1a4d7b";

/// Ledger double answering from scripted submissions and registrations.
#[derive(Default)]
struct ScriptedLedger {
    submissions: Mutex<VecDeque<Result<LedgerReceipt, LedgerError>>>,
    registrations: Mutex<HashMap<String, LedgerDrug>>,
    submit_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl ScriptedLedger {
    fn confirming(receipt: LedgerReceipt) -> Self {
        let ledger = Self::default();
        ledger
            .submissions
            .lock()
            .expect("submissions lock")
            .push_back(Ok(receipt));
        ledger
    }

    fn with_registration(self, identifier: &str, drug: LedgerDrug) -> Self {
        self.registrations
            .lock()
            .expect("registrations lock")
            .insert(identifier.to_owned(), drug);
        self
    }

    fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn submit(&self, _submission: &DrugSubmission) -> Result<LedgerReceipt, LedgerError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submissions
            .lock()
            .expect("submissions lock")
            .pop_front()
            .unwrap_or_else(|| Err(LedgerError::unavailable("no scripted submission")))
    }

    async fn fetch(&self, confirmation_id: &DrugIdentifier) -> Result<LedgerDrug, LedgerError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.registrations
            .lock()
            .expect("registrations lock")
            .get(confirmation_id.as_ref())
            .cloned()
            .ok_or(LedgerError::NotFound)
    }
}

struct Harness {
    store: InMemoryStore,
    registration: DrugRegistrationService,
    lookup: LookupReconciler,
    acme: ManufacturerId,
}

fn paracetamol_expiry() -> ExpiryDate {
    ExpiryDate::new(NaiveDate::from_ymd_opt(2025, 1, 1).expect("date"))
}

fn ledger_paracetamol(name: &str) -> LedgerDrug {
    LedgerDrug {
        name: name.to_owned(),
        batch: "B100".to_owned(),
        manufacturer_name: "Acme".to_owned(),
        expiry_timestamp: 1_735_689_600,
    }
}

async fn harness(ledger: Arc<dyn LedgerClient>, approve: bool) -> Harness {
    let store = InMemoryStore::new();
    let admin = ManufacturerAdminService::new(
        Arc::new(store.manufacturers()),
        Arc::new(store.drugs()),
    )
    .with_credential_iterations(1);
    let acme = admin
        .create_manufacturer(
            ManufacturerDraft {
                name: "Acme".to_owned(),
                email: "ops@acme.test".to_owned(),
                phone: None,
                license_number: "LIC-1".to_owned(),
                gov_code: None,
            },
            "s3cret",
        )
        .await
        .expect("manufacturer created");
    if approve {
        admin
            .approve_manufacturer(&acme.id)
            .await
            .expect("manufacturer approved");
    }

    let artifacts = LinkArtifactGenerator::new(
        &Url::parse("https://verify.example.org").expect("base url"),
    )
    .expect("artifact generator");
    let registration = DrugRegistrationService::new(
        ledger.clone(),
        Arc::new(store.drugs()),
        Arc::new(store.manufacturers()),
        Arc::new(artifacts),
    );
    let lookup = LookupReconciler::new(ledger, Arc::new(store.drugs()));

    Harness {
        store,
        registration,
        lookup,
        acme: acme.id,
    }
}

fn paracetamol(manufacturer_id: ManufacturerId) -> DrugRegistrationRequest {
    DrugRegistrationRequest {
        manufacturer_id,
        name: DrugName::new("Paracetamol").expect("name"),
        batch: BatchCode::new("B100").expect("batch"),
        expiry: paracetamol_expiry(),
    }
}

#[fixture]
fn confirmed_receipt() -> LedgerReceipt {
    LedgerReceipt {
        confirmation_id: TX_HASH.to_owned(),
        drug_id: Some("7".to_owned()),
    }
}

#[rstest]
#[tokio::test]
async fn ledger_down_registration_is_found_in_the_store() {
    let h = harness(Arc::new(DisabledLedgerClient), true).await;

    let response = h
        .registration
        .register_drug(&paracetamol(h.acme))
        .await
        .expect("registered");

    assert_eq!(response.result.identifier.as_ref(), FALLBACK_ID);
    assert_eq!(response.result.origin, IdentifierOrigin::Fallback);
    assert_eq!(response.result.ledger_confirmation, None);
    assert_eq!(
        response.verification_url,
        format!("https://verify.example.org/verify/result/?tx_hash={FALLBACK_ID}")
    );

    let found = h.lookup.lookup(FALLBACK_ID).await.expect("found");
    assert_eq!(found.name, "Paracetamol");
    assert_eq!(found.batch, "B100");
    assert_eq!(found.manufacturer_name, "Acme");
    assert_eq!(found.expiry, paracetamol_expiry());
    assert_eq!(found.source, LookupSource::Store);
}

#[rstest]
#[tokio::test]
async fn first_save_attaches_the_verification_artifact() {
    let h = harness(Arc::new(DisabledLedgerClient), true).await;
    h.registration
        .register_drug(&paracetamol(h.acme))
        .await
        .expect("registered");

    let identifier = DrugIdentifier::parse(FALLBACK_ID).expect("identifier");
    let stored = h
        .store
        .drugs()
        .find_by_identifier(&identifier)
        .await
        .expect("query")
        .expect("stored");
    assert_eq!(
        stored.verification_artifact,
        Some(format!(
            "https://verify.example.org/verify/result/?tx_hash={FALLBACK_ID}"
        ))
    );
}

#[rstest]
#[tokio::test]
async fn registering_the_same_batch_twice_conflicts() {
    let h = harness(Arc::new(DisabledLedgerClient), true).await;
    h.registration
        .register_drug(&paracetamol(h.acme))
        .await
        .expect("first registration");

    let err = h
        .registration
        .register(&paracetamol(h.acme))
        .await
        .expect_err("duplicate");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(h.store.drugs().list().await.expect("list").len(), 1);
}

#[rstest]
#[tokio::test]
async fn confirmed_registration_is_keyed_by_the_transaction_hash(confirmed_receipt: LedgerReceipt) {
    let ledger = Arc::new(
        ScriptedLedger::confirming(confirmed_receipt)
            .with_registration(TX_HASH, ledger_paracetamol("Paracetamol (ledger copy)")),
    );
    let h = harness(ledger.clone(), true).await;

    let response = h
        .registration
        .register_drug(&paracetamol(h.acme))
        .await
        .expect("registered");
    assert_eq!(response.result.identifier.as_ref(), TX_HASH);
    assert_eq!(response.result.origin, IdentifierOrigin::Ledger);
    assert_eq!(ledger.submit_calls(), 1);

    let found = h.lookup.lookup(TX_HASH).await.expect("found");
    assert_eq!(found.name, "Paracetamol", "store wins over the ledger");
    assert_eq!(found.source, LookupSource::Store);
    assert_eq!(ledger.fetch_calls(), 1);
}

#[rstest]
#[tokio::test]
async fn confirmation_without_a_drug_id_falls_back_and_keeps_the_hash() {
    let ledger = Arc::new(ScriptedLedger::confirming(LedgerReceipt {
        confirmation_id: TX_HASH.to_owned(),
        drug_id: None,
    }));
    let h = harness(ledger, true).await;

    let response = h
        .registration
        .register_drug(&paracetamol(h.acme))
        .await
        .expect("registered");

    assert_eq!(response.result.identifier.as_ref(), FALLBACK_ID);
    assert_eq!(response.result.origin, IdentifierOrigin::Fallback);
    let confirmation = response.result.ledger_confirmation.expect("kept");
    assert_eq!(confirmation.confirmation_id, TX_HASH);
}

#[rstest]
#[case(LedgerError::unavailable("connection refused"))]
#[case(LedgerError::timeout(120_000_u64))]
#[case(LedgerError::rejected("execution reverted"))]
#[tokio::test]
async fn every_ledger_failure_falls_back(#[case] failure: LedgerError) {
    let ledger = ScriptedLedger::default();
    ledger
        .submissions
        .lock()
        .expect("submissions lock")
        .push_back(Err(failure));
    let h = harness(Arc::new(ledger), true).await;

    let response = h
        .registration
        .register_drug(&paracetamol(h.acme))
        .await
        .expect("registered");

    assert_eq!(response.result.identifier.as_ref(), FALLBACK_ID);
    assert!(h.lookup.lookup(FALLBACK_ID).await.is_ok());
}

#[rstest]
#[tokio::test]
async fn ledger_only_registration_is_served_from_the_ledger() {
    let ledger = Arc::new(
        ScriptedLedger::default().with_registration(TX_HASH, ledger_paracetamol("Paracetamol")),
    );
    let h = harness(ledger, true).await;

    let found = h.lookup.lookup(TX_HASH).await.expect("found");

    assert_eq!(found.source, LookupSource::Ledger);
    assert_eq!(found.expiry, paracetamol_expiry());
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("0x1234")]
#[case("not-an-identifier")]
#[tokio::test]
async fn malformed_identifiers_touch_neither_source(#[case] raw: &str) {
    let ledger = Arc::new(ScriptedLedger::default());
    let h = harness(ledger.clone(), true).await;

    let err = h.lookup.lookup(raw).await.expect_err("invalid");

    assert!(matches!(err, LookupError::InvalidIdentifier(_)));
    assert_eq!(ledger.fetch_calls(), 0);
}

#[rstest]
#[tokio::test]
async fn unknown_identifier_is_not_found() {
    let h = harness(Arc::new(ScriptedLedger::default()), true).await;

    let err = h.lookup.lookup(FALLBACK_ID).await.expect_err("missing");

    assert!(matches!(err, LookupError::NotFound));
}

#[rstest]
#[tokio::test]
async fn unverified_manufacturer_never_reaches_the_ledger() {
    let ledger = Arc::new(ScriptedLedger::default());
    let h = harness(ledger.clone(), false).await;

    let err = h
        .registration
        .register_drug(&paracetamol(h.acme))
        .await
        .expect_err("unverified");

    assert!(matches!(err, RegistrationError::UnverifiedManufacturer));
    assert_eq!(ledger.submit_calls(), 0);
    assert!(h.store.drugs().list().await.expect("list").is_empty());
}

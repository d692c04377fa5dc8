//! Builders wiring repositories and services into the HTTP state.

use std::sync::Arc;

use actix_web::web;
use tracing::warn;

use medverify::domain::ports::{DrugRepository, ManufacturerRepository};
use medverify::domain::{DrugRegistrationService, LookupReconciler, ManufacturerLoginService};
use medverify::inbound::http::state::HttpState;
use medverify::outbound::artifacts::LinkArtifactGenerator;
use medverify::outbound::memory::InMemoryStore;
use medverify::outbound::persistence::{DieselDrugRepository, DieselManufacturerRepository};

use super::ServerConfig;

type Repositories = (Arc<dyn DrugRepository>, Arc<dyn ManufacturerRepository>);

/// Use the database when a pool is configured, otherwise a fresh in-memory
/// store.
fn build_repositories(config: &ServerConfig) -> Repositories {
    match &config.db_pool {
        Some(pool) => (
            Arc::new(DieselDrugRepository::new(pool.clone())),
            Arc::new(DieselManufacturerRepository::new(pool.clone())),
        ),
        None => {
            warn!("no database configured; registrations are kept in memory");
            let store = InMemoryStore::new();
            (Arc::new(store.drugs()), Arc::new(store.manufacturers()))
        }
    }
}

/// # Errors
///
/// Fails when the public base URL cannot anchor verification links.
pub fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let (drugs, manufacturers) = build_repositories(config);
    let artifacts = LinkArtifactGenerator::new(&config.public_base)
        .map_err(|err| std::io::Error::other(format!("verification links: {err}")))?;

    let login = Arc::new(ManufacturerLoginService::new(manufacturers.clone()));
    let registration = Arc::new(DrugRegistrationService::new(
        config.ledger.clone(),
        drugs.clone(),
        manufacturers,
        Arc::new(artifacts),
    ));
    let verification = Arc::new(LookupReconciler::new(config.ledger.clone(), drugs));

    Ok(web::Data::new(HttpState::new(login, registration, verification)))
}

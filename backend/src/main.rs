//! Backend entry-point: loads settings, prepares the store and the ledger,
//! and serves the REST API.

mod server;

use std::sync::Arc;

use actix_web::cookie::Key;
use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use medverify::domain::ports::{DisabledLedgerClient, LedgerClient};
use medverify::inbound::http::health::HealthState;
use medverify::outbound::ledger::{
    HttpRpcTransport, JsonRpcLedgerClient, LedgerClientConfig, LedgerConnection,
};
use medverify::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use medverify::settings::{AppSettings, LedgerSettings};
use server::{ServerConfig, create_server};

fn io_error(context: &str, error: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {error}"))
}

fn load_session_key(settings: &AppSettings) -> std::io::Result<Key> {
    let key_path = settings.session_key_file();
    match std::fs::read(&key_path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(e) => {
            if cfg!(debug_assertions) || settings.session_allow_ephemeral {
                warn!(path = %key_path.display(), error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(io_error(
                    &format!("failed to read session key at {}", key_path.display()),
                    e,
                ))
            }
        }
    }
}

async fn connect_store(database_url: &str) -> std::io::Result<DbPool> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&url))
        .await
        .map_err(|err| io_error("migration task failed", err))?
        .map_err(|err| io_error("database migrations", err))?;
    info!(applied, "database schema up to date");

    DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(|err| io_error("database pool", err))
}

/// Probe the node once; an unreachable node leaves registrations on the
/// fallback path until restart.
async fn connect_ledger(ledger: LedgerSettings) -> std::io::Result<Arc<dyn LedgerClient>> {
    let transport = HttpRpcTransport::new(ledger.rpc_url, ledger.request_timeout)
        .map_err(|err| io_error("ledger transport", err))?;
    let connection = Arc::new(LedgerConnection::new(Arc::new(transport)));
    connection.initialise().await;

    let config = LedgerClientConfig::new(ledger.contract_address)
        .with_confirmation_timeout(ledger.confirmation_timeout)
        .with_poll_interval(ledger.poll_interval);
    let client =
        JsonRpcLedgerClient::new(connection, config).map_err(|err| io_error("ledger client", err))?;
    Ok(Arc::new(client))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|err| io_error("configuration", err))?;
    let key = load_session_key(&settings)?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|err| io_error("configuration", err))?;
    let public_base = settings
        .public_base_url()
        .map_err(|err| io_error("configuration", err))?;

    let mut config = ServerConfig::new(key, settings.cookie_secure(), bind_addr, public_base);

    if let Some(database_url) = settings.database_url.as_deref() {
        config = config.with_db_pool(connect_store(database_url).await?);
    }

    let ledger: Arc<dyn LedgerClient> = match settings
        .ledger()
        .map_err(|err| io_error("configuration", err))?
    {
        Some(ledger) => connect_ledger(ledger).await?,
        None => {
            info!("ledger disabled; every registration uses a fallback identifier");
            Arc::new(DisabledLedgerClient)
        }
    };
    config = config.with_ledger(ledger);

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting HTTP server");
    create_server(health_state, config)?.await
}

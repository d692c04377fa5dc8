//! Embedded PostgreSQL for integration tests.
//!
//! One cluster is shared per test binary. Each test gets its own database
//! cloned from a template that already carries the migrations, so suites
//! never see each other's rows and the schema cannot drift from
//! `backend/migrations`.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use medverify::outbound::persistence::run_pending_migrations;
use pg_embedded_setup_unpriv::test_support::{hash_directory, shared_cluster_handle};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use uuid::Uuid;

static BOOTSTRAP_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const TEMPLATE_NAME_PREFIX: &str = "medverify_template";
const STABLE_PASSWORD: &str = "medverify_embedded_test";

fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

fn pg_embed_target_dir() -> PathBuf {
    if let Some(target_dir) = std::env::var_os("CARGO_TARGET_DIR") {
        return PathBuf::from(target_dir).join("pg-embed");
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("target")
        .join("pg-embed")
}

/// Environment the cluster bootstrap needs but the caller did not provide.
///
/// Installation and data directories default to `/var/tmp`, which sandboxed
/// runs cannot write, so both move under the target directory. The password
/// is pinned so a reused data directory keeps accepting it.
fn bootstrap_overrides() -> Result<Vec<(&'static str, Option<String>)>, String> {
    let mut overrides = Vec::new();
    if std::env::var_os("PG_RUNTIME_DIR").is_none() || std::env::var_os("PG_DATA_DIR").is_none() {
        let base = pg_embed_target_dir().join(format!("cluster-{}", std::process::id()));
        let runtime_dir = base.join("install");
        let data_dir = base.join("data");
        std::fs::create_dir_all(&runtime_dir).map_err(|err| err.to_string())?;
        std::fs::create_dir_all(&data_dir).map_err(|err| err.to_string())?;
        overrides.push(("PG_RUNTIME_DIR", Some(runtime_dir.to_string_lossy().into_owned())));
        overrides.push(("PG_DATA_DIR", Some(data_dir.to_string_lossy().into_owned())));
    }
    if std::env::var_os("PG_PASSWORD").is_none() {
        overrides.push(("PG_PASSWORD", Some(STABLE_PASSWORD.to_owned())));
    }
    Ok(overrides)
}

/// The per-binary cluster, started on first use.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    let _bootstrap = BOOTSTRAP_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());
    let _env = env_lock::lock_env(bootstrap_overrides()?);
    shared_cluster_handle().map_err(|err| format!("start embedded cluster: {err:?}"))
}

fn template_database_name() -> Result<String, String> {
    let hash =
        hash_directory(migrations_dir()).map_err(|err| format!("hash migrations: {err}"))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

/// Creates or reuses a template database with every migration applied.
fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, String> {
    let template_name = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template_name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(template_name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        let url = cluster.connection().database_url(&template_name);
        run_pending_migrations(&url).map_err(|err| format!("migrate template: {err}"))?;
    }

    Ok(template_name)
}

/// Provisions a fresh database cloned from the migration template.
pub fn provision_database(cluster: &ClusterHandle) -> Result<TemporaryDatabase, String> {
    let template_name = ensure_template_database(cluster)?;
    let db_name = format!("test_{}", Uuid::new_v4());
    cluster
        .temporary_database_from_template(db_name.as_str(), template_name.as_str())
        .map_err(|err| format!("create database from template: {err:?}"))
}

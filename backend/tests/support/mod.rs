//! Shared helpers for integration suites that need a real PostgreSQL.
//!
//! Suites under `backend/tests/` compile as separate crates; those that talk
//! to the database declare `mod support;` and use the helpers re-exported
//! here.

pub mod embedded_postgres;

pub use embedded_postgres::{provision_database, shared_cluster};

/// Returns true when `SKIP_TEST_CLUSTER` is set to "1", "true", or "yes"
/// (case-insensitive).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Handles embedded cluster setup failures consistently across suites.
///
/// With `SKIP_TEST_CLUSTER` set, prints a skip marker and returns `None`.
/// Otherwise panics so CI breakage is not masked.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

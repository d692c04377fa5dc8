//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **ledger**: Ethereum JSON-RPC client for the drug registry contract
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: in-process repositories sharing one store, for tests and
//!   database-less runs
//! - **artifacts**: verification links and the artifacts that carry them
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod artifacts;
pub mod ledger;
pub mod memory;
pub mod persistence;

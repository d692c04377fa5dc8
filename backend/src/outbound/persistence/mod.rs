//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories only translate between row structs and domain types. Row
//! structs (`models`) and table definitions (`schema`) stay private to this
//! module, and every database failure is mapped onto the owning port's
//! error type.
//!
//! ```ignore
//! use medverify::outbound::persistence::{DbPool, DieselDrugRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/medverify")).await?;
//! let drugs = DieselDrugRepository::new(pool);
//! ```

mod diesel_drug_repository;
mod diesel_manufacturer_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_drug_repository::DieselDrugRepository;
pub use diesel_manufacturer_repository::DieselManufacturerRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};

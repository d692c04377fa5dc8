//! Shared classification of pool and Diesel failures.
//!
//! Repositories turn a [`StoreFailure`] into their own port error so
//! constraint names never leak past the adapter.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreFailure {
    Connection(String),
    Query(String),
    UniqueViolation { constraint: Option<String> },
    ForeignKeyViolation,
}

pub(crate) fn classify_pool_error(error: PoolError) -> StoreFailure {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            StoreFailure::Connection(message)
        }
    }
}

pub(crate) fn classify_diesel_error(error: DieselError) -> StoreFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => StoreFailure::Query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => StoreFailure::Query("database query error".to_owned()),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            StoreFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            StoreFailure::ForeignKeyViolation
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            StoreFailure::Connection("database connection error".to_owned())
        }
        _ => StoreFailure::Query("database error".to_owned()),
    }
}

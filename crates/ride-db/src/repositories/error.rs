//! Error handling utilities for repositories

use ride_core::{DomainError, RecordKey};
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// A conditional write found the stored record in an unexpected state
pub fn precondition_failed(key: RecordKey) -> DomainError {
    DomainError::PreconditionFailed(format!("{key} was modified concurrently"))
}

/// Convert a row count into an i64 LIMIT
pub fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

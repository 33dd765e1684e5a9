//! Storage errors.

use nestegg_core::budget::BudgetError;
use nestegg_core::transaction::TransactionError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

/// Result alias for repository calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by repositories.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A budget rule rejected the operation.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// A transaction rule rejected the operation.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Another writer got there first (unique index or stale row).
    #[error("Conflicting concurrent write: {0}")]
    Conflict(String),

    /// A stored row could not be decoded.
    #[error("Stored {table} row {id} is unreadable: {reason}")]
    Corrupt {
        /// Table name.
        table: &'static str,
        /// Row id.
        id: Uuid,
        /// Decode failure.
        reason: String,
    },

    /// The database could not be reached; the call may be retried.
    #[error("Database temporarily unavailable: {0}")]
    Transient(String),

    /// Any other database failure.
    #[error("Database error: {0}")]
    Database(DbErr),
}

impl StoreError {
    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub(crate) fn corrupt(table: &'static str, id: Uuid, err: impl std::fmt::Display) -> Self {
        Self::Corrupt {
            table,
            id,
            reason: err.to_string(),
        }
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        if matches!(err, DbErr::ConnectionAcquire(_) | DbErr::Conn(_)) {
            return Self::Transient(err.to_string());
        }
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return Self::Conflict(detail);
        }
        Self::Database(err)
    }
}

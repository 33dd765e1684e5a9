//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repositories for budgets, adjustments, transactions and category renames
//! - Row-level security scoping per household
//! - Database migrations
//! - Retry with backoff for transient failures

pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;
pub mod retry;
pub mod rls;

pub use error::{StoreError, StoreResult};
pub use repositories::{
    AdjustmentRepository, ApplyOutcome, CategoryRepository, LocalTransactionStore,
    MonthlyBudgetRepository, PersonalBudgetRepository, RenameReport, TransactionRepository,
    TransactionStore,
};
pub use retry::{RetryPolicy, with_retry};

use std::time::Duration;

use nestegg_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}

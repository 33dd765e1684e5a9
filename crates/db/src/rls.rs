//! Row-Level Security (RLS) context management.
//!
//! Every repository call runs inside one transaction whose
//! `app.current_household_id` setting scopes all tables to a household.
//!
//! # Usage
//!
//! ```ignore
//! use nestegg_db::rls::RlsConnection;
//!
//! let rls = RlsConnection::new(&db, household_id).await?;
//! let rows = personal_budgets::Entity::find().all(rls.transaction()).await?;
//! rls.commit().await?;
//! ```

use nestegg_shared::types::HouseholdId;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};

fn context_sql(household_id: HouseholdId) -> String {
    format!("SET LOCAL app.current_household_id = '{household_id}'")
}

/// A database transaction with the household RLS context set.
///
/// Dropping it without calling [`RlsConnection::commit`] rolls back.
pub struct RlsConnection {
    txn: DatabaseTransaction,
}

impl RlsConnection {
    /// Begins a transaction and sets `app.current_household_id` with
    /// `SET LOCAL`, which scopes the setting to this transaction only.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the RLS
    /// context cannot be set.
    pub async fn new(db: &DatabaseConnection, household_id: HouseholdId) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        // HouseholdId is a parsed UUID, so interpolating it cannot inject SQL.
        txn.execute_unprepared(&context_sql(household_id)).await?;
        Ok(Self { txn })
    }

    /// The underlying transaction, for executing queries.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }
}

/// Extension trait for `DatabaseConnection` to easily create RLS-enabled connections.
#[async_trait::async_trait]
pub trait RlsExt {
    /// Creates an RLS-enabled connection for the household.
    ///
    /// # Errors
    ///
    /// Returns an error if the RLS connection cannot be created.
    async fn with_rls(&self, household_id: HouseholdId) -> Result<RlsConnection, DbErr>;
}

#[async_trait::async_trait]
impl RlsExt for DatabaseConnection {
    async fn with_rls(&self, household_id: HouseholdId) -> Result<RlsConnection, DbErr> {
        RlsConnection::new(self, household_id).await
    }
}

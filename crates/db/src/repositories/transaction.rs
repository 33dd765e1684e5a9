//! Transaction storage.
//!
//! [`TransactionStore`] is the seam between the HTTP layer and storage:
//! signed-in households use [`TransactionRepository`] (Postgres), guests use
//! [`super::LocalTransactionStore`].

use async_trait::async_trait;
use chrono::Utc;
use nestegg_core::transaction::{MonthWindow, Transaction, TransactionError, TransactionInput};
use nestegg_shared::types::{HouseholdId, TransactionId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::{from_db_time, to_db_time};
use crate::entities::transactions;
use crate::error::StoreResult;
use crate::rls::RlsExt;

/// Storage for one owner's transactions.
///
/// `owner` is a household id for persisted data, or a guest id for the
/// in-memory store.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Validates and stores a new transaction.
    async fn create(
        &self,
        owner: Uuid,
        created_by: Option<Uuid>,
        input: TransactionInput,
    ) -> StoreResult<Transaction>;

    /// Replaces a transaction's editable fields.
    async fn update(
        &self,
        owner: Uuid,
        id: TransactionId,
        input: TransactionInput,
    ) -> StoreResult<Transaction>;

    /// Deletes a transaction.
    async fn delete(&self, owner: Uuid, id: TransactionId) -> StoreResult<()>;

    /// Gets one transaction.
    async fn get(&self, owner: Uuid, id: TransactionId) -> StoreResult<Transaction>;

    /// Lists transactions, newest date first, optionally limited to a date
    /// window.
    async fn list(&self, owner: Uuid, window: Option<MonthWindow>) -> StoreResult<Vec<Transaction>>;
}

fn to_domain(model: transactions::Model) -> Transaction {
    Transaction {
        id: model.id,
        date: model.transaction_date,
        amount: model.amount,
        category: model.category,
        transaction_type: model.transaction_type.into(),
        family_member: model.family_member,
        description: model.description,
        created_by: model.created_by,
        created_at: from_db_time(model.created_at),
        updated_at: from_db_time(model.updated_at),
    }
}

fn to_active_model(household: Uuid, transaction: &Transaction) -> transactions::ActiveModel {
    transactions::ActiveModel {
        id: Set(transaction.id),
        household_id: Set(household),
        transaction_date: Set(transaction.date),
        amount: Set(transaction.amount),
        category: Set(transaction.category.clone()),
        transaction_type: Set(transaction.transaction_type.into()),
        family_member: Set(transaction.family_member.clone()),
        description: Set(transaction.description.clone()),
        created_by: Set(transaction.created_by),
        created_at: Set(to_db_time(transaction.created_at)),
        updated_at: Set(to_db_time(transaction.updated_at)),
    }
}

/// Postgres-backed transaction store.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        owner: Uuid,
        id: TransactionId,
    ) -> StoreResult<transactions::Model> {
        let row = transactions::Entity::find_by_id(id.into_inner())
            .filter(transactions::Column::HouseholdId.eq(owner))
            .one(txn)
            .await?;
        Ok(row.ok_or(TransactionError::NotFound(id.into_inner()))?)
    }
}

#[async_trait]
impl TransactionStore for TransactionRepository {
    async fn create(
        &self,
        owner: Uuid,
        created_by: Option<Uuid>,
        input: TransactionInput,
    ) -> StoreResult<Transaction> {
        let input = input.validate()?;
        let transaction = Transaction::from_input(input, created_by, Utc::now());

        let rls = self.db.with_rls(HouseholdId::from_uuid(owner)).await?;
        to_active_model(owner, &transaction)
            .insert(rls.transaction())
            .await?;
        rls.commit().await?;

        tracing::debug!(household_id = %owner, transaction_id = %transaction.id, "Transaction created");
        Ok(transaction)
    }

    async fn update(
        &self,
        owner: Uuid,
        id: TransactionId,
        input: TransactionInput,
    ) -> StoreResult<Transaction> {
        let input = input.validate()?;

        let rls = self.db.with_rls(HouseholdId::from_uuid(owner)).await?;
        let txn = rls.transaction();
        let mut transaction = to_domain(self.find(txn, owner, id).await?);
        transaction.apply_edit(input, Utc::now());
        to_active_model(owner, &transaction).update(txn).await?;
        rls.commit().await?;
        Ok(transaction)
    }

    async fn delete(&self, owner: Uuid, id: TransactionId) -> StoreResult<()> {
        let rls = self.db.with_rls(HouseholdId::from_uuid(owner)).await?;
        let result = transactions::Entity::delete_many()
            .filter(transactions::Column::Id.eq(id.into_inner()))
            .filter(transactions::Column::HouseholdId.eq(owner))
            .exec(rls.transaction())
            .await?;
        if result.rows_affected == 0 {
            return Err(TransactionError::NotFound(id.into_inner()).into());
        }
        rls.commit().await?;
        Ok(())
    }

    async fn get(&self, owner: Uuid, id: TransactionId) -> StoreResult<Transaction> {
        let rls = self.db.with_rls(HouseholdId::from_uuid(owner)).await?;
        let row = self.find(rls.transaction(), owner, id).await?;
        rls.commit().await?;
        Ok(to_domain(row))
    }

    async fn list(&self, owner: Uuid, window: Option<MonthWindow>) -> StoreResult<Vec<Transaction>> {
        let mut query =
            transactions::Entity::find().filter(transactions::Column::HouseholdId.eq(owner));
        if let Some(window) = window {
            query = query
                .filter(transactions::Column::TransactionDate.gte(window.start))
                .filter(transactions::Column::TransactionDate.lte(window.end));
        }

        let rls = self.db.with_rls(HouseholdId::from_uuid(owner)).await?;
        let rows = query
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt)
            .all(rls.transaction())
            .await?;
        rls.commit().await?;
        Ok(rows.into_iter().map(to_domain).collect())
    }
}

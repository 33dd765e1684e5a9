//! In-memory transaction store for guests.
//!
//! Guest data lives only as long as the process and is keyed by the id the
//! client sends in `X-Guest-Id`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use nestegg_core::transaction::{MonthWindow, Transaction, TransactionError, TransactionInput};
use nestegg_shared::types::TransactionId;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::transaction::TransactionStore;
use crate::error::StoreResult;

/// Transactions kept in process memory, one list per guest.
#[derive(Debug, Clone, Default)]
pub struct LocalTransactionStore {
    owners: Arc<RwLock<HashMap<Uuid, Vec<Transaction>>>>,
}

impl LocalTransactionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops everything stored for `owner`.
    pub async fn clear(&self, owner: Uuid) {
        self.owners.write().await.remove(&owner);
    }
}

fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[async_trait]
impl TransactionStore for LocalTransactionStore {
    async fn create(
        &self,
        owner: Uuid,
        created_by: Option<Uuid>,
        input: TransactionInput,
    ) -> StoreResult<Transaction> {
        let input = input.validate()?;
        let transaction = Transaction::from_input(input, created_by, Utc::now());
        self.owners
            .write()
            .await
            .entry(owner)
            .or_default()
            .push(transaction.clone());
        Ok(transaction)
    }

    async fn update(
        &self,
        owner: Uuid,
        id: TransactionId,
        input: TransactionInput,
    ) -> StoreResult<Transaction> {
        let input = input.validate()?;
        let mut owners = self.owners.write().await;
        let transaction = owners
            .get_mut(&owner)
            .and_then(|list| list.iter_mut().find(|t| t.id == id.into_inner()))
            .ok_or(TransactionError::NotFound(id.into_inner()))?;
        transaction.apply_edit(input, Utc::now());
        Ok(transaction.clone())
    }

    async fn delete(&self, owner: Uuid, id: TransactionId) -> StoreResult<()> {
        let mut owners = self.owners.write().await;
        let list = owners
            .get_mut(&owner)
            .ok_or(TransactionError::NotFound(id.into_inner()))?;
        let before = list.len();
        list.retain(|t| t.id != id.into_inner());
        if list.len() == before {
            return Err(TransactionError::NotFound(id.into_inner()).into());
        }
        Ok(())
    }

    async fn get(&self, owner: Uuid, id: TransactionId) -> StoreResult<Transaction> {
        let owners = self.owners.read().await;
        let transaction = owners
            .get(&owner)
            .and_then(|list| list.iter().find(|t| t.id == id.into_inner()))
            .ok_or(TransactionError::NotFound(id.into_inner()))?;
        Ok(transaction.clone())
    }

    async fn list(&self, owner: Uuid, window: Option<MonthWindow>) -> StoreResult<Vec<Transaction>> {
        let owners = self.owners.read().await;
        let mut transactions: Vec<Transaction> = owners
            .get(&owner)
            .map(|list| {
                list.iter()
                    .filter(|t| window.is_none_or(|w| w.contains(t.date)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use chrono::NaiveDate;
    use nestegg_core::period::YearMonth;
    use nestegg_core::transaction::TransactionType;
    use rust_decimal_macros::dec;

    fn input(day: u32, category: &str) -> TransactionInput {
        TransactionInput {
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            amount: dec!(12.50),
            category: category.to_string(),
            transaction_type: TransactionType::Expense,
            family_member: Some("  Ana ".to_string()),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_validates_and_normalizes() {
        let store = LocalTransactionStore::new();
        let guest = Uuid::now_v7();

        let created = store.create(guest, None, input(3, "  Food ")).await.unwrap();
        assert_eq!(created.category, "Food");
        assert_eq!(created.family_member.as_deref(), Some("Ana"));

        let mut bad = input(3, "Food");
        bad.amount = dec!(0);
        let err = store.create(guest, None, bad).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Transaction(TransactionError::NonPositiveAmount(_))
        ));
    }

    #[tokio::test]
    async fn test_owners_are_isolated() {
        let store = LocalTransactionStore::new();
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();

        let created = store.create(alice, None, input(1, "Food")).await.unwrap();

        assert!(store.list(bob, None).await.unwrap().is_empty());
        let id = TransactionId::from_uuid(created.id);
        assert!(store.get(bob, id).await.is_err());
        assert!(store.delete(bob, id).await.is_err());
        assert_eq!(store.list(alice, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_window_and_order() {
        let store = LocalTransactionStore::new();
        let guest = Uuid::now_v7();
        for day in [5, 20, 12] {
            store.create(guest, None, input(day, "Food")).await.unwrap();
        }
        let mut february = input(1, "Food");
        february.date = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        store.create(guest, None, february).await.unwrap();

        let march = MonthWindow::of(YearMonth::new(2026, 3).unwrap());
        let listed = store.list(guest, Some(march)).await.unwrap();

        let days: Vec<String> = listed.iter().map(|t| t.date.format("%d").to_string()).collect();
        assert_eq!(days, vec!["20", "12", "05"]);
        assert_eq!(store.list(guest, None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = LocalTransactionStore::new();
        let guest = Uuid::now_v7();
        let created = store.create(guest, None, input(1, "Food")).await.unwrap();
        let id = TransactionId::from_uuid(created.id);

        let updated = store.update(guest, id, input(2, "Groceries")).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.category, "Groceries");
        assert_eq!(updated.created_at, created.created_at);

        store.delete(guest, id).await.unwrap();
        let err = store.get(guest, id).await.unwrap_err();
        assert!(matches!(err, StoreError::Transaction(TransactionError::NotFound(_))));
        assert!(store.delete(guest, id).await.is_err());
    }

    #[tokio::test]
    async fn test_clear_drops_guest_data() {
        let store = LocalTransactionStore::new();
        let guest = Uuid::now_v7();
        store.create(guest, None, input(1, "Food")).await.unwrap();

        store.clear(guest).await;

        assert!(store.list(guest, None).await.unwrap().is_empty());
    }
}

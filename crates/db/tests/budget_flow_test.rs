//! End-to-end repository tests for templates, months and adjustments.
//!
//! Requires a running PostgreSQL; run with `cargo test -- --ignored`.

mod common;

use chrono::Utc;
use nestegg_core::budget::{BudgetError, DiffKind, ScheduleAdjustment, UpdatePersonalBudget};
use nestegg_core::period::YearMonth;
use nestegg_db::{
    AdjustmentRepository, CategoryRepository, MonthlyBudgetRepository, PersonalBudgetRepository,
    StoreError,
};
use nestegg_shared::types::PersonalBudgetId;
use rust_decimal_macros::dec;

fn this_month() -> YearMonth {
    YearMonth::from_date(Utc::now().date_naive())
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_limit_change_creates_new_active_version() {
    let db = common::setup().await;
    let (household, user) = common::household();
    let budgets = PersonalBudgetRepository::new(db.clone());

    let v1 = budgets
        .create(household, user, common::template("Family", &[("Food", dec!(400))]))
        .await
        .unwrap();
    assert_eq!(v1.version, 1);

    let mut categories = v1.categories.clone();
    categories.get_mut("Food").unwrap().monthly_limit = dec!(450);
    let v2 = budgets
        .update(
            household,
            user,
            PersonalBudgetId::from_uuid(v1.id),
            UpdatePersonalBudget {
                categories: Some(categories),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(v2.version, 2);
    assert!(v2.is_active);
    let all = budgets.list(household).await.unwrap();
    assert_eq!(all.iter().filter(|b| b.is_active).count(), 1);
    assert_eq!(budgets.get_active(household).await.unwrap().id, v2.id);

    let renamed = budgets
        .update(
            household,
            user,
            PersonalBudgetId::from_uuid(v2.id),
            UpdatePersonalBudget {
                name: Some("Household".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.id, v2.id);
    assert_eq!(renamed.version, 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_deleting_active_promotes_highest_version() {
    let db = common::setup().await;
    let (household, user) = common::household();
    let budgets = PersonalBudgetRepository::new(db.clone());

    let v1 = budgets
        .create(household, user, common::template("A", &[("Food", dec!(1))]))
        .await
        .unwrap();
    let v2 = budgets
        .create(household, user, common::template("B", &[("Food", dec!(2))]))
        .await
        .unwrap();

    let promoted = budgets
        .delete(household, PersonalBudgetId::from_uuid(v2.id))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(promoted.id, v1.id);
    assert!(budgets.get_active(household).await.unwrap().is_active);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_month_is_snapshot_and_lock_blocks_edits() {
    let db = common::setup().await;
    let (household, user) = common::household();
    let budgets = PersonalBudgetRepository::new(db.clone());
    let months = MonthlyBudgetRepository::new(db.clone());

    let missing = months.get_or_sync(household, this_month()).await.unwrap_err();
    assert!(matches!(missing, StoreError::Budget(BudgetError::NoActiveBudget)));

    budgets
        .create(household, user, common::template("Family", &[("Food", dec!(400)), ("Fun", dec!(100))]))
        .await
        .unwrap();
    let month = months.get_or_sync(household, this_month()).await.unwrap();
    assert_eq!(month.categories["Food"].monthly_limit, dec!(400));

    let (updated, previous) = months
        .update_category_limit(household, this_month(), "Fun", dec!(0), Some(month.revision))
        .await
        .unwrap();
    assert_eq!(previous, dec!(100));
    assert_eq!(updated.adjustment_count, 1);

    let comparison = months.compare(household, this_month()).await.unwrap();
    assert_eq!(comparison.differences.len(), 1);
    assert_eq!(comparison.differences[0].kind, DiffKind::ReducedToZero);

    let stale = months
        .update_category_limit(household, this_month(), "Food", dec!(1), Some(month.revision))
        .await
        .unwrap_err();
    assert!(matches!(stale, StoreError::Budget(BudgetError::StaleRevision { .. })));

    let locked = months.lock(household, this_month()).await.unwrap();
    let again = months.lock(household, this_month()).await.unwrap();
    assert_eq!(locked.revision, again.revision);

    let err = months
        .update_category_limit(household, this_month(), "Food", dec!(1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Budget(BudgetError::MonthLocked(_))));
    assert!(months.resync(household, this_month()).await.is_err());

    months.unlock(household, this_month()).await.unwrap();
    let resynced = months.resync(household, this_month()).await.unwrap();
    assert_eq!(resynced.categories["Fun"].monthly_limit, dec!(100));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_adjustments_apply_once_and_not_before_due() {
    let db = common::setup().await;
    let (household, user) = common::household();
    let budgets = PersonalBudgetRepository::new(db.clone());
    let adjustments = AdjustmentRepository::new(db.clone());

    budgets
        .create(household, user, common::template("Family", &[("Food", dec!(400))]))
        .await
        .unwrap();
    let scheduled = adjustments
        .schedule(
            household,
            user,
            ScheduleAdjustment {
                category: "Food".into(),
                current_limit: dec!(400),
                new_limit: dec!(500),
                reason: Some("holidays".into()),
                target: Some(this_month()),
            },
        )
        .await
        .unwrap();

    let early = adjustments
        .apply(household, this_month().next())
        .await
        .unwrap_err();
    assert!(matches!(early, StoreError::Budget(BudgetError::AdjustmentNotDue(_))));

    let outcome = adjustments.apply(household, this_month()).await.unwrap();
    assert_eq!(outcome.applied, vec![scheduled.adjustment().id]);
    assert_eq!(outcome.monthly.categories["Food"].monthly_limit, dec!(500));

    let second = adjustments.apply(household, this_month()).await.unwrap();
    assert!(second.applied.is_empty());
    assert_eq!(second.monthly.revision, outcome.monthly.revision);

    let history = adjustments.category_history(household, "Food").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].change, dec!(100));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_rename_merges_everywhere() {
    let db = common::setup().await;
    let (household, user) = common::household();
    let budgets = PersonalBudgetRepository::new(db.clone());
    let months = MonthlyBudgetRepository::new(db.clone());
    let categories = CategoryRepository::new(db.clone());

    budgets
        .create(
            household,
            user,
            common::template("Family", &[("Food", dec!(400)), ("Groceries", dec!(100))]),
        )
        .await
        .unwrap();
    months.get_or_sync(household, this_month()).await.unwrap();
    months.lock(household, this_month()).await.unwrap();

    let report = categories.rename(household, "Food", "Groceries").await.unwrap();

    assert!(report.merged);
    assert_eq!(report.budgets, 1);
    assert_eq!(report.months, 1);
    let active = budgets.get_active(household).await.unwrap();
    assert_eq!(active.categories["Groceries"].monthly_limit, dec!(500));
    assert!(!active.categories.contains_key("Food"));

    let again = categories.rename(household, "Food", "Groceries").await.unwrap();
    assert_eq!(again.touched(), 0);
    assert!(!again.merged);
}

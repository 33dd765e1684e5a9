//! Monthly budget repository.
//!
//! A month's row is created lazily from the active template the first time
//! anything reads it. Every write is conditional on the revision that was
//! loaded, so two writers cannot silently overwrite each other.

use chrono::Utc;
use nestegg_core::budget::{BudgetComparison, BudgetError, MonthlyBudget, compare};
use nestegg_core::category::CategoryMap;
use nestegg_core::period::YearMonth;
use nestegg_shared::types::HouseholdId;
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
};

use super::{from_db_time, personal_budget, to_db_time};
use crate::entities::monthly_budgets;
use crate::error::{StoreError, StoreResult};
use crate::rls::RlsExt;

const TABLE: &str = "monthly_budgets";

pub(crate) fn to_domain(model: monthly_budgets::Model) -> StoreResult<MonthlyBudget> {
    let month = u32::try_from(model.month).map_err(|e| StoreError::corrupt(TABLE, model.id, e))?;
    let period =
        YearMonth::new(model.year, month).map_err(|e| StoreError::corrupt(TABLE, model.id, e))?;
    let categories: CategoryMap = serde_json::from_value(model.categories)
        .map_err(|e| StoreError::corrupt(TABLE, model.id, e))?;
    Ok(MonthlyBudget {
        id: model.id,
        household_id: model.household_id,
        period,
        categories,
        source_budget_id: model.source_budget_id,
        source_version: model.source_version,
        is_locked: model.is_locked,
        adjustment_count: model.adjustment_count,
        revision: model.revision,
        synced_at: from_db_time(model.synced_at),
        created_at: from_db_time(model.created_at),
        updated_at: from_db_time(model.updated_at),
    })
}

fn to_active_model(monthly: &MonthlyBudget) -> StoreResult<monthly_budgets::ActiveModel> {
    let categories = serde_json::to_value(&monthly.categories)
        .map_err(|e| StoreError::corrupt(TABLE, monthly.id, e))?;
    Ok(monthly_budgets::ActiveModel {
        id: Set(monthly.id),
        household_id: Set(monthly.household_id),
        year: Set(monthly.period.year()),
        month: Set(i32::try_from(monthly.period.month()).unwrap_or_default()),
        categories: Set(categories),
        source_budget_id: Set(monthly.source_budget_id),
        source_version: Set(monthly.source_version),
        is_locked: Set(monthly.is_locked),
        adjustment_count: Set(monthly.adjustment_count),
        revision: Set(monthly.revision),
        synced_at: Set(to_db_time(monthly.synced_at)),
        created_at: Set(to_db_time(monthly.created_at)),
        updated_at: Set(to_db_time(monthly.updated_at)),
    })
}

/// Loads a month and locks its row for the rest of the transaction.
pub(crate) async fn find_month<C: ConnectionTrait>(
    conn: &C,
    household: HouseholdId,
    period: YearMonth,
) -> StoreResult<Option<MonthlyBudget>> {
    monthly_budgets::Entity::find()
        .filter(monthly_budgets::Column::HouseholdId.eq(household.into_inner()))
        .filter(monthly_budgets::Column::Year.eq(period.year()))
        .filter(monthly_budgets::Column::Month.eq(i32::try_from(period.month()).unwrap_or_default()))
        .lock_exclusive()
        .one(conn)
        .await?
        .map(to_domain)
        .transpose()
}

/// Writes `monthly` back if the stored revision is still `expected_revision`.
pub(crate) async fn save_month<C: ConnectionTrait>(
    conn: &C,
    monthly: &MonthlyBudget,
    expected_revision: i32,
) -> StoreResult<()> {
    let result = monthly_budgets::Entity::update_many()
        .set(to_active_model(monthly)?)
        .filter(monthly_budgets::Column::Id.eq(monthly.id))
        .filter(monthly_budgets::Column::Revision.eq(expected_revision))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(StoreError::Conflict(format!(
            "monthly budget {} changed since revision {expected_revision}",
            monthly.period
        )));
    }
    Ok(())
}

/// Returns the month, snapshotting the active template if it has no row yet.
pub(crate) async fn get_or_sync_in<C: ConnectionTrait>(
    conn: &C,
    household: HouseholdId,
    period: YearMonth,
) -> StoreResult<MonthlyBudget> {
    if let Some(existing) = find_month(conn, household, period).await? {
        return Ok(existing);
    }

    let template = personal_budget::find_active(conn, household)
        .await?
        .ok_or(BudgetError::NoActiveBudget)?;
    let snapshot = MonthlyBudget::snapshot(period, &template, Utc::now());

    // A concurrent first read may have inserted the same month; keep theirs.
    monthly_budgets::Entity::insert(to_active_model(&snapshot)?)
        .on_conflict(
            OnConflict::columns([
                monthly_budgets::Column::HouseholdId,
                monthly_budgets::Column::Year,
                monthly_budgets::Column::Month,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    let stored = find_month(conn, household, period)
        .await?
        .ok_or_else(|| StoreError::Conflict(format!("monthly budget {period} vanished")))?;
    if stored.id == snapshot.id {
        tracing::info!(
            household_id = %household,
            period = %period,
            source_version = template.version,
            "Monthly budget synced from template"
        );
    }
    Ok(stored)
}

/// Monthly budget repository.
#[derive(Debug, Clone)]
pub struct MonthlyBudgetRepository {
    db: DatabaseConnection,
}

impl MonthlyBudgetRepository {
    /// Creates a new monthly budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the month, creating it from the active template on first use.
    ///
    /// # Errors
    ///
    /// Fails with `NoActiveBudget` when the month has no row and the
    /// household has no active template.
    pub async fn get_or_sync(
        &self,
        household: HouseholdId,
        period: YearMonth,
    ) -> StoreResult<MonthlyBudget> {
        let rls = self.db.with_rls(household).await?;
        let monthly = get_or_sync_in(rls.transaction(), household, period).await?;
        rls.commit().await?;
        Ok(monthly)
    }

    /// Changes one category's limit for this month only.
    ///
    /// Returns the updated month and the previous limit.
    pub async fn update_category_limit(
        &self,
        household: HouseholdId,
        period: YearMonth,
        category: &str,
        new_limit: Decimal,
        expected_revision: Option<i32>,
    ) -> StoreResult<(MonthlyBudget, Decimal)> {
        let rls = self.db.with_rls(household).await?;
        let txn = rls.transaction();

        let mut monthly = get_or_sync_in(txn, household, period).await?;
        let loaded = monthly.revision;
        let previous =
            monthly.update_category_limit(category, new_limit, expected_revision, Utc::now())?;
        save_month(txn, &monthly, loaded).await?;
        rls.commit().await?;

        tracing::info!(
            household_id = %household,
            period = %period,
            category,
            previous_limit = %previous,
            new_limit = %new_limit,
            "Monthly category limit changed"
        );
        Ok((monthly, previous))
    }

    /// Locks the month. Locking a locked month changes nothing.
    pub async fn lock(&self, household: HouseholdId, period: YearMonth) -> StoreResult<MonthlyBudget> {
        self.set_locked(household, period, true).await
    }

    /// Unlocks the month. Unlocking an unlocked month changes nothing.
    pub async fn unlock(
        &self,
        household: HouseholdId,
        period: YearMonth,
    ) -> StoreResult<MonthlyBudget> {
        self.set_locked(household, period, false).await
    }

    async fn set_locked(
        &self,
        household: HouseholdId,
        period: YearMonth,
        locked: bool,
    ) -> StoreResult<MonthlyBudget> {
        let rls = self.db.with_rls(household).await?;
        let txn = rls.transaction();

        let mut monthly = get_or_sync_in(txn, household, period).await?;
        let loaded = monthly.revision;
        let now = Utc::now();
        let changed = if locked {
            monthly.lock(now)
        } else {
            monthly.unlock(now)
        };
        if changed {
            save_month(txn, &monthly, loaded).await?;
            tracing::info!(household_id = %household, period = %period, locked, "Monthly budget lock changed");
        }
        rls.commit().await?;
        Ok(monthly)
    }

    /// Re-copies the active template into an unlocked month.
    pub async fn resync(
        &self,
        household: HouseholdId,
        period: YearMonth,
    ) -> StoreResult<MonthlyBudget> {
        let rls = self.db.with_rls(household).await?;
        let txn = rls.transaction();

        let mut monthly = get_or_sync_in(txn, household, period).await?;
        let template = personal_budget::find_active(txn, household)
            .await?
            .ok_or(BudgetError::NoActiveBudget)?;
        let loaded = monthly.revision;
        monthly.resync(&template, Utc::now())?;
        save_month(txn, &monthly, loaded).await?;
        rls.commit().await?;

        tracing::info!(
            household_id = %household,
            period = %period,
            source_version = template.version,
            "Monthly budget re-synced"
        );
        Ok(monthly)
    }

    /// Differences between the month and the active template.
    pub async fn compare(
        &self,
        household: HouseholdId,
        period: YearMonth,
    ) -> StoreResult<BudgetComparison> {
        let rls = self.db.with_rls(household).await?;
        let txn = rls.transaction();

        let monthly = get_or_sync_in(txn, household, period).await?;
        let template = personal_budget::find_active(txn, household)
            .await?
            .ok_or(BudgetError::NoActiveBudget)?;
        rls.commit().await?;
        Ok(compare(&monthly, &template)?)
    }
}

//! Scheduled adjustment repository.

use chrono::Utc;
use nestegg_core::budget::{
    self, AdjustmentStatus, BudgetAdjustment, BudgetError, CategoryActivity, HistoryEntry,
    MonthlyBudget, ScheduleAdjustment, Scheduled,
};
use nestegg_core::period::YearMonth;
use nestegg_shared::types::{AdjustmentId, HouseholdId, UserId};
use serde::Serialize;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::{from_db_time, monthly_budget, to_db_time};
use crate::entities::{budget_adjustments, sea_orm_active_enums};
use crate::error::{StoreError, StoreResult};
use crate::rls::RlsExt;

const TABLE: &str = "budget_adjustments";

/// Result of applying the due adjustments of one month.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    /// The month after the adjustments landed.
    pub monthly: MonthlyBudget,
    /// Adjustments that were applied, oldest first.
    pub applied: Vec<Uuid>,
}

fn to_domain(model: budget_adjustments::Model) -> StoreResult<BudgetAdjustment> {
    let month =
        u32::try_from(model.target_month).map_err(|e| StoreError::corrupt(TABLE, model.id, e))?;
    let target = YearMonth::new(model.target_year, month)
        .map_err(|e| StoreError::corrupt(TABLE, model.id, e))?;
    Ok(BudgetAdjustment {
        id: model.id,
        household_id: model.household_id,
        category: model.category,
        current_limit: model.current_limit,
        new_limit: model.new_limit,
        reason: model.reason,
        target,
        status: model.status.into(),
        applied_at: model.applied_at.map(from_db_time),
        created_by: model.created_by,
        created_at: from_db_time(model.created_at),
        updated_at: from_db_time(model.updated_at),
    })
}

pub(crate) fn to_active_model(adjustment: &BudgetAdjustment) -> budget_adjustments::ActiveModel {
    budget_adjustments::ActiveModel {
        id: Set(adjustment.id),
        household_id: Set(adjustment.household_id),
        category: Set(adjustment.category.clone()),
        current_limit: Set(adjustment.current_limit),
        new_limit: Set(adjustment.new_limit),
        reason: Set(adjustment.reason.clone()),
        target_year: Set(adjustment.target.year()),
        target_month: Set(i32::try_from(adjustment.target.month()).unwrap_or_default()),
        status: Set(adjustment.status.into()),
        applied_at: Set(adjustment.applied_at.map(to_db_time)),
        created_by: Set(adjustment.created_by),
        created_at: Set(to_db_time(adjustment.created_at)),
        updated_at: Set(to_db_time(adjustment.updated_at)),
    }
}

/// Loads a household's adjustments, optionally narrowed by status, category
/// and target month. Rows are locked when `for_update` is set.
pub(crate) async fn load<C: ConnectionTrait>(
    conn: &C,
    household: HouseholdId,
    status: Option<AdjustmentStatus>,
    category: Option<&str>,
    target: Option<YearMonth>,
    for_update: bool,
) -> StoreResult<Vec<BudgetAdjustment>> {
    let mut query = budget_adjustments::Entity::find()
        .filter(budget_adjustments::Column::HouseholdId.eq(household.into_inner()));
    if let Some(status) = status {
        query = query.filter(
            budget_adjustments::Column::Status.eq(sea_orm_active_enums::AdjustmentStatus::from(status)),
        );
    }
    if let Some(category) = category {
        query = query.filter(budget_adjustments::Column::Category.eq(category));
    }
    if let Some(target) = target {
        query = query
            .filter(budget_adjustments::Column::TargetYear.eq(target.year()))
            .filter(
                budget_adjustments::Column::TargetMonth
                    .eq(i32::try_from(target.month()).unwrap_or_default()),
            );
    }
    if for_update {
        query = query.lock_exclusive();
    }

    let rows = query
        .order_by_desc(budget_adjustments::Column::TargetYear)
        .order_by_desc(budget_adjustments::Column::TargetMonth)
        .order_by_desc(budget_adjustments::Column::CreatedAt)
        .all(conn)
        .await?;
    rows.into_iter().map(to_domain).collect()
}

/// Scheduled adjustment repository.
#[derive(Debug, Clone)]
pub struct AdjustmentRepository {
    db: DatabaseConnection,
}

impl AdjustmentRepository {
    /// Creates a new adjustment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists adjustments, newest target month first.
    pub async fn list(
        &self,
        household: HouseholdId,
        status: Option<AdjustmentStatus>,
    ) -> StoreResult<Vec<BudgetAdjustment>> {
        let rls = self.db.with_rls(household).await?;
        let adjustments = load(rls.transaction(), household, status, None, None, false).await?;
        rls.commit().await?;
        Ok(adjustments)
    }

    /// Schedules a limit change. A pending change for the same category and
    /// month is replaced rather than duplicated.
    pub async fn schedule(
        &self,
        household: HouseholdId,
        user: UserId,
        input: ScheduleAdjustment,
    ) -> StoreResult<Scheduled> {
        let now = Utc::now();
        let rls = self.db.with_rls(household).await?;
        let txn = rls.transaction();

        let pending = load(txn, household, Some(AdjustmentStatus::Pending), None, None, true).await?;
        let scheduled = budget::schedule(
            input,
            &pending,
            household.into_inner(),
            user.into_inner(),
            now.date_naive(),
            now,
        )?;
        match &scheduled {
            Scheduled::Created(adjustment) => {
                to_active_model(adjustment).insert(txn).await?;
            }
            Scheduled::Superseded(adjustment) => {
                to_active_model(adjustment).update(txn).await?;
            }
        }
        rls.commit().await?;

        let adjustment = scheduled.adjustment();
        tracing::info!(
            household_id = %household,
            adjustment_id = %adjustment.id,
            category = %adjustment.category,
            target = %adjustment.target,
            superseded = matches!(scheduled, Scheduled::Superseded(_)),
            "Budget adjustment scheduled"
        );
        Ok(scheduled)
    }

    /// Applies the pending adjustments that target `period`.
    ///
    /// Months that have not started are rejected before anything is created.
    pub async fn apply(&self, household: HouseholdId, period: YearMonth) -> StoreResult<ApplyOutcome> {
        let now = Utc::now();
        let today = now.date_naive();
        budget::ensure_due(period, today)?;

        let rls = self.db.with_rls(household).await?;
        let txn = rls.transaction();

        let mut monthly = monthly_budget::get_or_sync_in(txn, household, period).await?;
        let loaded = monthly.revision;
        let mut pending = load(
            txn,
            household,
            Some(AdjustmentStatus::Pending),
            None,
            Some(period),
            true,
        )
        .await?;

        let applied = budget::apply_due(&mut monthly, &mut pending, today, now)?;
        if !applied.is_empty() {
            monthly_budget::save_month(txn, &monthly, loaded).await?;
            for adjustment in pending.iter().filter(|a| applied.contains(&a.id)) {
                to_active_model(adjustment).update(txn).await?;
            }
        }
        rls.commit().await?;

        if !applied.is_empty() {
            tracing::info!(
                household_id = %household,
                period = %period,
                count = applied.len(),
                "Scheduled adjustments applied"
            );
        }
        Ok(ApplyOutcome { monthly, applied })
    }

    /// Deletes a pending adjustment.
    pub async fn cancel(&self, household: HouseholdId, id: AdjustmentId) -> StoreResult<()> {
        let rls = self.db.with_rls(household).await?;
        let txn = rls.transaction();

        let row = budget_adjustments::Entity::find_by_id(id.into_inner())
            .filter(budget_adjustments::Column::HouseholdId.eq(household.into_inner()))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(BudgetError::AdjustmentNotFound(id.into_inner()))?;
        let adjustment = to_domain(row)?;
        budget::ensure_cancellable(&adjustment)?;
        budget_adjustments::Entity::delete_by_id(adjustment.id)
            .exec(txn)
            .await?;
        rls.commit().await?;

        tracing::info!(household_id = %household, adjustment_id = %id, "Budget adjustment cancelled");
        Ok(())
    }

    /// Every adjustment of one category, newest first.
    pub async fn category_history(
        &self,
        household: HouseholdId,
        category: &str,
    ) -> StoreResult<Vec<HistoryEntry>> {
        let rls = self.db.with_rls(household).await?;
        let adjustments =
            load(rls.transaction(), household, None, Some(category), None, false).await?;
        rls.commit().await?;
        Ok(budget::category_history(&adjustments, category))
    }

    /// Categories ranked by number of adjustments.
    pub async fn most_adjusted(
        &self,
        household: HouseholdId,
        limit: usize,
    ) -> StoreResult<Vec<CategoryActivity>> {
        let rls = self.db.with_rls(household).await?;
        let adjustments = load(rls.transaction(), household, None, None, None, false).await?;
        rls.commit().await?;
        Ok(budget::most_adjusted(&adjustments, limit))
    }
}

//! Category rename across every record that carries a category name.

use chrono::Utc;
use nestegg_core::budget::AdjustmentStatus;
use nestegg_core::category::{self, RenameOutcome, rename_in_map};
use nestegg_shared::types::HouseholdId;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, Set,
};
use serde::Serialize;

use super::{adjustment, monthly_budget, personal_budget, to_db_time};
use crate::entities::{budget_adjustments, monthly_budgets, personal_budgets, transactions};
use crate::error::{StoreError, StoreResult};
use crate::rls::RlsExt;

/// What a rename touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    /// Normalized old name.
    pub from: String,
    /// Normalized new name.
    pub to: String,
    /// True if the new name already existed somewhere and amounts were
    /// combined.
    pub merged: bool,
    /// Template versions changed.
    pub budgets: u64,
    /// Monthly budgets changed.
    pub months: u64,
    /// Adjustments renamed or folded into another.
    pub adjustments: u64,
    /// Transactions re-labelled.
    pub transactions: u64,
}

impl RenameReport {
    /// Total number of records changed.
    #[must_use]
    pub fn touched(&self) -> u64 {
        self.budgets + self.months + self.adjustments + self.transactions
    }
}

/// Category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Renames `old` to `new` in every template version, every month
    /// (locked ones included), every adjustment and every transaction.
    ///
    /// Where `new` already exists the entries are merged: limits add up and
    /// the existing entry's settings win. Nothing is written unless every
    /// step succeeds. Renaming a name that no longer exists is a no-op, so a
    /// failed call can be retried.
    pub async fn rename(
        &self,
        household: HouseholdId,
        old: &str,
        new: &str,
    ) -> StoreResult<RenameReport> {
        let from = category::normalize_category_name(old)?;
        let to = category::normalize_category_name(new)?;
        let mut report = RenameReport {
            from: from.clone(),
            to: to.clone(),
            ..RenameReport::default()
        };
        if from == to {
            return Ok(report);
        }

        let rls = self.db.with_rls(household).await?;
        let txn = rls.transaction();

        rename_in_budgets(txn, household, &mut report).await?;
        rename_in_months(txn, household, &mut report).await?;
        rename_in_adjustments(txn, household, &mut report).await?;

        let result = transactions::Entity::update_many()
            .col_expr(transactions::Column::Category, Expr::value(to.clone()))
            .col_expr(transactions::Column::UpdatedAt, Expr::value(to_db_time(Utc::now())))
            .filter(transactions::Column::HouseholdId.eq(household.into_inner()))
            .filter(transactions::Column::Category.eq(from.as_str()))
            .exec(txn)
            .await?;
        report.transactions = result.rows_affected;

        rls.commit().await?;
        if report.touched() == 0 {
            tracing::debug!(household_id = %household, from = %report.from, "Category rename matched nothing");
            return Ok(report);
        }

        tracing::info!(
            household_id = %household,
            from = %report.from,
            to = %report.to,
            merged = report.merged,
            budgets = report.budgets,
            months = report.months,
            adjustments = report.adjustments,
            transactions = report.transactions,
            "Category renamed"
        );
        Ok(report)
    }
}

async fn rename_in_budgets<C: ConnectionTrait>(
    conn: &C,
    household: HouseholdId,
    report: &mut RenameReport,
) -> StoreResult<()> {
    let rows = personal_budgets::Entity::find()
        .filter(personal_budgets::Column::HouseholdId.eq(household.into_inner()))
        .lock_exclusive()
        .all(conn)
        .await?;
    let now = Utc::now();
    for row in rows {
        let mut budget = personal_budget::to_domain(row)?;
        let outcome = rename_in_map(&mut budget.categories, &report.from, &report.to)?;
        if outcome == RenameOutcome::Unchanged {
            continue;
        }
        report.merged |= outcome == RenameOutcome::Merged;
        report.budgets += 1;

        let categories = serde_json::to_value(&budget.categories)
            .map_err(|e| StoreError::corrupt("personal_budgets", budget.id, e))?;
        personal_budgets::ActiveModel {
            id: Set(budget.id),
            categories: Set(categories),
            updated_at: Set(to_db_time(now)),
            ..Default::default()
        }
        .update(conn)
        .await?;
    }
    Ok(())
}

async fn rename_in_months<C: ConnectionTrait>(
    conn: &C,
    household: HouseholdId,
    report: &mut RenameReport,
) -> StoreResult<()> {
    let rows = monthly_budgets::Entity::find()
        .filter(monthly_budgets::Column::HouseholdId.eq(household.into_inner()))
        .lock_exclusive()
        .all(conn)
        .await?;
    let now = Utc::now();
    for row in rows {
        let mut month = monthly_budget::to_domain(row)?;
        let loaded = month.revision;
        let outcome = month.rename_category(&report.from, &report.to, now)?;
        if outcome == RenameOutcome::Unchanged {
            continue;
        }
        report.merged |= outcome == RenameOutcome::Merged;
        report.months += 1;
        monthly_budget::save_month(conn, &month, loaded).await?;
    }
    Ok(())
}

/// Renames adjustments. A pending one that would collide with a pending one
/// already using the new name for the same month is folded into it.
async fn rename_in_adjustments<C: ConnectionTrait>(
    conn: &C,
    household: HouseholdId,
    report: &mut RenameReport,
) -> StoreResult<()> {
    let renamed = adjustment::load(conn, household, None, Some(&report.from), None, true).await?;
    let mut existing = adjustment::load(
        conn,
        household,
        Some(AdjustmentStatus::Pending),
        Some(&report.to),
        None,
        true,
    )
    .await?;
    let now = Utc::now();

    for mut source in renamed {
        report.adjustments += 1;
        let collision = if source.is_pending() {
            existing.iter_mut().find(|a| a.target == source.target)
        } else {
            None
        };
        if let Some(target) = collision {
            target.current_limit += source.current_limit;
            target.new_limit += source.new_limit;
            target.updated_at = now;
            adjustment::to_active_model(target).update(conn).await?;
            budget_adjustments::Entity::delete_by_id(source.id)
                .exec(conn)
                .await?;
            report.merged = true;
            continue;
        }
        source.category.clone_from(&report.to);
        source.updated_at = now;
        adjustment::to_active_model(&source).update(conn).await?;
    }
    Ok(())
}

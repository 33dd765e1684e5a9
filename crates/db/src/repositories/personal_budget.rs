//! Personal budget repository.
//!
//! Loads a household's template versions, runs the version rules from
//! `nestegg_core::budget::personal`, and writes back the resulting rows.

use chrono::Utc;
use nestegg_core::budget::{
    Actor, BudgetChange, BudgetError, BudgetSettings, NewPersonalBudget, PersonalBudget,
    PersonalBudgetSet, UpdatePersonalBudget,
};
use nestegg_core::category::CategoryMap;
use nestegg_core::period::YearMonth;
use nestegg_shared::types::{HouseholdId, PersonalBudgetId, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use super::{from_db_time, monthly_budget, to_db_time};
use crate::entities::personal_budgets;
use crate::error::{StoreError, StoreResult};
use crate::rls::RlsExt;

const TABLE: &str = "personal_budgets";

pub(crate) fn to_domain(model: personal_budgets::Model) -> StoreResult<PersonalBudget> {
    let categories: CategoryMap = serde_json::from_value(model.categories)
        .map_err(|e| StoreError::corrupt(TABLE, model.id, e))?;
    let settings: BudgetSettings = serde_json::from_value(model.settings)
        .map_err(|e| StoreError::corrupt(TABLE, model.id, e))?;
    Ok(PersonalBudget {
        id: model.id,
        household_id: model.household_id,
        name: model.name,
        description: model.description,
        categories,
        settings,
        version: model.version,
        is_active: model.is_active,
        created_by: model.created_by,
        created_at: from_db_time(model.created_at),
        updated_at: from_db_time(model.updated_at),
    })
}

fn to_active_model(budget: &PersonalBudget) -> StoreResult<personal_budgets::ActiveModel> {
    let categories = serde_json::to_value(&budget.categories)
        .map_err(|e| StoreError::corrupt(TABLE, budget.id, e))?;
    let settings = serde_json::to_value(&budget.settings)
        .map_err(|e| StoreError::corrupt(TABLE, budget.id, e))?;
    Ok(personal_budgets::ActiveModel {
        id: Set(budget.id),
        household_id: Set(budget.household_id),
        name: Set(budget.name.clone()),
        description: Set(budget.description.clone()),
        categories: Set(categories),
        settings: Set(settings),
        version: Set(budget.version),
        is_active: Set(budget.is_active),
        created_by: Set(budget.created_by),
        created_at: Set(to_db_time(budget.created_at)),
        updated_at: Set(to_db_time(budget.updated_at)),
    })
}

/// Loads every version of the household's template, locking the rows.
async fn load_set<C: ConnectionTrait>(
    conn: &C,
    household: HouseholdId,
) -> StoreResult<PersonalBudgetSet> {
    let rows = personal_budgets::Entity::find()
        .filter(personal_budgets::Column::HouseholdId.eq(household.into_inner()))
        .order_by_asc(personal_budgets::Column::Version)
        .lock_exclusive()
        .all(conn)
        .await?;
    let budgets = rows
        .into_iter()
        .map(to_domain)
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(PersonalBudgetSet::new(budgets))
}

/// Writes a change in the order that keeps the one-active index satisfied.
async fn persist_change<C: ConnectionTrait>(conn: &C, change: &BudgetChange) -> StoreResult<()> {
    if let Some(id) = change.removed {
        personal_budgets::Entity::delete_by_id(id).exec(conn).await?;
    }
    for budget in &change.updated {
        to_active_model(budget)?.update(conn).await?;
    }
    if let Some(budget) = &change.inserted {
        to_active_model(budget)?.insert(conn).await?;
    }
    Ok(())
}

/// The household's active template, if any.
pub(crate) async fn find_active<C: ConnectionTrait>(
    conn: &C,
    household: HouseholdId,
) -> StoreResult<Option<PersonalBudget>> {
    personal_budgets::Entity::find()
        .filter(personal_budgets::Column::HouseholdId.eq(household.into_inner()))
        .filter(personal_budgets::Column::IsActive.eq(true))
        .one(conn)
        .await?
        .map(to_domain)
        .transpose()
}

/// Personal budget repository.
#[derive(Debug, Clone)]
pub struct PersonalBudgetRepository {
    db: DatabaseConnection,
}

impl PersonalBudgetRepository {
    /// Creates a new personal budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists all versions, newest first.
    pub async fn list(&self, household: HouseholdId) -> StoreResult<Vec<PersonalBudget>> {
        let rls = self.db.with_rls(household).await?;
        let rows = personal_budgets::Entity::find()
            .filter(personal_budgets::Column::HouseholdId.eq(household.into_inner()))
            .order_by_desc(personal_budgets::Column::Version)
            .all(rls.transaction())
            .await?;
        rls.commit().await?;
        rows.into_iter().map(to_domain).collect()
    }

    /// Gets one version.
    pub async fn get(
        &self,
        household: HouseholdId,
        id: PersonalBudgetId,
    ) -> StoreResult<PersonalBudget> {
        let rls = self.db.with_rls(household).await?;
        let row = personal_budgets::Entity::find_by_id(id.into_inner())
            .filter(personal_budgets::Column::HouseholdId.eq(household.into_inner()))
            .one(rls.transaction())
            .await?;
        rls.commit().await?;
        let row = row.ok_or(BudgetError::BudgetNotFound(id.into_inner()))?;
        to_domain(row)
    }

    /// Gets the active version.
    pub async fn get_active(&self, household: HouseholdId) -> StoreResult<PersonalBudget> {
        let rls = self.db.with_rls(household).await?;
        let active = find_active(rls.transaction(), household).await?;
        rls.commit().await?;
        active.ok_or_else(|| BudgetError::NoActiveBudget.into())
    }

    /// Creates a new active version; the previous active one is deactivated.
    pub async fn create(
        &self,
        household: HouseholdId,
        user: UserId,
        input: NewPersonalBudget,
    ) -> StoreResult<PersonalBudget> {
        let rls = self.db.with_rls(household).await?;
        let txn = rls.transaction();

        let mut set = load_set(txn, household).await?;
        let change = set.create(input, actor(household, user))?;
        persist_change(txn, &change).await?;
        rls.commit().await?;

        let created = change
            .inserted
            .ok_or_else(|| StoreError::Conflict("budget was not created".to_string()))?;
        tracing::info!(
            household_id = %household,
            budget_id = %created.id,
            version = created.version,
            "Personal budget created"
        );
        Ok(created)
    }

    /// Updates a version, creating a new one when limits or the category set
    /// change.
    pub async fn update(
        &self,
        household: HouseholdId,
        user: UserId,
        id: PersonalBudgetId,
        updates: UpdatePersonalBudget,
    ) -> StoreResult<PersonalBudget> {
        let rls = self.db.with_rls(household).await?;
        let txn = rls.transaction();

        let mut set = load_set(txn, household).await?;
        let change = set.update(id.into_inner(), updates, actor(household, user))?;
        persist_change(txn, &change).await?;
        rls.commit().await?;

        let result = match (change.inserted, change.updated.into_iter().next()) {
            (Some(new_version), _) => {
                tracing::info!(
                    household_id = %household,
                    budget_id = %new_version.id,
                    version = new_version.version,
                    "Personal budget versioned"
                );
                new_version
            }
            (None, Some(updated)) => updated,
            (None, None) => set.get(id.into_inner())?.clone(),
        };
        Ok(result)
    }

    /// Makes a version the only active one and re-syncs the current month if
    /// it exists and is unlocked.
    pub async fn set_active(
        &self,
        household: HouseholdId,
        id: PersonalBudgetId,
    ) -> StoreResult<PersonalBudget> {
        let now = Utc::now();
        let rls = self.db.with_rls(household).await?;
        let txn = rls.transaction();

        let mut set = load_set(txn, household).await?;
        let change = set.set_active(id.into_inner(), now)?;
        persist_change(txn, &change).await?;

        let active = set.get(id.into_inner())?.clone();
        if !change.is_empty() {
            let current = YearMonth::from_date(now.date_naive());
            if let Some(mut month) = monthly_budget::find_month(txn, household, current).await? {
                if !month.is_locked {
                    let previous = month.revision;
                    month.resync(&active, now)?;
                    monthly_budget::save_month(txn, &month, previous).await?;
                }
            }
        }
        rls.commit().await?;

        tracing::info!(
            household_id = %household,
            budget_id = %active.id,
            version = active.version,
            "Personal budget activated"
        );
        Ok(active)
    }

    /// Deletes a version. Returns the version promoted to active, if any.
    pub async fn delete(
        &self,
        household: HouseholdId,
        id: PersonalBudgetId,
    ) -> StoreResult<Option<PersonalBudget>> {
        let rls = self.db.with_rls(household).await?;
        let txn = rls.transaction();

        let mut set = load_set(txn, household).await?;
        let change = set.delete(id.into_inner(), Utc::now())?;
        persist_change(txn, &change).await?;
        rls.commit().await?;

        tracing::info!(household_id = %household, budget_id = %id, "Personal budget deleted");
        Ok(change.updated.into_iter().find(|b| b.is_active))
    }
}

fn actor(household: HouseholdId, user: UserId) -> Actor {
    Actor {
        household_id: household.into_inner(),
        user_id: user.into_inner(),
        now: Utc::now(),
    }
}

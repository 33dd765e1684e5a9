//! Monthly budget snapshots.
//!
//! A monthly budget is a copy of the active template's categories taken the
//! first time a month is read. Later template edits do not reach it unless
//! the month is explicitly re-synced.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::BudgetError;
use super::personal::PersonalBudget;
use crate::category::{self, CategoryConfig, CategoryMap, RenameOutcome};
use crate::period::YearMonth;

/// One household's budget for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBudget {
    /// Row ID.
    pub id: Uuid,
    /// Owning household.
    pub household_id: Uuid,
    /// Month covered.
    #[serde(flatten)]
    pub period: YearMonth,
    /// Category limits for this month.
    pub categories: CategoryMap,
    /// Template the snapshot was copied from.
    pub source_budget_id: Option<Uuid>,
    /// Template version at copy time.
    pub source_version: Option<i32>,
    /// Locked months reject edits.
    pub is_locked: bool,
    /// Number of limit changes made to this month.
    pub adjustment_count: i32,
    /// Incremented on every write.
    pub revision: i32,
    /// When the categories were last copied from a template.
    pub synced_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl MonthlyBudget {
    /// Snapshots `template` for `period`.
    #[must_use]
    pub fn snapshot(period: YearMonth, template: &PersonalBudget, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            household_id: template.household_id,
            period,
            categories: template.categories.clone(),
            source_budget_id: Some(template.id),
            source_version: Some(template.version),
            is_locked: false,
            adjustment_count: 0,
            revision: 0,
            synced_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fails if the month is locked.
    pub fn ensure_unlocked(&self) -> Result<(), BudgetError> {
        if self.is_locked {
            return Err(BudgetError::MonthLocked(self.period));
        }
        Ok(())
    }

    /// Fails if the caller saw an older revision than the stored one.
    pub fn check_revision(&self, expected: Option<i32>) -> Result<(), BudgetError> {
        match expected {
            Some(expected) if expected != self.revision => Err(BudgetError::StaleRevision {
                period: self.period,
                expected,
                actual: self.revision,
            }),
            _ => Ok(()),
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.revision += 1;
        self.updated_at = now;
    }

    /// Changes one category's limit for this month only.
    ///
    /// Returns the previous limit. Zero is a valid limit.
    pub fn update_category_limit(
        &mut self,
        category: &str,
        new_limit: Decimal,
        expected_revision: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<Decimal, BudgetError> {
        self.ensure_unlocked()?;
        self.check_revision(expected_revision)?;
        let new_limit = category::check_limit(category, new_limit)?;
        let config = self
            .categories
            .get_mut(category)
            .ok_or_else(|| BudgetError::CategoryNotFound(category.to_string()))?;

        let previous = config.monthly_limit;
        config.monthly_limit = new_limit;
        self.adjustment_count += 1;
        self.touch(now);
        Ok(previous)
    }

    /// Sets a category's limit, adding the category when it is missing.
    ///
    /// Used when scheduled adjustments land; does not check the lock.
    pub(crate) fn set_limit_or_insert(&mut self, category: &str, new_limit: Decimal) {
        if let Some(config) = self.categories.get_mut(category) {
            config.monthly_limit = new_limit;
            return;
        }
        self.categories
            .insert(category.to_string(), CategoryConfig::with_limit(new_limit));
        category::assign_missing_colors(&mut self.categories);
    }

    /// Records that `count` limit changes landed in one write.
    pub(crate) fn record_adjustments(&mut self, count: usize, now: DateTime<Utc>) {
        self.adjustment_count = self
            .adjustment_count
            .saturating_add(i32::try_from(count).unwrap_or(i32::MAX));
        self.touch(now);
    }

    /// Re-copies the categories from `template`.
    pub fn resync(&mut self, template: &PersonalBudget, now: DateTime<Utc>) -> Result<(), BudgetError> {
        self.ensure_unlocked()?;
        self.categories = template.categories.clone();
        self.source_budget_id = Some(template.id);
        self.source_version = Some(template.version);
        self.synced_at = now;
        self.touch(now);
        Ok(())
    }

    /// Freezes the month. Returns false if it was already locked.
    pub fn lock(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_locked {
            return false;
        }
        self.is_locked = true;
        self.touch(now);
        true
    }

    /// Unfreezes the month. Returns false if it was not locked.
    pub fn unlock(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_locked {
            return false;
        }
        self.is_locked = false;
        self.touch(now);
        true
    }

    /// Renames a category in this month, merging into an existing one.
    ///
    /// Allowed on locked months. A merge sums the two limits there too, so a
    /// locked month keeps its budgeted total.
    pub fn rename_category(
        &mut self,
        old: &str,
        new: &str,
        now: DateTime<Utc>,
    ) -> Result<RenameOutcome, BudgetError> {
        let outcome = category::rename_in_map(&mut self.categories, old, new)?;
        if outcome != RenameOutcome::Unchanged {
            self.touch(now);
        }
        Ok(outcome)
    }

    /// Sum of active category limits.
    pub fn total_limit(&self) -> Result<Decimal, BudgetError> {
        category::total_active_limit(&self.categories)
    }
}

/// How a category differs between a month and the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Only in the template.
    Added,
    /// Only in the month.
    Removed,
    /// Month limit above the template's.
    Increased,
    /// Month limit below the template's, but above zero.
    Decreased,
    /// Month limit is zero while the template's is not.
    ReducedToZero,
    /// Same limit, other settings differ.
    SettingsChanged,
}

/// One differing category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDiff {
    /// Category name.
    pub category: String,
    /// Kind of difference.
    pub kind: DiffKind,
    /// Limit in the month, if present there.
    pub monthly_limit: Option<Decimal>,
    /// Limit in the template, if present there.
    pub template_limit: Option<Decimal>,
    /// Month limit minus template limit, missing sides counted as zero.
    pub difference: Decimal,
}

/// Month versus active template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetComparison {
    /// Month compared.
    #[serde(flatten)]
    pub period: YearMonth,
    /// Template version the month was copied from.
    pub source_version: Option<i32>,
    /// Version of the template compared against.
    pub template_version: i32,
    /// Differing categories, by name.
    pub differences: Vec<CategoryDiff>,
    /// Active total of the month.
    pub monthly_total: Decimal,
    /// Active total of the template.
    pub template_total: Decimal,
}

impl BudgetComparison {
    /// Returns true if month and template agree.
    #[must_use]
    pub fn is_in_sync(&self) -> bool {
        self.differences.is_empty()
    }
}

fn diff_category(
    name: &str,
    monthly: Option<&CategoryConfig>,
    template: Option<&CategoryConfig>,
) -> Option<CategoryDiff> {
    let monthly_limit = monthly.map(|c| c.monthly_limit);
    let template_limit = template.map(|c| c.monthly_limit);
    let difference = monthly_limit
        .unwrap_or_default()
        .saturating_sub(template_limit.unwrap_or_default());

    let kind = match (monthly, template) {
        (None, None) => return None,
        (None, Some(_)) => DiffKind::Added,
        (Some(_), None) => DiffKind::Removed,
        (Some(m), Some(t)) => {
            if m.monthly_limit.is_zero() && t.monthly_limit > Decimal::ZERO {
                DiffKind::ReducedToZero
            } else if m.monthly_limit > t.monthly_limit {
                DiffKind::Increased
            } else if m.monthly_limit < t.monthly_limit {
                DiffKind::Decreased
            } else if m != t {
                DiffKind::SettingsChanged
            } else {
                return None;
            }
        }
    };

    Some(CategoryDiff {
        category: name.to_string(),
        kind,
        monthly_limit,
        template_limit,
        difference,
    })
}

/// Diffs a month's snapshot against a template. Read-only.
pub fn compare(
    monthly: &MonthlyBudget,
    template: &PersonalBudget,
) -> Result<BudgetComparison, BudgetError> {
    let mut names: Vec<&String> = monthly
        .categories
        .keys()
        .chain(template.categories.keys())
        .collect();
    names.sort();
    names.dedup();

    let differences = names
        .into_iter()
        .filter_map(|name| {
            diff_category(
                name,
                monthly.categories.get(name),
                template.categories.get(name),
            )
        })
        .collect();

    Ok(BudgetComparison {
        period: monthly.period,
        source_version: monthly.source_version,
        template_version: template.version,
        differences,
        monthly_total: monthly.total_limit()?,
        template_total: category::total_active_limit(&template.categories)?,
    })
}

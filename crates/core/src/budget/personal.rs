//! Personal budget templates and their version rules.
//!
//! A household keeps every version of its template. Exactly one version is
//! active at a time; changing what a month can spend (the category set, a
//! limit, or an active flag) creates a new version, anything else is edited in
//! place.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::BudgetError;
use crate::category::{self, CategoryMap};
use crate::currency;

/// Maximum length of a budget name, in characters.
pub const MAX_BUDGET_NAME_LEN: usize = 100;

/// Display and default settings stored with a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSettings {
    /// ISO 4217 code used to format amounts.
    pub currency: String,
    /// Format amounts without cents.
    pub show_rounded: bool,
    /// Threshold given to new categories, in percent.
    pub default_warning_threshold: Decimal,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            show_rounded: false,
            default_warning_threshold: Decimal::from(80),
        }
    }
}

impl BudgetSettings {
    /// Checks the settings and upper-cases the currency code.
    pub fn validate(mut self) -> Result<Self, BudgetError> {
        let code = self.currency.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(BudgetError::InvalidSettings(format!(
                "currency '{}' must be a three-letter code",
                self.currency
            )));
        }
        if self.default_warning_threshold < Decimal::ZERO
            || self.default_warning_threshold > Decimal::ONE_HUNDRED
        {
            return Err(BudgetError::InvalidSettings(
                "default_warning_threshold must be between 0 and 100".to_string(),
            ));
        }
        self.currency = code;
        Ok(self)
    }

    /// Formats an amount with these settings.
    #[must_use]
    pub fn format(&self, amount: Decimal) -> String {
        currency::format_amount(amount, &self.currency, self.show_rounded)
    }
}

/// One version of a household's budget template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalBudget {
    /// Budget ID.
    pub id: Uuid,
    /// Owning household.
    pub household_id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Category limits.
    pub categories: CategoryMap,
    /// Currency and display settings.
    pub settings: BudgetSettings,
    /// Version number, starting at 1.
    pub version: i32,
    /// Whether this is the household's active template.
    pub is_active: bool,
    /// User who created this version.
    pub created_by: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPersonalBudget {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Category limits.
    #[serde(default)]
    pub categories: CategoryMap,
    /// Settings; defaults apply when omitted.
    #[serde(default)]
    pub settings: Option<BudgetSettings>,
}

/// Partial update of a template. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePersonalBudget {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement category map.
    pub categories: Option<CategoryMap>,
    /// Replacement settings.
    pub settings: Option<BudgetSettings>,
}

/// Who is acting, and when.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    /// Household the change belongs to.
    pub household_id: Uuid,
    /// User making the change.
    pub user_id: Uuid,
    /// Timestamp for the change.
    pub now: DateTime<Utc>,
}

/// Row-level effect of a template operation, in the order it must be written.
///
/// Deleting comes first, then updates (deactivations before the activation),
/// then the insert, so the "one active per household" index holds after
/// every statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetChange {
    /// Row to delete.
    pub removed: Option<Uuid>,
    /// Rows to overwrite.
    pub updated: Vec<PersonalBudget>,
    /// Row to insert.
    pub inserted: Option<PersonalBudget>,
}

impl BudgetChange {
    /// The template that is active after the change, if it was touched.
    #[must_use]
    pub fn activated(&self) -> Option<&PersonalBudget> {
        self.inserted
            .iter()
            .chain(self.updated.iter())
            .find(|b| b.is_active)
    }

    /// Returns true if nothing needs to be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_none() && self.updated.is_empty() && self.inserted.is_none()
    }
}

/// Whether an update rewrites a row or needs a new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Only metadata changed.
    InPlace,
    /// Category set, a limit, or an active flag changed.
    NewVersion,
}

/// Decides how a category map change is stored.
#[must_use]
pub fn classify_update(current: &CategoryMap, proposed: &CategoryMap) -> UpdateKind {
    if current.len() != proposed.len() {
        return UpdateKind::NewVersion;
    }
    let reshaped = current.iter().any(|(name, old)| match proposed.get(name) {
        Some(new) => new.monthly_limit != old.monthly_limit || new.is_active != old.is_active,
        None => true,
    });
    if reshaped {
        UpdateKind::NewVersion
    } else {
        UpdateKind::InPlace
    }
}

/// Trims and checks a budget name.
pub fn normalize_budget_name(name: &str) -> Result<String, BudgetError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BudgetError::InvalidBudgetName("name must not be empty"));
    }
    if trimmed.chars().count() > MAX_BUDGET_NAME_LEN {
        return Err(BudgetError::InvalidBudgetName(
            "name must be at most 100 characters",
        ));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Validates a proposed category map and fills in colors.
///
/// Colors are kept from `previous` for categories that already existed, then
/// allocated for the rest.
fn prepare_categories(
    proposed: CategoryMap,
    previous: Option<&CategoryMap>,
) -> Result<CategoryMap, BudgetError> {
    let mut categories = category::validate_categories(proposed)?;
    if let Some(previous) = previous {
        for (name, config) in &mut categories {
            if config.color.trim().is_empty() {
                if let Some(old) = previous.get(name) {
                    config.color.clone_from(&old.color);
                }
            }
        }
    }
    category::assign_missing_colors(&mut categories);
    Ok(categories)
}

/// All template versions of one household, with the version rules.
///
/// Operations mutate the set and return the rows to persist.
#[derive(Debug, Clone, Default)]
pub struct PersonalBudgetSet {
    budgets: Vec<PersonalBudget>,
}

impl PersonalBudgetSet {
    /// Wraps the stored versions of one household.
    #[must_use]
    pub fn new(mut budgets: Vec<PersonalBudget>) -> Self {
        budgets.sort_by_key(|b| b.version);
        Self { budgets }
    }

    /// Versions in ascending order.
    #[must_use]
    pub fn budgets(&self) -> &[PersonalBudget] {
        &self.budgets
    }

    /// The active template, if any.
    #[must_use]
    pub fn active(&self) -> Option<&PersonalBudget> {
        self.budgets.iter().find(|b| b.is_active)
    }

    /// Looks up a version by id.
    pub fn get(&self, id: Uuid) -> Result<&PersonalBudget, BudgetError> {
        self.budgets
            .iter()
            .find(|b| b.id == id)
            .ok_or(BudgetError::BudgetNotFound(id))
    }

    /// Highest version number, 0 when empty.
    #[must_use]
    pub fn max_version(&self) -> i32 {
        self.budgets.iter().map(|b| b.version).max().unwrap_or(0)
    }

    /// Deactivates every active version except `keep`, returning the rows.
    fn deactivate_others(&mut self, keep: Option<Uuid>, now: DateTime<Utc>) -> Vec<PersonalBudget> {
        self.budgets
            .iter_mut()
            .filter(|b| b.is_active && Some(b.id) != keep)
            .map(|b| {
                b.is_active = false;
                b.updated_at = now;
                b.clone()
            })
            .collect()
    }

    fn push_new_version(
        &mut self,
        actor: Actor,
        name: String,
        description: Option<String>,
        categories: CategoryMap,
        settings: BudgetSettings,
    ) -> BudgetChange {
        let updated = self.deactivate_others(None, actor.now);
        let budget = PersonalBudget {
            id: Uuid::now_v7(),
            household_id: actor.household_id,
            name,
            description,
            categories,
            settings,
            version: self.max_version() + 1,
            is_active: true,
            created_by: actor.user_id,
            created_at: actor.now,
            updated_at: actor.now,
        };
        self.budgets.push(budget.clone());
        BudgetChange {
            removed: None,
            updated,
            inserted: Some(budget),
        }
    }

    /// Creates a new active version.
    pub fn create(
        &mut self,
        input: NewPersonalBudget,
        actor: Actor,
    ) -> Result<BudgetChange, BudgetError> {
        let name = normalize_budget_name(&input.name)?;
        let settings = input.settings.unwrap_or_default().validate()?;
        let previous = self.active().map(|b| b.categories.clone());
        let categories = prepare_categories(input.categories, previous.as_ref())?;

        Ok(self.push_new_version(
            actor,
            name,
            normalize_description(input.description),
            categories,
            settings,
        ))
    }

    /// Applies a partial update to version `id`.
    ///
    /// Shape changes produce a new active version derived from `id`; other
    /// changes rewrite `id` itself.
    pub fn update(
        &mut self,
        id: Uuid,
        updates: UpdatePersonalBudget,
        actor: Actor,
    ) -> Result<BudgetChange, BudgetError> {
        let current = self.get(id)?.clone();

        let name = match updates.name {
            Some(name) => normalize_budget_name(&name)?,
            None => current.name.clone(),
        };
        let description = match updates.description {
            Some(description) => normalize_description(Some(description)),
            None => current.description.clone(),
        };
        let settings = match updates.settings {
            Some(settings) => settings.validate()?,
            None => current.settings.clone(),
        };
        let categories = match updates.categories {
            Some(categories) => prepare_categories(categories, Some(&current.categories))?,
            None => current.categories.clone(),
        };

        if classify_update(&current.categories, &categories) == UpdateKind::NewVersion {
            return Ok(self.push_new_version(actor, name, description, categories, settings));
        }

        let unchanged = name == current.name
            && description == current.description
            && settings == current.settings
            && categories == current.categories;
        if unchanged {
            return Ok(BudgetChange::default());
        }

        let Some(row) = self.budgets.iter_mut().find(|b| b.id == id) else {
            return Err(BudgetError::BudgetNotFound(id));
        };
        row.name = name;
        row.description = description;
        row.settings = settings;
        row.categories = categories;
        row.updated_at = actor.now;
        Ok(BudgetChange {
            removed: None,
            updated: vec![row.clone()],
            inserted: None,
        })
    }

    /// Makes version `id` the only active one.
    pub fn set_active(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<BudgetChange, BudgetError> {
        if self.get(id)?.is_active {
            return Ok(BudgetChange::default());
        }

        let mut updated = self.deactivate_others(Some(id), now);
        if let Some(row) = self.budgets.iter_mut().find(|b| b.id == id) {
            row.is_active = true;
            row.updated_at = now;
            updated.push(row.clone());
        }
        Ok(BudgetChange {
            removed: None,
            updated,
            inserted: None,
        })
    }

    /// Deletes version `id`.
    ///
    /// Deleting the active version promotes the highest remaining one.
    pub fn delete(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<BudgetChange, BudgetError> {
        let was_active = self.get(id)?.is_active;
        self.budgets.retain(|b| b.id != id);

        let mut updated = Vec::new();
        if was_active {
            if let Some(promoted) = self.budgets.iter_mut().max_by_key(|b| b.version) {
                promoted.is_active = true;
                promoted.updated_at = now;
                updated.push(promoted.clone());
            }
        }
        Ok(BudgetChange {
            removed: Some(id),
            updated,
            inserted: None,
        })
    }
}

//! Budget categories.
//!
//! Categories are not a table of their own: every personal and monthly budget
//! stores a full `CategoryMap`, and transactions and adjustments refer to a
//! category by name.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::budget::error::BudgetError;
use crate::color;

/// Maximum length of a category name, in characters.
pub const MAX_CATEGORY_NAME_LEN: usize = 64;

/// Largest accepted amount, `999999999999999.9999`. Fits the `NUMERIC(19,4)` money columns.
pub const MAX_MONTHLY_LIMIT: Decimal = Decimal::from_parts(0x89E7_FFFF, 0x8AC7_2304, 0, false, 4);

/// Decimal places allowed in a limit.
pub const LIMIT_SCALE: u32 = 4;

/// Per-category configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Spending limit for one month.
    pub monthly_limit: Decimal,
    /// Utilization percent (0-100) at which the category is flagged.
    pub warning_threshold: Decimal,
    /// Soft-disabled categories stay in the map but are excluded from totals.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Display color, `#RRGGBB`. Empty until assigned.
    #[serde(default)]
    pub color: String,
    /// Free-form note.
    #[serde(default)]
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

impl CategoryConfig {
    /// Active category with the given limit and an 80% warning threshold.
    #[must_use]
    pub fn with_limit(monthly_limit: Decimal) -> Self {
        Self {
            monthly_limit,
            warning_threshold: Decimal::from(80),
            is_active: true,
            color: String::new(),
            description: None,
        }
    }
}

/// Category name to configuration, ordered by name.
pub type CategoryMap = BTreeMap<String, CategoryConfig>;

/// Result of renaming a category inside one map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameOutcome {
    /// The old name was moved to the new name.
    Renamed,
    /// The new name already existed; the old entry was folded into it.
    Merged,
    /// The old name was not present.
    Unchanged,
}

/// Trims a category name and checks it is usable.
pub fn normalize_category_name(name: &str) -> Result<String, BudgetError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BudgetError::InvalidCategoryName {
            name: name.to_string(),
            reason: "name must not be empty",
        });
    }
    if trimmed.chars().count() > MAX_CATEGORY_NAME_LEN {
        return Err(BudgetError::InvalidCategoryName {
            name: trimmed.to_string(),
            reason: "name must be at most 64 characters",
        });
    }
    Ok(trimmed.to_string())
}

/// Checks a monthly limit: `0 <= limit <= MAX_MONTHLY_LIMIT`, at most
/// [`LIMIT_SCALE`] decimal places.
pub fn check_limit(category: &str, limit: Decimal) -> Result<Decimal, BudgetError> {
    if limit.is_sign_negative() && !limit.is_zero() {
        return Err(BudgetError::NegativeLimit {
            category: category.to_string(),
        });
    }
    if limit > MAX_MONTHLY_LIMIT {
        return Err(BudgetError::LimitOutOfRange {
            category: category.to_string(),
            reason: "limit must not exceed 999999999999999.9999",
        });
    }
    if limit.normalize().scale() > LIMIT_SCALE {
        return Err(BudgetError::LimitOutOfRange {
            category: category.to_string(),
            reason: "limit must have at most 4 decimal places",
        });
    }
    Ok(limit)
}

/// Validates every entry of a category map and returns it with trimmed names.
///
/// Limits go through [`check_limit`]; thresholds must be within 0..=100.
pub fn validate_categories(categories: CategoryMap) -> Result<CategoryMap, BudgetError> {
    let mut out = CategoryMap::new();
    for (name, config) in categories {
        let name = normalize_category_name(&name)?;
        check_limit(&name, config.monthly_limit)?;
        if config.warning_threshold < Decimal::ZERO
            || config.warning_threshold > Decimal::ONE_HUNDRED
        {
            return Err(BudgetError::InvalidThreshold { category: name });
        }
        if out.insert(name.clone(), config).is_some() {
            return Err(BudgetError::DuplicateCategory(name));
        }
    }
    Ok(out)
}

/// Gives every category without a color one from the allocator.
///
/// Colors already present in the map count as used.
pub fn assign_missing_colors(categories: &mut CategoryMap) {
    let mut used: Vec<String> = categories
        .values()
        .filter(|c| !c.color.trim().is_empty())
        .map(|c| c.color.clone())
        .collect();

    for config in categories.values_mut() {
        if config.color.trim().is_empty() {
            let color = color::next_color(&used);
            used.push(color.clone());
            config.color = color;
        }
    }
}

/// Renames `old` to `new` inside one map.
///
/// If `new` already exists the two are merged: limits are summed and the
/// target keeps its other settings. Renaming a name that is absent is a no-op,
/// which makes the operation safe to repeat.
///
/// A merge whose summed limit fails [`check_limit`] leaves the map untouched.
pub fn rename_in_map(
    categories: &mut CategoryMap,
    old: &str,
    new: &str,
) -> Result<RenameOutcome, BudgetError> {
    if old == new {
        return Ok(RenameOutcome::Unchanged);
    }
    let Some(source_limit) = categories.get(old).map(|c| c.monthly_limit) else {
        return Ok(RenameOutcome::Unchanged);
    };

    if let Some(target) = categories.get(new) {
        let merged = target
            .monthly_limit
            .checked_add(source_limit)
            .ok_or_else(|| BudgetError::LimitOutOfRange {
                category: new.to_string(),
                reason: "merged limit overflows",
            })?;
        let merged = check_limit(new, merged)?;
        categories.remove(old);
        if let Some(target) = categories.get_mut(new) {
            target.monthly_limit = merged;
        }
        return Ok(RenameOutcome::Merged);
    }

    if let Some(source) = categories.remove(old) {
        categories.insert(new.to_string(), source);
    }
    Ok(RenameOutcome::Renamed)
}

/// Sum of limits over active categories.
pub fn total_active_limit(categories: &CategoryMap) -> Result<Decimal, BudgetError> {
    categories
        .values()
        .filter(|c| c.is_active)
        .try_fold(Decimal::ZERO, |total, c| {
            total
                .checked_add(c.monthly_limit)
                .ok_or(BudgetError::TotalOverflow)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn map(entries: &[(&str, Decimal)]) -> CategoryMap {
        entries
            .iter()
            .map(|(n, l)| ((*n).to_string(), CategoryConfig::with_limit(*l)))
            .collect()
    }

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize_category_name("  Food ").unwrap(), "Food");
        assert!(normalize_category_name("   ").is_err());
        assert!(normalize_category_name(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_limit_and_names_it() {
        let err = validate_categories(map(&[("Rent", dec!(-1))])).unwrap_err();
        assert!(matches!(err, BudgetError::NegativeLimit { ref category } if category == "Rent"));
        assert!(err.to_string().contains("Rent"));
    }

    #[test]
    fn test_validate_accepts_zero_limit() {
        assert!(validate_categories(map(&[("Gifts", dec!(0))])).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut categories = map(&[("Fun", dec!(10))]);
        categories.get_mut("Fun").unwrap().warning_threshold = dec!(101);
        assert!(matches!(
            validate_categories(categories),
            Err(BudgetError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_validate_detects_duplicates_after_trim() {
        let categories = map(&[("Food", dec!(1)), ("Food ", dec!(2))]);
        assert!(matches!(
            validate_categories(categories),
            Err(BudgetError::DuplicateCategory(name)) if name == "Food"
        ));
    }

    #[test]
    fn test_assign_missing_colors_avoids_existing() {
        let mut categories = map(&[("A", dec!(1)), ("B", dec!(1))]);
        categories.get_mut("B").unwrap().color = color::PALETTE[0].to_string();

        assign_missing_colors(&mut categories);

        assert_eq!(categories["A"].color, color::PALETTE[1]);
        assert_eq!(categories["B"].color, color::PALETTE[0]);
    }

    #[test]
    fn test_rename_moves_entry() {
        let mut categories = map(&[("Food", dec!(300))]);
        assert_eq!(
            rename_in_map(&mut categories, "Food", "Groceries").unwrap(),
            RenameOutcome::Renamed
        );
        assert_eq!(categories["Groceries"].monthly_limit, dec!(300));
        assert!(!categories.contains_key("Food"));
    }

    #[test]
    fn test_rename_into_existing_merges() {
        let mut categories = map(&[("Food", dec!(300)), ("Groceries", dec!(200))]);
        categories.get_mut("Groceries").unwrap().color = "#00B894".to_string();

        assert_eq!(
            rename_in_map(&mut categories, "Food", "Groceries").unwrap(),
            RenameOutcome::Merged
        );
        assert_eq!(categories.len(), 1);
        assert_eq!(categories["Groceries"].monthly_limit, dec!(500));
        assert_eq!(categories["Groceries"].color, "#00B894");
    }

    #[test]
    fn test_rename_is_idempotent() {
        let mut categories = map(&[("Food", dec!(300)), ("Groceries", dec!(200))]);
        rename_in_map(&mut categories, "Food", "Groceries").unwrap();
        let after_first = categories.clone();

        assert_eq!(
            rename_in_map(&mut categories, "Food", "Groceries").unwrap(),
            RenameOutcome::Unchanged
        );
        assert_eq!(categories, after_first);
    }

    #[test]
    fn test_total_active_limit_skips_inactive() {
        let mut categories = map(&[("A", dec!(100)), ("B", dec!(50))]);
        categories.get_mut("B").unwrap().is_active = false;
        assert_eq!(total_active_limit(&categories).unwrap(), dec!(100));
    }

    #[rstest]
    #[case(dec!(0.0000000000000000000000000001))]
    #[case(dec!(10.12345))]
    #[case(dec!(1000000000000000))]
    #[case(Decimal::MAX)]
    fn test_validate_rejects_limit_out_of_range(#[case] limit: Decimal) {
        assert!(matches!(
            validate_categories(map(&[("Food", limit)])),
            Err(BudgetError::LimitOutOfRange { ref category, .. }) if category == "Food"
        ));
    }

    #[rstest]
    #[case(dec!(0.0001))]
    #[case(dec!(12.50000))]
    #[case(MAX_MONTHLY_LIMIT)]
    fn test_validate_accepts_limit_at_bounds(#[case] limit: Decimal) {
        assert!(validate_categories(map(&[("Food", limit)])).is_ok());
    }

    #[test]
    fn test_merge_past_maximum_is_rejected_and_leaves_map() {
        let mut categories = map(&[("Food", MAX_MONTHLY_LIMIT), ("Groceries", dec!(1))]);
        let before = categories.clone();

        assert!(matches!(
            rename_in_map(&mut categories, "Food", "Groceries"),
            Err(BudgetError::LimitOutOfRange { .. })
        ));
        assert_eq!(categories, before);

        categories.insert("Huge".into(), CategoryConfig::with_limit(Decimal::MAX));
        assert!(rename_in_map(&mut categories, "Huge", "Groceries").is_err());
    }

    #[test]
    fn test_total_of_unchecked_limits_reports_overflow() {
        let categories = map(&[("A", Decimal::MAX), ("B", dec!(1))]);
        assert_eq!(total_active_limit(&categories), Err(BudgetError::TotalOverflow));
    }

    #[test]
    fn test_config_json_defaults() {
        let config: CategoryConfig =
            serde_json::from_str(r#"{"monthly_limit":"10","warning_threshold":"80"}"#).unwrap();
        assert!(config.is_active);
        assert!(config.color.is_empty());
        assert!(config.description.is_none());
    }
}

//! Dashboard data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::period::YearMonth;

/// Budget health of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStatus {
    /// Spending below the warning threshold.
    UnderBudget,
    /// Spending at or above the warning threshold.
    Warning,
    /// Spending above the limit.
    OverBudget,
    /// Category is soft-disabled.
    Inactive,
    /// Expenses in a category the month does not budget for.
    Unbudgeted,
}

/// Per-category line of the overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// Category name.
    pub category: String,
    /// Chart color.
    pub color: String,
    /// Limit for the month.
    pub limit: Decimal,
    /// Expenses in the month.
    pub spent: Decimal,
    /// `limit - spent`; negative when over.
    pub remaining: Decimal,
    /// `spent / limit` in percent; `None` when the limit is zero.
    pub utilization_percent: Option<Decimal>,
    /// Warning threshold, percent.
    pub warning_threshold: Decimal,
    /// Health.
    pub status: CategoryStatus,
    /// Formatted spent amount.
    pub spent_label: String,
    /// Formatted limit.
    pub limit_label: String,
    /// Short spent label for charts.
    pub spent_compact: String,
}

/// One month at a glance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyOverview {
    /// Month shown.
    #[serde(flatten)]
    pub period: YearMonth,
    /// Currency code used for labels.
    pub currency: String,
    /// Income in the month.
    pub total_income: Decimal,
    /// Expenses in the month.
    pub total_expense: Decimal,
    /// Income minus expenses.
    pub net: Decimal,
    /// Sum of active limits.
    pub total_limit: Decimal,
    /// Formatted income.
    pub income_label: String,
    /// Formatted expenses.
    pub expense_label: String,
    /// Formatted net.
    pub net_label: String,
    /// Whether the month is locked.
    pub is_locked: bool,
    /// Category lines, budgeted categories first, then unbudgeted.
    pub categories: Vec<CategorySummary>,
}

/// Income and expense of one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Month.
    #[serde(flatten)]
    pub period: YearMonth,
    /// Income.
    pub income: Decimal,
    /// Expenses.
    pub expense: Decimal,
    /// Income minus expenses.
    pub net: Decimal,
}

//! Overview and trend aggregation.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::types::{CategoryStatus, CategorySummary, MonthlyOverview, TrendPoint};
use crate::budget::{BudgetError, BudgetSettings, MonthlyBudget};
use crate::category::CategoryConfig;
use crate::color;
use crate::currency;
use crate::period::YearMonth;
use crate::transaction::{Transaction, TransactionType};

/// `spent / limit` in percent, two decimals. `None` for a zero limit or a
/// ratio too large to represent.
#[must_use]
pub fn utilization_percent(spent: Decimal, limit: Decimal) -> Option<Decimal> {
    spent
        .checked_div(limit)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| pct.round_dp(2))
}

/// Status of a budgeted category.
#[must_use]
pub fn category_status(config: &CategoryConfig, spent: Decimal) -> CategoryStatus {
    if !config.is_active {
        return CategoryStatus::Inactive;
    }
    match utilization_percent(spent, config.monthly_limit) {
        None if spent > Decimal::ZERO => CategoryStatus::OverBudget,
        None => CategoryStatus::UnderBudget,
        Some(pct) if pct > Decimal::ONE_HUNDRED => CategoryStatus::OverBudget,
        Some(pct) if pct >= config.warning_threshold => CategoryStatus::Warning,
        Some(_) => CategoryStatus::UnderBudget,
    }
}

fn summary(
    category: &str,
    color: String,
    limit: Decimal,
    spent: Decimal,
    warning_threshold: Decimal,
    status: CategoryStatus,
    settings: &BudgetSettings,
) -> CategorySummary {
    CategorySummary {
        category: category.to_string(),
        color,
        limit,
        spent,
        remaining: limit - spent,
        utilization_percent: utilization_percent(spent, limit),
        warning_threshold,
        status,
        spent_label: settings.format(spent),
        limit_label: settings.format(limit),
        spent_compact: currency::format_compact(spent, &settings.currency),
    }
}

/// Builds the overview of `monthly`'s month.
///
/// Transactions outside the month are ignored.
pub fn build_overview(
    monthly: &MonthlyBudget,
    transactions: &[Transaction],
    settings: &BudgetSettings,
) -> Result<MonthlyOverview, BudgetError> {
    let total_limit = monthly.total_limit()?;
    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    let mut spent_by_category: BTreeMap<&str, Decimal> = BTreeMap::new();

    for tx in transactions
        .iter()
        .filter(|t| monthly.period.contains(t.date))
    {
        match tx.transaction_type {
            TransactionType::Income => total_income += tx.amount,
            TransactionType::Expense => {
                total_expense += tx.amount;
                *spent_by_category.entry(tx.category.as_str()).or_default() += tx.amount;
            }
        }
    }

    let mut categories: Vec<CategorySummary> = monthly
        .categories
        .iter()
        .map(|(name, config)| {
            let spent = spent_by_category
                .get(name.as_str())
                .copied()
                .unwrap_or_default();
            summary(
                name,
                config.color.clone(),
                config.monthly_limit,
                spent,
                config.warning_threshold,
                category_status(config, spent),
                settings,
            )
        })
        .collect();

    let mut used_colors: Vec<String> = categories.iter().map(|c| c.color.clone()).collect();
    for (name, spent) in spent_by_category {
        if monthly.categories.contains_key(name) {
            continue;
        }
        let color = color::next_color(&used_colors);
        used_colors.push(color.clone());
        categories.push(summary(
            name,
            color,
            Decimal::ZERO,
            spent,
            settings.default_warning_threshold,
            CategoryStatus::Unbudgeted,
            settings,
        ));
    }

    let net = total_income - total_expense;
    Ok(MonthlyOverview {
        period: monthly.period,
        currency: settings.currency.clone(),
        total_income,
        total_expense,
        net,
        total_limit,
        income_label: settings.format(total_income),
        expense_label: settings.format(total_expense),
        net_label: settings.format(net),
        is_locked: monthly.is_locked,
        categories,
    })
}

/// Income and expense per month, in the order of `periods`.
#[must_use]
pub fn monthly_trend(transactions: &[Transaction], periods: &[YearMonth]) -> Vec<TrendPoint> {
    periods
        .iter()
        .map(|period| {
            let (income, expense) = transactions
                .iter()
                .filter(|t| period.contains(t.date))
                .fold((Decimal::ZERO, Decimal::ZERO), |(inc, exp), t| {
                    match t.transaction_type {
                        TransactionType::Income => (inc + t.amount, exp),
                        TransactionType::Expense => (inc, exp + t.amount),
                    }
                });
            TrendPoint {
                period: *period,
                income,
                expense,
                net: income - expense,
            }
        })
        .collect()
}

//! Read-only views over adjustment records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::adjustment::{AdjustmentStatus, BudgetAdjustment};
use crate::period::YearMonth;

/// One adjustment in a category's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Adjustment ID.
    pub adjustment_id: Uuid,
    /// Month the change targets.
    pub target: YearMonth,
    /// Limit before.
    pub previous_limit: Decimal,
    /// Limit after.
    pub new_limit: Decimal,
    /// `new_limit - previous_limit`.
    pub change: Decimal,
    /// Change relative to the previous limit, in percent. `None` when the
    /// previous limit was zero or the ratio does not fit.
    pub change_percent: Option<Decimal>,
    /// Pending or applied.
    pub status: AdjustmentStatus,
    /// Optional note.
    pub reason: Option<String>,
    /// When it was scheduled.
    pub created_at: DateTime<Utc>,
}

/// Adjustment count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryActivity {
    /// Category name.
    pub category: String,
    /// Number of adjustments.
    pub count: usize,
    /// Sum of all changes.
    pub net_change: Decimal,
}

/// History of one category, newest target month first.
#[must_use]
pub fn category_history(adjustments: &[BudgetAdjustment], category: &str) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = adjustments
        .iter()
        .filter(|a| a.category == category)
        .map(|a| {
            let change = a.change();
            let change_percent = change
                .checked_div(a.current_limit)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .map(|pct| pct.round_dp(2));
            HistoryEntry {
                adjustment_id: a.id,
                target: a.target,
                previous_limit: a.current_limit,
                new_limit: a.new_limit,
                change,
                change_percent,
                status: a.status,
                reason: a.reason.clone(),
                created_at: a.created_at,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.target
            .cmp(&a.target)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    entries
}

/// Categories with the most adjustments, count descending then name.
#[must_use]
pub fn most_adjusted(adjustments: &[BudgetAdjustment], limit: usize) -> Vec<CategoryActivity> {
    let mut by_category: BTreeMap<&str, (usize, Decimal)> = BTreeMap::new();
    for adjustment in adjustments {
        let entry = by_category
            .entry(adjustment.category.as_str())
            .or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(adjustment.change());
    }

    let mut ranked: Vec<CategoryActivity> = by_category
        .into_iter()
        .map(|(category, (count, net_change))| CategoryActivity {
            category: category.to_string(),
            count,
            net_change,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    ranked.truncate(limit);
    ranked
}

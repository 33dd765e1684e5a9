//! Transaction list filtering.
//!
//! Filters run in a fixed order: month, then type, then member, then
//! category. Each stage is usable on its own. Empty multi-select sets do not
//! restrict anything.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{Transaction, TransactionType};
use crate::period::YearMonth;

const CAROUSEL_PREFIX: &str = "carousel-";

/// Inclusive date range for one month of the carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
}

impl MonthWindow {
    /// Window covering a whole calendar month.
    #[must_use]
    pub fn of(period: YearMonth) -> Self {
        Self {
            start: period.first_day(),
            end: period.last_day(),
        }
    }

    /// Returns true if `date` lies inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Builds the month carousel: `anchor` first, then `count - 1` earlier months.
#[must_use]
pub fn carousel_months(anchor: YearMonth, count: usize) -> Vec<MonthWindow> {
    (0..count)
        .map(|offset| {
            let offset = u32::try_from(offset).unwrap_or(u32::MAX);
            MonthWindow::of(anchor.minus_months(offset))
        })
        .collect()
}

/// Parsed value of the `month` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthSelector {
    /// `carousel-N`: the N-th entry of the carousel.
    Carousel(usize),
    /// `YYYY-MM`.
    Literal(YearMonth),
    /// Anything else. Filters nothing.
    Malformed(String),
}

impl MonthSelector {
    /// Parses the wire form. Never fails; bad input becomes `Malformed`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(index) = raw.strip_prefix(CAROUSEL_PREFIX) {
            return index
                .parse()
                .map_or_else(|_| Self::Malformed(raw.to_string()), Self::Carousel);
        }
        raw.parse()
            .map_or_else(|_| Self::Malformed(raw.to_string()), Self::Literal)
    }
}

/// Filters for a transaction list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilters {
    /// Month restriction.
    pub month: Option<MonthSelector>,
    /// Allowed types.
    pub types: BTreeSet<TransactionType>,
    /// Allowed family members.
    pub members: BTreeSet<String>,
    /// Allowed categories.
    pub categories: BTreeSet<String>,
}

/// Keeps transactions in the selected month.
///
/// A carousel index past the end yields nothing; a malformed selector keeps
/// everything.
#[must_use]
pub fn filter_by_month(
    transactions: Vec<Transaction>,
    selector: &MonthSelector,
    months: &[MonthWindow],
) -> Vec<Transaction> {
    let window = match selector {
        MonthSelector::Carousel(index) => match months.get(*index) {
            Some(window) => *window,
            None => return Vec::new(),
        },
        MonthSelector::Literal(period) => MonthWindow::of(*period),
        MonthSelector::Malformed(_) => return transactions,
    };
    transactions
        .into_iter()
        .filter(|t| window.contains(t.date))
        .collect()
}

/// Keeps transactions whose type is selected.
#[must_use]
pub fn filter_by_types(
    transactions: Vec<Transaction>,
    types: &BTreeSet<TransactionType>,
) -> Vec<Transaction> {
    if types.is_empty() {
        return transactions;
    }
    transactions
        .into_iter()
        .filter(|t| types.contains(&t.transaction_type))
        .collect()
}

/// Keeps transactions of the selected members. Transactions without a member
/// never match a non-empty selection.
#[must_use]
pub fn filter_by_members(
    transactions: Vec<Transaction>,
    members: &BTreeSet<String>,
) -> Vec<Transaction> {
    if members.is_empty() {
        return transactions;
    }
    transactions
        .into_iter()
        .filter(|t| t.family_member.as_ref().is_some_and(|m| members.contains(m)))
        .collect()
}

/// Keeps transactions in the selected categories.
#[must_use]
pub fn filter_by_categories(
    transactions: Vec<Transaction>,
    categories: &BTreeSet<String>,
) -> Vec<Transaction> {
    if categories.is_empty() {
        return transactions;
    }
    transactions
        .into_iter()
        .filter(|t| categories.contains(&t.category))
        .collect()
}

/// Runs every stage in order.
#[must_use]
pub fn apply(
    transactions: Vec<Transaction>,
    filters: &TransactionFilters,
    months: &[MonthWindow],
) -> Vec<Transaction> {
    let by_month = match &filters.month {
        Some(selector) => filter_by_month(transactions, selector, months),
        None => transactions,
    };
    let by_type = filter_by_types(by_month, &filters.types);
    let by_member = filter_by_members(by_type, &filters.members);
    filter_by_categories(by_member, &filters.categories)
}

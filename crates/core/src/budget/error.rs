//! Budget error types.

use thiserror::Error;
use uuid::Uuid;

use crate::error::ErrorKind;
use crate::period::{PeriodError, YearMonth};

/// Budget-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    /// Category name is empty or too long.
    #[error("Invalid category name '{name}': {reason}")]
    InvalidCategoryName {
        /// Offending name.
        name: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Category limit below zero.
    #[error("Monthly limit for category '{category}' cannot be negative")]
    NegativeLimit {
        /// Category name.
        category: String,
    },

    /// Limit too large or too precise.
    #[error("Monthly limit for category '{category}' is out of range: {reason}")]
    LimitOutOfRange {
        /// Category name.
        category: String,
        /// Which bound was broken.
        reason: &'static str,
    },

    /// Summing category limits overflowed.
    #[error("Category limits are too large to total")]
    TotalOverflow,

    /// Warning threshold outside 0..=100.
    #[error("Warning threshold for category '{category}' must be between 0 and 100")]
    InvalidThreshold {
        /// Category name.
        category: String,
    },

    /// Two entries normalize to the same category name.
    #[error("Category '{0}' appears more than once")]
    DuplicateCategory(String),

    /// Budget name is empty or too long.
    #[error("Invalid budget name: {0}")]
    InvalidBudgetName(&'static str),

    /// Settings block is invalid.
    #[error("Invalid budget settings: {0}")]
    InvalidSettings(String),

    /// Adjustment input is invalid.
    #[error("Invalid adjustment: {0}")]
    InvalidAdjustment(String),

    /// Bad year/month.
    #[error(transparent)]
    Period(#[from] PeriodError),

    /// Adjustment target lies before the current month.
    #[error("Adjustment target {target} is before the current month {current}")]
    TargetInPast {
        /// Requested target month.
        target: YearMonth,
        /// Month the request was made in.
        current: YearMonth,
    },

    /// The household has no active personal budget.
    #[error("No active personal budget; create or activate one first")]
    NoActiveBudget,

    /// Personal budget not found.
    #[error("Personal budget not found: {0}")]
    BudgetNotFound(Uuid),

    /// Category missing from the budget.
    #[error("Category '{0}' not found in this budget")]
    CategoryNotFound(String),

    /// Adjustment not found.
    #[error("Adjustment not found: {0}")]
    AdjustmentNotFound(Uuid),

    /// Monthly budget is locked and cannot be modified.
    #[error("Monthly budget {0} is locked; unlock it before editing")]
    MonthLocked(YearMonth),

    /// The row changed since the caller read it.
    #[error("Monthly budget {period} was modified concurrently (expected revision {expected}, found {actual}); reload and retry")]
    StaleRevision {
        /// Month being edited.
        period: YearMonth,
        /// Revision the caller saw.
        expected: i32,
        /// Revision currently stored.
        actual: i32,
    },

    /// Applied adjustments are history and cannot be cancelled.
    #[error("Adjustment {0} has already been applied")]
    AdjustmentAlreadyApplied(Uuid),

    /// Adjustments for a month cannot be applied before it starts.
    #[error("Adjustments for {0} are not due until that month starts")]
    AdjustmentNotDue(YearMonth),
}

impl BudgetError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCategoryName { .. }
            | Self::NegativeLimit { .. }
            | Self::LimitOutOfRange { .. }
            | Self::TotalOverflow
            | Self::InvalidThreshold { .. }
            | Self::DuplicateCategory(_)
            | Self::InvalidBudgetName(_)
            | Self::InvalidSettings(_)
            | Self::InvalidAdjustment(_)
            | Self::Period(_)
            | Self::TargetInPast { .. } => ErrorKind::Validation,
            Self::NoActiveBudget
            | Self::BudgetNotFound(_)
            | Self::CategoryNotFound(_)
            | Self::AdjustmentNotFound(_) => ErrorKind::NotFound,
            Self::MonthLocked(_)
            | Self::StaleRevision { .. }
            | Self::AdjustmentAlreadyApplied(_)
            | Self::AdjustmentNotDue(_) => ErrorKind::StateConflict,
        }
    }
}

//! Personal templates, monthly snapshots and scheduled adjustments.

pub mod adjustment;
pub mod error;
pub mod history;
pub mod monthly;
pub mod personal;

#[cfg(test)]
mod tests;

pub use adjustment::{
    AdjustmentStatus, BudgetAdjustment, ScheduleAdjustment, Scheduled, apply_due,
    ensure_cancellable, ensure_due, schedule,
};
pub use error::BudgetError;
pub use history::{CategoryActivity, HistoryEntry, category_history, most_adjusted};
pub use monthly::{BudgetComparison, CategoryDiff, DiffKind, MonthlyBudget, compare};
pub use personal::{
    Actor, BudgetChange, BudgetSettings, NewPersonalBudget, PersonalBudget, PersonalBudgetSet,
    UpdateKind, UpdatePersonalBudget, classify_update,
};

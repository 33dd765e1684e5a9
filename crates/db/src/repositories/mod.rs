//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every call opens one RLS-scoped transaction, so multi-row changes are
//! all-or-nothing.

pub mod adjustment;
pub mod category;
pub mod local;
pub mod monthly_budget;
pub mod personal_budget;
pub mod transaction;

pub use adjustment::{AdjustmentRepository, ApplyOutcome};
pub use category::{CategoryRepository, RenameReport};
pub use local::LocalTransactionStore;
pub use monthly_budget::MonthlyBudgetRepository;
pub use personal_budget::PersonalBudgetRepository;
pub use transaction::{TransactionRepository, TransactionStore};

use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;

pub(crate) fn to_db_time(value: DateTime<Utc>) -> DateTimeWithTimeZone {
    value.fixed_offset()
}

pub(crate) fn from_db_time(value: DateTimeWithTimeZone) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

//! Household transactions and the list filter.

pub mod filter;
pub mod types;

pub use filter::{MonthSelector, MonthWindow, TransactionFilters, apply, carousel_months};
pub use types::{Transaction, TransactionError, TransactionInput, TransactionType};

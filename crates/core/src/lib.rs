//! Core business logic for Nestegg.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage and HTTP layers load records, call into these rules, and persist
//! what they return.
//!
//! # Modules
//!
//! - `budget` - Personal templates, monthly snapshots and scheduled adjustments
//! - `category` - Category configuration, validation and rename/merge
//! - `color` - Category color allocation
//! - `currency` - Amount formatting
//! - `dashboard` - Overview and trend aggregates
//! - `period` - Calendar months
//! - `transaction` - Transaction records and list filtering

pub mod budget;
pub mod category;
pub mod color;
pub mod currency;
pub mod dashboard;
pub mod error;
pub mod period;
pub mod transaction;

pub use error::ErrorKind;
pub use period::{PeriodError, YearMonth};

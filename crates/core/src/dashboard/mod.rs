//! Dashboard and chart aggregates.
//!
//! This module provides:
//! - The per-month overview (totals and per-category status)
//! - The income/expense trend across months

pub mod overview;
pub mod types;

pub use overview::{build_overview, category_status, monthly_trend, utilization_percent};
pub use types::*;

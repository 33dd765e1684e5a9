//! `SeaORM` entity definitions.

pub mod budget_adjustments;
pub mod monthly_budgets;
pub mod personal_budgets;
pub mod sea_orm_active_enums;
pub mod transactions;

//! `SeaORM` active enums for PostgreSQL enum types.

use nestegg_core::budget;
use nestegg_core::transaction;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "adjustment_status")]
pub enum AdjustmentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "applied")]
    Applied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
pub enum TransactionType {
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
}

impl From<AdjustmentStatus> for budget::AdjustmentStatus {
    fn from(value: AdjustmentStatus) -> Self {
        match value {
            AdjustmentStatus::Pending => Self::Pending,
            AdjustmentStatus::Applied => Self::Applied,
        }
    }
}

impl From<budget::AdjustmentStatus> for AdjustmentStatus {
    fn from(value: budget::AdjustmentStatus) -> Self {
        match value {
            budget::AdjustmentStatus::Pending => Self::Pending,
            budget::AdjustmentStatus::Applied => Self::Applied,
        }
    }
}

impl From<TransactionType> for transaction::TransactionType {
    fn from(value: TransactionType) -> Self {
        match value {
            TransactionType::Income => Self::Income,
            TransactionType::Expense => Self::Expense,
        }
    }
}

impl From<transaction::TransactionType> for TransactionType {
    fn from(value: transaction::TransactionType) -> Self {
        match value {
            transaction::TransactionType::Income => Self::Income,
            transaction::TransactionType::Expense => Self::Expense,
        }
    }
}

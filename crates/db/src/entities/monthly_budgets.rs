//! `SeaORM` Entity for monthly_budgets table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "monthly_budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub household_id: Uuid,
    pub year: i32,
    pub month: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub categories: Json,
    pub source_budget_id: Option<Uuid>,
    pub source_version: Option<i32>,
    pub is_locked: bool,
    pub adjustment_count: i32,
    pub revision: i32,
    pub synced_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::personal_budgets::Entity",
        from = "Column::SourceBudgetId",
        to = "super::personal_budgets::Column::Id",
        on_delete = "SetNull"
    )]
    PersonalBudgets,
}

impl Related<super::personal_budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PersonalBudgets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

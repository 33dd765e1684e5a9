//! Migration to enable FORCE ROW LEVEL SECURITY on all household tables.
//!
//! Without it the table owner, which is usually the application role,
//! bypasses the policies.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(FORCE_RLS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DISABLE_FORCE_RLS_SQL).await?;
        Ok(())
    }
}

const FORCE_RLS_SQL: &str = r"
ALTER TABLE personal_budgets FORCE ROW LEVEL SECURITY;
ALTER TABLE monthly_budgets FORCE ROW LEVEL SECURITY;
ALTER TABLE budget_adjustments FORCE ROW LEVEL SECURITY;
ALTER TABLE transactions FORCE ROW LEVEL SECURITY;
";

const DISABLE_FORCE_RLS_SQL: &str = r"
ALTER TABLE personal_budgets NO FORCE ROW LEVEL SECURITY;
ALTER TABLE monthly_budgets NO FORCE ROW LEVEL SECURITY;
ALTER TABLE budget_adjustments NO FORCE ROW LEVEL SECURITY;
ALTER TABLE transactions NO FORCE ROW LEVEL SECURITY;
";

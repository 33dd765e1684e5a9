//! Initial database migration.
//!
//! Creates the enums, budget and transaction tables, indexes and RLS
//! policies. Households and users live with the authentication provider, so
//! their ids are plain UUID columns here.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: BUDGETS
        // ============================================================
        db.execute_unprepared(PERSONAL_BUDGETS_SQL).await?;
        db.execute_unprepared(MONTHLY_BUDGETS_SQL).await?;
        db.execute_unprepared(BUDGET_ADJUSTMENTS_SQL).await?;

        // ============================================================
        // PART 3: TRANSACTIONS
        // ============================================================
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 4: ROW-LEVEL SECURITY
        // ============================================================
        db.execute_unprepared(RLS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE adjustment_status AS ENUM ('pending', 'applied');

CREATE TYPE transaction_type AS ENUM ('income', 'expense');
";

const PERSONAL_BUDGETS_SQL: &str = r"
CREATE TABLE personal_budgets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    household_id UUID NOT NULL,
    name VARCHAR(100) NOT NULL,
    description TEXT,
    categories JSONB NOT NULL DEFAULT '{}'::jsonb,
    settings JSONB NOT NULL DEFAULT '{}'::jsonb,
    version INTEGER NOT NULL CHECK (version > 0),
    is_active BOOLEAN NOT NULL DEFAULT false,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (household_id, version)
);

-- At most one active template per household
CREATE UNIQUE INDEX idx_personal_budgets_one_active
    ON personal_budgets(household_id)
    WHERE is_active;
";

const MONTHLY_BUDGETS_SQL: &str = r"
CREATE TABLE monthly_budgets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    household_id UUID NOT NULL,
    year INTEGER NOT NULL CHECK (year BETWEEN 1970 AND 9999),
    month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    categories JSONB NOT NULL DEFAULT '{}'::jsonb,
    source_budget_id UUID REFERENCES personal_budgets(id) ON DELETE SET NULL,
    source_version INTEGER,
    is_locked BOOLEAN NOT NULL DEFAULT false,
    adjustment_count INTEGER NOT NULL DEFAULT 0 CHECK (adjustment_count >= 0),
    revision INTEGER NOT NULL DEFAULT 0,
    synced_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (household_id, year, month)
);
";

const BUDGET_ADJUSTMENTS_SQL: &str = r"
CREATE TABLE budget_adjustments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    household_id UUID NOT NULL,
    category VARCHAR(64) NOT NULL,
    current_limit NUMERIC(19, 4) NOT NULL CHECK (current_limit >= 0),
    new_limit NUMERIC(19, 4) NOT NULL CHECK (new_limit >= 0),
    reason TEXT,
    target_year INTEGER NOT NULL CHECK (target_year BETWEEN 1970 AND 9999),
    target_month INTEGER NOT NULL CHECK (target_month BETWEEN 1 AND 12),
    status adjustment_status NOT NULL DEFAULT 'pending',
    applied_at TIMESTAMPTZ,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CHECK ((status = 'applied') = (applied_at IS NOT NULL))
);

CREATE INDEX idx_budget_adjustments_target
    ON budget_adjustments(household_id, target_year, target_month);

-- One pending change per category and month
CREATE UNIQUE INDEX idx_budget_adjustments_one_pending
    ON budget_adjustments(household_id, category, target_year, target_month)
    WHERE status = 'pending';
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    household_id UUID NOT NULL,
    transaction_date DATE NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    category VARCHAR(64) NOT NULL,
    transaction_type transaction_type NOT NULL,
    family_member VARCHAR(100),
    description TEXT,
    created_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_transactions_household_date ON transactions(household_id, transaction_date);
CREATE INDEX idx_transactions_household_category ON transactions(household_id, category);
";

const RLS_SQL: &str = r"
-- ============================================================
-- ROW-LEVEL SECURITY POLICIES
-- Application sets context per transaction:
--   SET LOCAL app.current_household_id = 'household-uuid';
-- ============================================================

ALTER TABLE personal_budgets ENABLE ROW LEVEL SECURITY;
ALTER TABLE monthly_budgets ENABLE ROW LEVEL SECURITY;
ALTER TABLE budget_adjustments ENABLE ROW LEVEL SECURITY;
ALTER TABLE transactions ENABLE ROW LEVEL SECURITY;

CREATE POLICY household_isolation ON personal_budgets
    USING (household_id = current_setting('app.current_household_id', true)::UUID);

CREATE POLICY household_isolation ON monthly_budgets
    USING (household_id = current_setting('app.current_household_id', true)::UUID);

CREATE POLICY household_isolation ON budget_adjustments
    USING (household_id = current_setting('app.current_household_id', true)::UUID);

CREATE POLICY household_isolation ON transactions
    USING (household_id = current_setting('app.current_household_id', true)::UUID);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS budget_adjustments CASCADE;
DROP TABLE IF EXISTS monthly_budgets CASCADE;
DROP TABLE IF EXISTS personal_budgets CASCADE;
DROP TYPE IF EXISTS transaction_type;
DROP TYPE IF EXISTS adjustment_status;
";

//! Initial database migration.
//!
//! Creates the enums and tables for companies, sequences, configuration,
//! fiscal years and periods, the organization tree, moves and lines.

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
        // PART 2: COMPANIES, SEQUENCES, CONFIGURATION
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(SEQUENCES_SQL).await?;
        db.execute_unprepared(CONFIGURATIONS_SQL).await?;

        // ============================================================
        // PART 3: FISCAL CALENDAR
        // ============================================================
        db.execute_unprepared(YEARS_SQL).await?;
        db.execute_unprepared(PERIODS_SQL).await?;

        // ============================================================
        // PART 4: ORGANIZATION TREE
        // ============================================================
        db.execute_unprepared(META_GROUPS_SQL).await?;
        db.execute_unprepared(GROUPS_SQL).await?;

        // ============================================================
        // PART 5: MOVES & LINES
        // ============================================================
        db.execute_unprepared(MOVES_SQL).await?;
        db.execute_unprepared(LINES_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE year_state AS ENUM ('open', 'close');

CREATE TYPE period_state AS ENUM ('open', 'close', 'locked');

CREATE TYPE period_type AS ENUM ('standard', 'adjustment');

CREATE TYPE group_type AS ENUM (
    'conference',
    'division',
    'union',
    'field',
    'zone',
    'district',
    'church',
    'small_group'
);

CREATE TYPE move_state AS ENUM ('draft', 'quotation', 'posted', 'canceled');

CREATE TYPE line_state AS ENUM ('draft', 'valid');

CREATE TYPE metric AS ENUM (
    'baptism',
    'tithe',
    'offering',
    'small_group',
    'gathering',
    'church_planting',
    'organizing_church',
    'praise_thanksgiving'
);
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    parent_id UUID REFERENCES companies(id),
    currency_code VARCHAR(3) NOT NULL DEFAULT 'USD',
    currency_digits INTEGER NOT NULL DEFAULT 2,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_currency_digits CHECK (currency_digits BETWEEN 0 AND 8),
    CONSTRAINT chk_company_not_own_parent CHECK (parent_id IS NULL OR parent_id <> id)
);

CREATE INDEX idx_companies_parent ON companies(parent_id);
";

const SEQUENCES_SQL: &str = r"
CREATE TABLE sequences (
    id UUID PRIMARY KEY,
    company_id UUID REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(100) NOT NULL,
    prefix VARCHAR(20) NOT NULL DEFAULT '',
    padding INTEGER NOT NULL DEFAULT 0,
    next_number BIGINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_sequence_padding CHECK (padding BETWEEN 0 AND 20),
    CONSTRAINT chk_sequence_next CHECK (next_number > 0)
);
";

const CONFIGURATIONS_SQL: &str = r"
CREATE TABLE configurations (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL UNIQUE REFERENCES companies(id) ON DELETE CASCADE,
    move_sequence_id UUID REFERENCES sequences(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE configuration_targets (
    id UUID PRIMARY KEY,
    configuration_id UUID NOT NULL REFERENCES configurations(id) ON DELETE CASCADE,
    metric metric NOT NULL,
    value NUMERIC(16, 4) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_configuration_target UNIQUE (configuration_id, metric),
    CONSTRAINT chk_target_not_negative CHECK (value >= 0)
);
";

const YEARS_SQL: &str = r"
CREATE TABLE years (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(100) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    state year_state NOT NULL DEFAULT 'open',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_year_dates CHECK (start_date <= end_date)
);

CREATE INDEX idx_years_company_dates ON years(company_id, start_date, end_date);
";

const PERIODS_SQL: &str = r"
CREATE TABLE periods (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    year_id UUID NOT NULL REFERENCES years(id) ON DELETE CASCADE,
    name VARCHAR(100) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    state period_state NOT NULL DEFAULT 'open',
    period_type period_type NOT NULL DEFAULT 'standard',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_period_dates CHECK (start_date <= end_date)
);

CREATE INDEX idx_periods_year ON periods(year_id, start_date);
CREATE INDEX idx_periods_company_dates ON periods(company_id, start_date, end_date);
";

const META_GROUPS_SQL: &str = r"
CREATE TABLE meta_groups (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    code VARCHAR(50),
    active BOOLEAN NOT NULL DEFAULT TRUE,
    group_type group_type NOT NULL DEFAULT 'small_group',
    parent_id UUID REFERENCES meta_groups(id),
    sequence INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_meta_group_not_own_parent CHECK (parent_id IS NULL OR parent_id <> id)
);

CREATE INDEX idx_meta_groups_company ON meta_groups(company_id);
CREATE INDEX idx_meta_groups_parent ON meta_groups(parent_id);
";

const GROUPS_SQL: &str = r"
CREATE TABLE groups (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    meta_id UUID NOT NULL UNIQUE REFERENCES meta_groups(id) ON DELETE RESTRICT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const MOVES_SQL: &str = r"
CREATE TABLE moves (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    number VARCHAR(50),
    post_number VARCHAR(50),
    date DATE NOT NULL,
    post_date DATE,
    description TEXT,
    state move_state NOT NULL DEFAULT 'draft',
    group_id UUID NOT NULL REFERENCES meta_groups(id),
    period_id UUID NOT NULL REFERENCES periods(id),
    control_metric metric,
    control_amount NUMERIC(16, 4),
    created_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    -- One report per church and period
    CONSTRAINT uq_move_group_period UNIQUE (group_id, period_id),
    CONSTRAINT chk_move_control CHECK ((control_metric IS NULL) = (control_amount IS NULL))
);

CREATE INDEX idx_moves_company_state ON moves(company_id, state);
CREATE INDEX idx_moves_period ON moves(period_id);
";

const LINES_SQL: &str = r"
CREATE TABLE lines (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    move_id UUID NOT NULL REFERENCES moves(id) ON DELETE CASCADE,
    group_id UUID NOT NULL REFERENCES groups(id),
    state line_state NOT NULL DEFAULT 'draft',
    baptism NUMERIC(16, 0) NOT NULL DEFAULT 0,
    tithe NUMERIC(16, 4) NOT NULL DEFAULT 0,
    offering NUMERIC(16, 4) NOT NULL DEFAULT 0,
    small_group NUMERIC(16, 0) NOT NULL DEFAULT 0,
    gathering NUMERIC(16, 0) NOT NULL DEFAULT 0,
    church_planting NUMERIC(16, 0) NOT NULL DEFAULT 0,
    organizing_church NUMERIC(16, 0) NOT NULL DEFAULT 0,
    praise_thanksgiving NUMERIC(16, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_lines_move ON lines(move_id);
CREATE INDEX idx_lines_group_state ON lines(group_id, state);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_companies_updated_at BEFORE UPDATE ON companies
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_sequences_updated_at BEFORE UPDATE ON sequences
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_configurations_updated_at BEFORE UPDATE ON configurations
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_configuration_targets_updated_at BEFORE UPDATE ON configuration_targets
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_years_updated_at BEFORE UPDATE ON years
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_periods_updated_at BEFORE UPDATE ON periods
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_meta_groups_updated_at BEFORE UPDATE ON meta_groups
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_groups_updated_at BEFORE UPDATE ON groups
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_moves_updated_at BEFORE UPDATE ON moves
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_lines_updated_at BEFORE UPDATE ON lines
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS lines CASCADE;
DROP TABLE IF EXISTS moves CASCADE;
DROP TABLE IF EXISTS groups CASCADE;
DROP TABLE IF EXISTS meta_groups CASCADE;
DROP TABLE IF EXISTS periods CASCADE;
DROP TABLE IF EXISTS years CASCADE;
DROP TABLE IF EXISTS configuration_targets CASCADE;
DROP TABLE IF EXISTS configurations CASCADE;
DROP TABLE IF EXISTS sequences CASCADE;
DROP TABLE IF EXISTS companies CASCADE;

DROP FUNCTION IF EXISTS touch_updated_at() CASCADE;

DROP TYPE IF EXISTS metric;
DROP TYPE IF EXISTS line_state;
DROP TYPE IF EXISTS move_state;
DROP TYPE IF EXISTS group_type;
DROP TYPE IF EXISTS period_type;
DROP TYPE IF EXISTS period_state;
DROP TYPE IF EXISTS year_state;
";

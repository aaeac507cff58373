//! Fiscal year and period repository.
//!
//! Year close/reopen, period creation and period edits all take an
//! exclusive lock on the `periods` table for the length of their
//! transaction, so they serialize against each other while plain reads
//! continue.

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tmi_core::clock::{Clock, SystemClock};
use tmi_core::fiscal::{FiscalError, FiscalService, Period, PeriodChanges, PeriodState, PeriodType, Year, YearState};
use tmi_shared::types::{CompanyId, PeriodId, YearId};
use tracing::{info, warn};

use crate::entities::{moves, periods, sea_orm_active_enums, years};

/// Error types for fiscal repository operations.
#[derive(Debug, thiserror::Error)]
pub enum FiscalRepoError {
    /// A fiscal calendar rule was violated.
    #[error(transparent)]
    Fiscal(#[from] FiscalError),

    /// Year not found.
    #[error("Year not found: {0}")]
    YearNotFound(YearId),

    /// Period not found.
    #[error("Period not found: {0}")]
    PeriodNotFound(PeriodId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a year.
#[derive(Debug, Clone)]
pub struct CreateYearInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Year name (e.g., "2024").
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
}

/// Input for creating a single period.
#[derive(Debug, Clone)]
pub struct CreatePeriodInput {
    /// Owning year.
    pub year_id: YearId,
    /// Period name.
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Standard or adjustment.
    pub period_type: PeriodType,
}

const LOCK_PERIODS_SQL: &str = "LOCK TABLE periods IN EXCLUSIVE MODE";

/// Fiscal year and period repository.
#[derive(Debug, Clone)]
pub struct FiscalRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl FiscalRepository {
    /// Creates a new fiscal repository using the UTC wall clock.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_clock(db, Arc::new(SystemClock::default()))
    }

    /// Creates a new fiscal repository with an explicit clock.
    #[must_use]
    pub fn with_clock(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    // ------------------------------------------------------------------
    // Years
    // ------------------------------------------------------------------

    /// Creates a year after checking its dates against the company's other
    /// years.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or `YearOverlaps`, or a database error.
    pub async fn create_year(&self, input: CreateYearInput) -> Result<Year, FiscalRepoError> {
        let txn = self.db.begin().await?;

        let year = Year {
            id: YearId::generate(),
            company_id: input.company_id,
            name: input.name,
            start_date: input.start_date,
            end_date: input.end_date,
            state: YearState::Open,
        };
        let others = load_years(&txn, input.company_id).await?;
        FiscalService::validate_year(&year, &others)?;

        let now = chrono::Utc::now().into();
        years::ActiveModel {
            id: Set(year.id.uuid()),
            company_id: Set(year.company_id.uuid()),
            name: Set(year.name.clone()),
            start_date: Set(year.start_date),
            end_date: Set(year.end_date),
            state: Set(year.state.into()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(year_id = %year.id, name = %year.name, "Year created");
        Ok(year)
    }

    /// Lists the years of a company, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn years(&self, company_id: CompanyId) -> Result<Vec<Year>, FiscalRepoError> {
        Ok(load_years(&self.db, company_id).await?)
    }

    /// Finds a year by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_year(&self, year_id: YearId) -> Result<Option<Year>, FiscalRepoError> {
        Ok(years::Entity::find_by_id(year_id.uuid())
            .one(&self.db)
            .await?
            .map(Year::from))
    }

    /// Returns the year containing `date` (today when `None`), or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_year(&self, company_id: CompanyId, date: Option<NaiveDate>) -> Result<Option<Year>, FiscalRepoError> {
        let date = date.unwrap_or_else(|| self.clock.today());
        let years = load_years(&self.db, company_id).await?;
        Ok(FiscalService::find_year(&years, date).cloned())
    }

    /// Like [`Self::find_year`] but fails with `NoYearForDate`.
    ///
    /// # Errors
    ///
    /// Returns `NoYearForDate` when no year contains the date.
    pub async fn require_year(&self, company_id: CompanyId, date: Option<NaiveDate>) -> Result<Year, FiscalRepoError> {
        let date = date.unwrap_or_else(|| self.clock.today());
        let years = load_years(&self.db, company_id).await?;
        Ok(FiscalService::require_year(&years, date)?.clone())
    }

    /// Closes a year and every open period inside it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidYearTransition` or `EarlierYearOpen`, or a database
    /// error. Nothing is written on failure.
    pub async fn close_year(&self, year_id: YearId) -> Result<Year, FiscalRepoError> {
        let txn = self.db.begin().await?;
        lock_periods(&txn).await?;

        let mut year = require_year_by_id(&txn, year_id).await?;
        let all_years = load_years(&txn, year.company_id).await?;
        if let Err(err) = FiscalService::validate_close_year(&year, &all_years) {
            warn!(year_id = %year_id, error = %err, "Year close rejected");
            return Err(err.into());
        }

        let year_periods = load_year_periods(&txn, year_id).await?;
        let to_close = FiscalService::periods_to_close(&year_periods);
        if !to_close.is_empty() {
            periods::Entity::update_many()
                .col_expr(
                    periods::Column::State,
                    sea_orm_active_enums::PeriodState::Close.as_enum(),
                )
                .filter(periods::Column::Id.is_in(to_close.iter().map(|id| id.uuid())))
                .exec(&txn)
                .await?;
        }
        set_year_state(&txn, year_id, YearState::Close).await?;

        txn.commit().await?;
        year.state = YearState::Close;
        info!(year_id = %year_id, count = to_close.len(), "Year closed");
        Ok(year)
    }

    /// Reopens a closed year. Its periods keep their state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidYearTransition` or `LaterYearClosed`, or a database
    /// error.
    pub async fn reopen_year(&self, year_id: YearId) -> Result<Year, FiscalRepoError> {
        let txn = self.db.begin().await?;
        lock_periods(&txn).await?;

        let mut year = require_year_by_id(&txn, year_id).await?;
        let all_years = load_years(&txn, year.company_id).await?;
        if let Err(err) = FiscalService::validate_reopen_year(&year, &all_years) {
            warn!(year_id = %year_id, error = %err, "Year reopen rejected");
            return Err(err.into());
        }
        set_year_state(&txn, year_id, YearState::Open).await?;

        txn.commit().await?;
        year.state = YearState::Open;
        info!(year_id = %year_id, "Year reopened");
        Ok(year)
    }

    // ------------------------------------------------------------------
    // Periods
    // ------------------------------------------------------------------

    /// Splits each year into standard periods of `interval` months.
    ///
    /// Periods are named `YYYY-MM`, or `YYYY-MM - YYYY-MM` when they span
    /// several months. All years are handled in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInterval`, `CreatePeriodInClosedYear` or
    /// `PeriodOverlaps`, or a database error.
    pub async fn create_period(&self, year_ids: &[YearId], interval: u32) -> Result<Vec<Period>, FiscalRepoError> {
        let txn = self.db.begin().await?;
        lock_periods(&txn).await?;

        let mut created = Vec::new();
        for &year_id in year_ids {
            let year = require_year_by_id(&txn, year_id).await?;
            let mut siblings = load_year_periods(&txn, year_id).await?;
            for plan in FiscalService::plan_periods(&year, interval)? {
                let period = Period {
                    id: PeriodId::generate(),
                    year_id,
                    name: plan.name,
                    start_date: plan.start_date,
                    end_date: plan.end_date,
                    state: PeriodState::Open,
                    period_type: PeriodType::Standard,
                };
                FiscalService::validate_new_period(&period, &year, &siblings)?;
                insert_period(&txn, &period, year.company_id).await?;
                siblings.push(period.clone());
                created.push(period);
            }
        }

        txn.commit().await?;
        info!(years = year_ids.len(), count = created.len(), interval, "Periods created");
        Ok(created)
    }

    /// Creates one period, standard or adjustment.
    ///
    /// # Errors
    ///
    /// Returns the period validation error, or a database error.
    pub async fn create_single_period(&self, input: CreatePeriodInput) -> Result<Period, FiscalRepoError> {
        let txn = self.db.begin().await?;
        lock_periods(&txn).await?;

        let year = require_year_by_id(&txn, input.year_id).await?;
        let siblings = load_year_periods(&txn, input.year_id).await?;
        let period = Period {
            id: PeriodId::generate(),
            year_id: input.year_id,
            name: input.name,
            start_date: input.start_date,
            end_date: input.end_date,
            state: PeriodState::Open,
            period_type: input.period_type,
        };
        FiscalService::validate_new_period(&period, &year, &siblings)?;
        insert_period(&txn, &period, year.company_id).await?;

        txn.commit().await?;
        info!(period_id = %period.id, name = %period.name, "Period created");
        Ok(period)
    }

    /// Periods of a year ordered by start date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn year_periods(&self, year_id: YearId) -> Result<Vec<Period>, FiscalRepoError> {
        Ok(load_year_periods(&self.db, year_id).await?)
    }

    /// Periods of every year of a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn company_periods(&self, company_id: CompanyId) -> Result<Vec<Period>, FiscalRepoError> {
        Ok(load_company_periods(&self.db, company_id).await?)
    }

    /// Finds a period by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_period(&self, period_id: PeriodId) -> Result<Option<Period>, FiscalRepoError> {
        Ok(periods::Entity::find_by_id(period_id.uuid())
            .one(&self.db)
            .await?
            .map(Period::from))
    }

    /// Returns the standard period containing `date` (today when `None`).
    ///
    /// With `test_state` only open periods qualify.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_period(
        &self,
        company_id: CompanyId,
        date: Option<NaiveDate>,
        test_state: bool,
    ) -> Result<Option<Period>, FiscalRepoError> {
        let date = date.unwrap_or_else(|| self.clock.today());
        let periods = load_company_periods(&self.db, company_id).await?;
        Ok(FiscalService::find_period(&periods, date, test_state).cloned())
    }

    /// Like [`Self::find_period`] but fails with `NoPeriodForDate`.
    ///
    /// # Errors
    ///
    /// Returns `NoPeriodForDate` when nothing matches.
    pub async fn require_period(
        &self,
        company_id: CompanyId,
        date: Option<NaiveDate>,
        test_state: bool,
    ) -> Result<Period, FiscalRepoError> {
        let date = date.unwrap_or_else(|| self.clock.today());
        let periods = load_company_periods(&self.db, company_id).await?;
        Ok(FiscalService::require_period(&periods, date, test_state)?.clone())
    }

    /// Moves a period to `to` (close, lock or reopen).
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriodTransition` or `OpenPeriodInClosedYear`, or a
    /// database error.
    pub async fn set_period_state(&self, period_id: PeriodId, to: PeriodState) -> Result<Period, FiscalRepoError> {
        let txn = self.db.begin().await?;
        lock_periods(&txn).await?;

        let mut period = require_period_by_id(&txn, period_id).await?;
        let year = require_year_by_id(&txn, period.year_id).await?;
        if let Err(err) = FiscalService::validate_period_transition(&period, &year, to) {
            warn!(period_id = %period_id, error = %err, "Period transition rejected");
            return Err(err.into());
        }

        periods::ActiveModel {
            id: Set(period_id.uuid()),
            state: Set(to.into()),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        txn.commit().await?;
        info!(period_id = %period_id, from = %period.state, to = %to, "Period state changed");
        period.state = to;
        Ok(period)
    }

    /// Renames or re-dates a period.
    ///
    /// # Errors
    ///
    /// Returns `ModifyPeriodWithMoves` when the dates of a period with moves
    /// change, any period validation error, or a database error.
    pub async fn update_period(&self, period_id: PeriodId, changes: PeriodChanges) -> Result<Period, FiscalRepoError> {
        let txn = self.db.begin().await?;
        lock_periods(&txn).await?;

        let mut period = require_period_by_id(&txn, period_id).await?;
        let has_moves = changes.touches_dates() && period_has_moves(&txn, period_id).await?;
        FiscalService::validate_period_edit(&period, &changes, has_moves)?;

        if let Some(name) = changes.name {
            period.name = name;
        }
        if let Some(start) = changes.start_date {
            period.start_date = start;
        }
        if let Some(end) = changes.end_date {
            period.end_date = end;
        }
        let year = require_year_by_id(&txn, period.year_id).await?;
        let siblings = load_year_periods(&txn, period.year_id).await?;
        FiscalService::validate_period(&period, &year, &siblings)?;

        periods::ActiveModel {
            id: Set(period_id.uuid()),
            name: Set(period.name.clone()),
            start_date: Set(period.start_date),
            end_date: Set(period.end_date),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        txn.commit().await?;
        info!(period_id = %period_id, "Period updated");
        Ok(period)
    }

    /// Deletes a period without moves.
    ///
    /// # Errors
    ///
    /// Returns `DeletePeriodWithMoves`, or a database error.
    pub async fn delete_period(&self, period_id: PeriodId) -> Result<(), FiscalRepoError> {
        let txn = self.db.begin().await?;
        lock_periods(&txn).await?;

        let period = require_period_by_id(&txn, period_id).await?;
        let has_moves = period_has_moves(&txn, period_id).await?;
        FiscalService::validate_period_delete(&period, has_moves)?;
        periods::Entity::delete_by_id(period_id.uuid()).exec(&txn).await?;

        txn.commit().await?;
        info!(period_id = %period_id, "Period deleted");
        Ok(())
    }

    /// Deletes a year together with its periods.
    ///
    /// Every period is checked like [`Self::delete_period`]; one period
    /// with moves keeps the whole year.
    ///
    /// # Errors
    ///
    /// Returns `YearNotFound`, `DeletePeriodWithMoves`, or a database error.
    pub async fn delete_year(&self, year_id: YearId) -> Result<(), FiscalRepoError> {
        let txn = self.db.begin().await?;
        lock_periods(&txn).await?;

        require_year_by_id(&txn, year_id).await?;
        let year_periods = load_year_periods(&txn, year_id).await?;
        for period in &year_periods {
            let has_moves = period_has_moves(&txn, period.id).await?;
            if let Err(err) = FiscalService::validate_period_delete(period, has_moves) {
                warn!(year_id = %year_id, period_id = %period.id, "Year delete rejected");
                return Err(err.into());
            }
        }
        periods::Entity::delete_many()
            .filter(periods::Column::YearId.eq(year_id.uuid()))
            .exec(&txn)
            .await?;
        years::Entity::delete_by_id(year_id.uuid()).exec(&txn).await?;

        txn.commit().await?;
        info!(year_id = %year_id, count = year_periods.len(), "Year deleted");
        Ok(())
    }
}

// ----------------------------------------------------------------------
// Helpers shared with the other repositories
// ----------------------------------------------------------------------

/// Takes the period table lock for the rest of the transaction.
async fn lock_periods(txn: &DatabaseTransaction) -> Result<(), DbErr> {
    txn.execute_unprepared(LOCK_PERIODS_SQL).await?;
    Ok(())
}

pub(crate) async fn load_years<C: ConnectionTrait>(conn: &C, company_id: CompanyId) -> Result<Vec<Year>, DbErr> {
    Ok(years::Entity::find()
        .filter(years::Column::CompanyId.eq(company_id.uuid()))
        .order_by_asc(years::Column::StartDate)
        .all(conn)
        .await?
        .into_iter()
        .map(Year::from)
        .collect())
}

pub(crate) async fn load_year_periods<C: ConnectionTrait>(conn: &C, year_id: YearId) -> Result<Vec<Period>, DbErr> {
    Ok(periods::Entity::find()
        .filter(periods::Column::YearId.eq(year_id.uuid()))
        .order_by_asc(periods::Column::StartDate)
        .all(conn)
        .await?
        .into_iter()
        .map(Period::from)
        .collect())
}

pub(crate) async fn load_company_periods<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
) -> Result<Vec<Period>, DbErr> {
    Ok(periods::Entity::find()
        .filter(periods::Column::CompanyId.eq(company_id.uuid()))
        .order_by_asc(periods::Column::StartDate)
        .all(conn)
        .await?
        .into_iter()
        .map(Period::from)
        .collect())
}

async fn require_year_by_id<C: ConnectionTrait>(conn: &C, year_id: YearId) -> Result<Year, FiscalRepoError> {
    years::Entity::find_by_id(year_id.uuid())
        .one(conn)
        .await?
        .map(Year::from)
        .ok_or(FiscalRepoError::YearNotFound(year_id))
}

async fn require_period_by_id<C: ConnectionTrait>(conn: &C, period_id: PeriodId) -> Result<Period, FiscalRepoError> {
    periods::Entity::find_by_id(period_id.uuid())
        .one(conn)
        .await?
        .map(Period::from)
        .ok_or(FiscalRepoError::PeriodNotFound(period_id))
}

async fn period_has_moves<C: ConnectionTrait>(conn: &C, period_id: PeriodId) -> Result<bool, DbErr> {
    let count = moves::Entity::find()
        .filter(moves::Column::PeriodId.eq(period_id.uuid()))
        .count(conn)
        .await?;
    Ok(count > 0)
}

async fn set_year_state(txn: &DatabaseTransaction, year_id: YearId, state: YearState) -> Result<(), DbErr> {
    years::ActiveModel {
        id: Set(year_id.uuid()),
        state: Set(state.into()),
        ..Default::default()
    }
    .update(txn)
    .await?;
    Ok(())
}

async fn insert_period(txn: &DatabaseTransaction, period: &Period, company_id: CompanyId) -> Result<(), DbErr> {
    let now = chrono::Utc::now().into();
    periods::ActiveModel {
        id: Set(period.id.uuid()),
        company_id: Set(company_id.uuid()),
        year_id: Set(period.year_id.uuid()),
        name: Set(period.name.clone()),
        start_date: Set(period.start_date),
        end_date: Set(period.end_date),
        state: Set(period.state.into()),
        period_type: Set(period.period_type.into()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await?;
    Ok(())
}

//! Folding repository errors into [`AppError`].
//!
//! Not-found lookups map to `NotFound`, a second move for the same church
//! and period to `Conflict`, workflow and immutability rules to
//! `BusinessRule`, malformed input to `Validation`. Database failures and
//! contract violations are logged here before they lose their detail.

use sea_orm::DbErr;
use tmi_core::aggregation::AggregationError;
use tmi_core::fiscal::FiscalError;
use tmi_core::ledger::LedgerError;
use tmi_core::organization::OrganizationError;
use tmi_core::target::TargetError;
use tmi_shared::AppError;
use tracing::error;

use crate::repositories::{
    AggregationRepoError, CompanyError, ConfigurationError, FiscalRepoError, MoveRepoError, OrganizationRepoError,
    SequenceError,
};

fn database(err: &DbErr) -> AppError {
    error!(error = %err, "Database error");
    AppError::Database(err.to_string())
}

fn internal(message: String) -> AppError {
    error!(error = %message, "Internal error");
    AppError::Internal(message)
}

fn fiscal(err: &FiscalError) -> AppError {
    match err {
        e if e.is_not_found() => AppError::NotFound(e.to_string()),
        FiscalError::InvalidDateRange { .. }
        | FiscalError::YearOverlaps { .. }
        | FiscalError::PeriodOverlaps { .. }
        | FiscalError::PeriodOutsideYear { .. }
        | FiscalError::InvalidInterval(_) => AppError::Validation(err.to_string()),
        _ => AppError::BusinessRule(err.to_string()),
    }
}

fn organization(err: &OrganizationError) -> AppError {
    match err {
        OrganizationError::NodeNotFound(_) | OrganizationError::GroupNotFound(_) => AppError::NotFound(err.to_string()),
        OrganizationError::DuplicateGroup(_) => AppError::Conflict(err.to_string()),
        OrganizationError::NodeInUse(_) => AppError::BusinessRule(err.to_string()),
        _ => AppError::Validation(err.to_string()),
    }
}

fn target(err: &TargetError) -> AppError {
    AppError::Validation(err.to_string())
}

fn ledger(err: &LedgerError) -> AppError {
    match err {
        e if e.is_internal() => internal(e.to_string()),
        LedgerError::DuplicateMove { .. } => AppError::Conflict(err.to_string()),
        LedgerError::PeriodNotOpen(_)
        | LedgerError::PostEmptyMove(_)
        | LedgerError::InvalidTransition { .. }
        | LedgerError::ModifyPostedMove(_)
        | LedgerError::DeleteNotCanceled(_)
        | LedgerError::DeleteNumberedMove(_) => AppError::BusinessRule(err.to_string()),
        _ => AppError::Validation(err.to_string()),
    }
}

fn aggregation(err: &AggregationError) -> AppError {
    match err {
        AggregationError::PeriodNotFound(_) => AppError::NotFound(err.to_string()),
        AggregationError::ReversedWindow => AppError::Validation(err.to_string()),
        AggregationError::Organization(e) => organization(e),
        AggregationError::Target(e) => target(e),
        AggregationError::UnknownMetric(e) => internal(e.to_string()),
    }
}

impl From<CompanyError> for AppError {
    fn from(err: CompanyError) -> Self {
        match err {
            CompanyError::NotFound(_) | CompanyError::ParentNotFound(_) => Self::NotFound(err.to_string()),
            CompanyError::InvalidDigits(_) => internal(err.to_string()),
            CompanyError::Database(e) => database(&e),
        }
    }
}

impl From<SequenceError> for AppError {
    fn from(err: SequenceError) -> Self {
        match err {
            SequenceError::NotFound(_) => Self::NotFound(err.to_string()),
            SequenceError::InvalidPadding(_) => Self::Validation(err.to_string()),
            SequenceError::Database(e) => database(&e),
        }
    }
}

impl From<ConfigurationError> for AppError {
    fn from(err: ConfigurationError) -> Self {
        match err {
            ConfigurationError::Target(e) => target(&e),
            ConfigurationError::Database(e) => database(&e),
        }
    }
}

impl From<FiscalRepoError> for AppError {
    fn from(err: FiscalRepoError) -> Self {
        match err {
            FiscalRepoError::Fiscal(e) => fiscal(&e),
            FiscalRepoError::YearNotFound(_) | FiscalRepoError::PeriodNotFound(_) => Self::NotFound(err.to_string()),
            FiscalRepoError::Database(e) => database(&e),
        }
    }
}

impl From<OrganizationRepoError> for AppError {
    fn from(err: OrganizationRepoError) -> Self {
        match err {
            OrganizationRepoError::Organization(e) => organization(&e),
            OrganizationRepoError::Database(e) => database(&e),
        }
    }
}

impl From<MoveRepoError> for AppError {
    fn from(err: MoveRepoError) -> Self {
        match err {
            MoveRepoError::Ledger(e) => ledger(&e),
            MoveRepoError::Fiscal(e) => fiscal(&e),
            MoveRepoError::Organization(e) => organization(&e),
            MoveRepoError::Company(e) => e.into(),
            MoveRepoError::Sequence(e) => e.into(),
            MoveRepoError::MoveNotFound(_)
            | MoveRepoError::LineNotFound(_)
            | MoveRepoError::PeriodNotFound(_)
            | MoveRepoError::GroupNotFound(_) => Self::NotFound(err.to_string()),
            MoveRepoError::MissingSequence(_) => Self::BusinessRule(err.to_string()),
            MoveRepoError::Database(e) => database(&e),
        }
    }
}

impl From<AggregationRepoError> for AppError {
    fn from(err: AggregationRepoError) -> Self {
        match err {
            AggregationRepoError::Aggregation(e) => aggregation(&e),
            AggregationRepoError::Company(e) => e.into(),
            AggregationRepoError::Database(e) => database(&e),
        }
    }
}

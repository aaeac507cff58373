//! Guard predicates over a move and its lines.
//!
//! Each check is a pure function returning the error to raise; none of
//! them touch storage.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tmi_shared::types::Digits;

use crate::fiscal::Period;
use crate::organization::{GroupType, MetaGroup};

use super::error::LedgerError;
use super::metric::MetricValues;
use super::types::{Line, LineState, Move, MoveState};

/// The move date must fall inside its period.
pub fn check_date_in_period(mv: &Move, period: &Period) -> Result<(), LedgerError> {
    if period.contains_date(mv.date) {
        Ok(())
    } else {
        Err(LedgerError::DateOutsidePeriod {
            label: mv.label(),
            date: mv.date,
        })
    }
}

/// Moves may only be written into open periods.
pub fn check_period_open(period: &Period) -> Result<(), LedgerError> {
    if period.is_open() {
        Ok(())
    } else {
        Err(LedgerError::PeriodNotOpen(period.name.clone()))
    }
}

/// The move must belong to a church node.
pub fn check_move_group(mv: &Move, group: &MetaGroup) -> Result<(), LedgerError> {
    if group.group_type == GroupType::Church {
        Ok(())
    } else {
        Err(LedgerError::MoveGroupNotChurch {
            label: mv.label(),
            group: group.name.clone(),
        })
    }
}

/// At most one move per church and period.
///
/// `existing` are the other moves of the same company; the move itself is
/// skipped by id.
pub fn check_unique(mv: &Move, existing: &[Move], group: &MetaGroup, period: &Period) -> Result<(), LedgerError> {
    let clash = existing
        .iter()
        .any(|o| o.id != mv.id && o.group_id == mv.group_id && o.period_id == mv.period_id);
    if clash {
        Err(LedgerError::DuplicateMove {
            group: group.name.clone(),
            period: period.name.clone(),
        })
    } else {
        Ok(())
    }
}

/// Lines go to active small groups only.
pub fn check_line_group(group: &MetaGroup) -> Result<(), LedgerError> {
    if group.group_type != GroupType::SmallGroup {
        return Err(LedgerError::LineGroupNotSmallGroup(group.name.clone()));
    }
    if !group.active {
        return Err(LedgerError::InactiveGroup(group.name.clone()));
    }
    Ok(())
}

/// Posted moves (and therefore their lines) are read-only.
pub fn check_not_posted(mv: &Move) -> Result<(), LedgerError> {
    if mv.state == MoveState::Posted {
        Err(LedgerError::ModifyPostedMove(mv.label()))
    } else {
        Ok(())
    }
}

/// A move needs lines before it can be posted.
pub fn check_has_lines(mv: &Move, lines: &[Line]) -> Result<(), LedgerError> {
    if lines.is_empty() {
        Err(LedgerError::PostEmptyMove(mv.label()))
    } else {
        Ok(())
    }
}

/// Lines must add up to the declared control total, at currency precision.
pub fn check_balanced(mv: &Move, lines: &[Line], currency: Digits) -> Result<(), LedgerError> {
    let Some(control) = mv.control else {
        return Ok(());
    };
    let total: Decimal = lines.iter().map(|l| l.values.get(control.metric)).sum();
    let difference = total - control.amount;
    if control.metric.precision(currency).is_zero(difference) {
        Ok(())
    } else {
        Err(LedgerError::UnbalancedMove {
            label: mv.label(),
            difference,
        })
    }
}

/// Values may not carry more decimals than their metric allows.
pub fn check_precision(values: &MetricValues, currency: Digits) -> Result<(), LedgerError> {
    for (metric, value) in values.iter() {
        let digits = metric.precision(currency);
        if value.normalize().scale() > digits.0 {
            return Err(LedgerError::PrecisionExceeded {
                metric,
                value,
                digits: digits.0,
            });
        }
    }
    Ok(())
}

/// Deletion needs a canceled, never-posted move.
pub fn check_deletable(mv: &Move) -> Result<(), LedgerError> {
    if mv.state != MoveState::Canceled {
        return Err(LedgerError::DeleteNotCanceled(mv.label()));
    }
    if mv.post_number.is_some() {
        return Err(LedgerError::DeleteNumberedMove(mv.label()));
    }
    Ok(())
}

/// Line state implied by the state of the owning move.
///
/// Lines count once their move has left draft work behind (quoted or
/// posted); a draft or canceled move keeps its lines in draft.
#[must_use]
pub fn line_state_for(state: MoveState) -> LineState {
    match state {
        MoveState::Quotation | MoveState::Posted => LineState::Valid,
        MoveState::Draft | MoveState::Canceled => LineState::Draft,
    }
}

/// Effective date of a move: the given one, or today.
#[must_use]
pub fn default_move_date(date: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    date.unwrap_or(today)
}

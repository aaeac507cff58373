//! Ledger service: move workflow and line rules.
//!
//! The service never touches storage. Callers load the move aggregate,
//! ask the service what to do, then persist the outcome in the same
//! transaction.

use chrono::NaiveDate;
use tmi_shared::types::{Digits, LineId, MoveId};

use super::error::LedgerError;
use super::metric::MetricValues;
use super::types::{Line, LineState, Move, MoveState};
use super::validation::{
    check_balanced, check_date_in_period, check_deletable, check_has_lines, check_line_group,
    check_move_group, check_not_posted, check_period_open, check_precision, check_unique,
    line_state_for,
};
use super::workflow::{self, Guard, MoveEvent, SideEffect};
use crate::fiscal::Period;
use crate::organization::{Group, MetaGroup};

/// Outcome of a workflow event, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveAction {
    /// Event that was applied.
    pub event: MoveEvent,
    /// State before the event.
    pub from: MoveState,
    /// State after the event.
    pub to: MoveState,
    /// `number` must be drawn from the move sequence.
    pub assign_number: bool,
    /// `post_number` must be drawn from the move sequence.
    pub assign_post_number: bool,
    /// Post date to record, if the move has none yet.
    pub post_date: Option<NaiveDate>,
    /// State every line of the move ends up in.
    pub line_state: LineState,
}

impl MoveAction {
    /// True if the caller has to allocate a sequence number.
    #[must_use]
    pub fn needs_number(&self) -> bool {
        self.assign_number || self.assign_post_number
    }

    /// Writes the outcome onto `mv`.
    ///
    /// `number` is the freshly allocated sequence value, if
    /// [`needs_number`](Self::needs_number) was true.
    pub fn apply(&self, mv: &mut Move, number: Option<String>) {
        mv.state = self.to;
        if self.assign_number {
            mv.number = number;
        } else if self.assign_post_number {
            mv.post_number = number;
        }
        if let Some(date) = self.post_date {
            mv.post_date = Some(date);
        }
    }
}

/// Ledger service for move and line validation.
pub struct LedgerService;

impl LedgerService {
    /// Fires `event` on a move.
    ///
    /// Looks up the transition, runs its guards in order against the move
    /// aggregate and computes the side effects. Number assignment is
    /// idempotent: a move that already carries a number keeps it.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when the event is not allowed from the current
    /// state, otherwise the error of the first failing guard.
    pub fn apply(
        event: MoveEvent,
        mv: &Move,
        lines: &[Line],
        period: &Period,
        currency: Digits,
        today: NaiveDate,
    ) -> Result<MoveAction, LedgerError> {
        let transition = workflow::lookup(mv.state, event)?;

        for guard in transition.guards {
            match guard {
                Guard::PeriodOpen => check_period_open(period)?,
                Guard::HasLines => check_has_lines(mv, lines)?,
                Guard::Balanced => check_balanced(mv, lines, currency)?,
            }
        }

        let (assign_number, assign_post_number, post_date) = match transition.effect {
            SideEffect::None => (false, false, None),
            SideEffect::AssignNumber => (mv.number.is_none(), false, None),
            SideEffect::AssignPostNumber => (
                false,
                mv.post_number.is_none(),
                mv.post_date.is_none().then_some(today),
            ),
        };

        Ok(MoveAction {
            event,
            from: transition.from,
            to: transition.to,
            assign_number,
            assign_post_number,
            post_date,
            line_state: line_state_for(transition.to),
        })
    }

    /// Quotes a draft move, or reopens a posted one.
    ///
    /// # Errors
    ///
    /// See [`apply`](Self::apply).
    pub fn quote(
        mv: &Move,
        lines: &[Line],
        period: &Period,
        currency: Digits,
        today: NaiveDate,
    ) -> Result<MoveAction, LedgerError> {
        Self::apply(MoveEvent::Quote, mv, lines, period, currency, today)
    }

    /// Posts a quoted move.
    ///
    /// # Errors
    ///
    /// See [`apply`](Self::apply). An empty move fails with `PostEmptyMove`.
    pub fn post(
        mv: &Move,
        lines: &[Line],
        period: &Period,
        currency: Digits,
        today: NaiveDate,
    ) -> Result<MoveAction, LedgerError> {
        Self::apply(MoveEvent::Post, mv, lines, period, currency, today)
    }

    /// Cancels a draft or quoted move. No guard runs.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` for posted or already canceled moves.
    pub fn cancel(mv: &Move, lines: &[Line], period: &Period, today: NaiveDate) -> Result<MoveAction, LedgerError> {
        Self::apply(MoveEvent::Cancel, mv, lines, period, Digits::default(), today)
    }

    /// Sends a quoted or canceled move back to draft.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` from draft or posted.
    pub fn draft(mv: &Move, lines: &[Line], period: &Period, today: NaiveDate) -> Result<MoveAction, LedgerError> {
        Self::apply(MoveEvent::Draft, mv, lines, period, Digits::default(), today)
    }

    /// Validates a move header on create or write.
    ///
    /// `existing` holds the other moves of the company for the same church
    /// (the move itself may be included).
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate_move(
        mv: &Move,
        church: &MetaGroup,
        period: &Period,
        existing: &[Move],
    ) -> Result<(), LedgerError> {
        check_move_group(mv, church)?;
        check_date_in_period(mv, period)?;
        check_period_open(period)?;
        check_unique(mv, existing, church, period)
    }

    /// Header edits are refused once the move is posted.
    ///
    /// # Errors
    ///
    /// `ModifyPostedMove` for posted moves.
    pub fn validate_move_edit(mv: &Move) -> Result<(), LedgerError> {
        check_not_posted(mv)
    }

    /// Validates a line create or write against its parent move.
    ///
    /// The posted check is keyed off the parent move's current state.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate_line_write(
        mv: &Move,
        group: &MetaGroup,
        values: &MetricValues,
        currency: Digits,
    ) -> Result<(), LedgerError> {
        check_not_posted(mv)?;
        check_line_group(group)?;
        check_precision(values, currency)
    }

    /// Validates a line delete against its parent move.
    ///
    /// # Errors
    ///
    /// `ModifyPostedMove` for posted moves.
    pub fn validate_line_delete(mv: &Move) -> Result<(), LedgerError> {
        check_not_posted(mv)
    }

    /// Auto-cancels a move and checks that it may then be deleted.
    ///
    /// Returns the cancel action to persist before the delete, or `None`
    /// if the move was already canceled.
    ///
    /// # Errors
    ///
    /// `ModifyPostedMove` for posted moves, `DeleteNumberedMove` for moves
    /// that were posted once.
    pub fn prepare_delete(
        mv: &Move,
        lines: &[Line],
        period: &Period,
        today: NaiveDate,
    ) -> Result<Option<MoveAction>, LedgerError> {
        check_not_posted(mv)?;
        let cancel = if mv.state == MoveState::Canceled {
            None
        } else {
            Some(Self::cancel(mv, lines, period, today)?)
        };
        let mut canceled = mv.clone();
        canceled.state = MoveState::Canceled;
        check_deletable(&canceled)?;
        Ok(cancel)
    }

    /// Brings every line of `mv` to the state implied by the move.
    ///
    /// Returns the ids of the lines that changed so the caller can issue a
    /// single batched update.
    pub fn recompute_line_states(mv: &Move, lines: &mut [Line]) -> Vec<LineId> {
        let target = line_state_for(mv.state);
        lines
            .iter_mut()
            .filter(|l| l.move_id == mv.id && l.state != target)
            .map(|l| {
                l.state = target;
                l.id
            })
            .collect()
    }

    /// Zero-valued lines for every given small group, in order.
    #[must_use]
    pub fn prefill_lines(mv: &Move, groups: &[Group]) -> Vec<Line> {
        groups
            .iter()
            .map(|g| Line {
                id: LineId::generate(),
                move_id: mv.id,
                group_id: g.id,
                state: line_state_for(mv.state),
                values: MetricValues::zero(),
            })
            .collect()
    }

    /// Duplicates a move and its lines into `period` as a fresh draft.
    ///
    /// Numbers and post date are cleared; the control total is kept.
    #[must_use]
    pub fn copy_move(source: &Move, lines: &[Line], period: &Period, date: NaiveDate) -> (Move, Vec<Line>) {
        let id = MoveId::generate();
        let copy = Move {
            id,
            company_id: source.company_id,
            number: None,
            post_number: None,
            date,
            post_date: None,
            description: source.description.clone(),
            state: MoveState::Draft,
            group_id: source.group_id,
            period_id: period.id,
            control: source.control,
        };
        let lines = lines
            .iter()
            .map(|l| Line {
                id: LineId::generate(),
                move_id: id,
                group_id: l.group_id,
                state: LineState::Draft,
                values: l.values,
            })
            .collect();
        (copy, lines)
    }
}

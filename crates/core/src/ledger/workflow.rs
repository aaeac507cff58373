//! Move state machine.
//!
//! The whole workflow is the [`TRANSITIONS`] table: for each state and
//! event it names the resulting state, the guards that must hold, and the
//! side effect the caller performs when the transition is applied.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::LedgerError;
use super::types::MoveState;

/// User-triggered workflow event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveEvent {
    /// Number the move and make it count.
    Quote,
    /// Finalize the move.
    Post,
    /// Discard the move.
    Cancel,
    /// Back to editing.
    Draft,
}

impl MoveEvent {
    /// State every successful occurrence of the event leads to.
    #[must_use]
    pub fn target(self) -> MoveState {
        match self {
            Self::Quote => MoveState::Quotation,
            Self::Post => MoveState::Posted,
            Self::Cancel => MoveState::Canceled,
            Self::Draft => MoveState::Draft,
        }
    }
}

impl fmt::Display for MoveEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Quote => "quote",
            Self::Post => "post",
            Self::Cancel => "cancel",
            Self::Draft => "draft",
        })
    }
}

/// Predicate that must hold before a transition applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// The move's period is open.
    PeriodOpen,
    /// The move has at least one line.
    HasLines,
    /// The lines match the declared control total, if any.
    Balanced,
}

/// Work the caller performs when a transition applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Nothing beyond the state write.
    None,
    /// Assign `number` from the company sequence unless already set.
    AssignNumber,
    /// Assign `post_number` and `post_date` unless already set.
    AssignPostNumber,
}

/// One row of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Source state.
    pub from: MoveState,
    /// Triggering event.
    pub event: MoveEvent,
    /// Resulting state.
    pub to: MoveState,
    /// Guards, checked in order.
    pub guards: &'static [Guard],
    /// Side effect.
    pub effect: SideEffect,
}

/// The move workflow.
pub const TRANSITIONS: &[Transition] = &[
    Transition {
        from: MoveState::Draft,
        event: MoveEvent::Quote,
        to: MoveState::Quotation,
        guards: &[Guard::PeriodOpen, Guard::Balanced],
        effect: SideEffect::AssignNumber,
    },
    Transition {
        from: MoveState::Draft,
        event: MoveEvent::Cancel,
        to: MoveState::Canceled,
        guards: &[],
        effect: SideEffect::None,
    },
    Transition {
        from: MoveState::Quotation,
        event: MoveEvent::Post,
        to: MoveState::Posted,
        guards: &[Guard::PeriodOpen, Guard::HasLines, Guard::Balanced],
        effect: SideEffect::AssignPostNumber,
    },
    Transition {
        from: MoveState::Quotation,
        event: MoveEvent::Draft,
        to: MoveState::Draft,
        guards: &[],
        effect: SideEffect::None,
    },
    Transition {
        from: MoveState::Quotation,
        event: MoveEvent::Cancel,
        to: MoveState::Canceled,
        guards: &[],
        effect: SideEffect::None,
    },
    Transition {
        from: MoveState::Posted,
        event: MoveEvent::Quote,
        to: MoveState::Quotation,
        guards: &[],
        effect: SideEffect::AssignNumber,
    },
    Transition {
        from: MoveState::Canceled,
        event: MoveEvent::Draft,
        to: MoveState::Draft,
        guards: &[],
        effect: SideEffect::None,
    },
];

/// Finds the row for `event` fired from `from`.
pub fn lookup(from: MoveState, event: MoveEvent) -> Result<&'static Transition, LedgerError> {
    TRANSITIONS
        .iter()
        .find(|t| t.from == from && t.event == event)
        .ok_or(LedgerError::InvalidTransition {
            from,
            to: event.target(),
        })
}

/// Returns true if `from → to` is reachable with a single event.
#[must_use]
pub fn is_valid_transition(from: MoveState, to: MoveState) -> bool {
    TRANSITIONS.iter().any(|t| t.from == from && t.to == to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(MoveState::Draft, MoveState::Quotation, true)]
    #[case(MoveState::Draft, MoveState::Canceled, true)]
    #[case(MoveState::Quotation, MoveState::Posted, true)]
    #[case(MoveState::Quotation, MoveState::Draft, true)]
    #[case(MoveState::Quotation, MoveState::Canceled, true)]
    #[case(MoveState::Posted, MoveState::Quotation, true)]
    #[case(MoveState::Canceled, MoveState::Draft, true)]
    #[case(MoveState::Posted, MoveState::Draft, false)]
    #[case(MoveState::Posted, MoveState::Canceled, false)]
    #[case(MoveState::Draft, MoveState::Posted, false)]
    #[case(MoveState::Canceled, MoveState::Posted, false)]
    fn test_transition_table(#[case] from: MoveState, #[case] to: MoveState, #[case] valid: bool) {
        assert_eq!(is_valid_transition(from, to), valid);
    }

    #[test]
    fn test_lookup_reports_target_on_failure() {
        assert_eq!(
            lookup(MoveState::Posted, MoveEvent::Cancel).unwrap_err(),
            LedgerError::InvalidTransition {
                from: MoveState::Posted,
                to: MoveState::Canceled,
            }
        );
    }

    #[test]
    fn test_every_row_reaches_event_target() {
        for t in TRANSITIONS {
            assert_eq!(t.to, t.event.target());
        }
    }

    #[test]
    fn test_post_is_fully_guarded() {
        let post = lookup(MoveState::Quotation, MoveEvent::Post).unwrap();
        assert_eq!(post.guards, &[Guard::PeriodOpen, Guard::HasLines, Guard::Balanced]);
        assert_eq!(post.effect, SideEffect::AssignPostNumber);
    }
}

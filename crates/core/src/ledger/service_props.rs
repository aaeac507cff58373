//! Property-based tests for the move workflow.
//!
//! - Round-trip draft → quotation → posted → quotation → draft is legal
//! - Posted never goes straight back to draft or to canceled
//! - Line state always follows the move state
//! - Balanced moves always pass the balance guard

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tmi_shared::types::{CompanyId, Digits, GroupId, LineId, MetaGroupId, MoveId, PeriodId, YearId};

use super::metric::{Metric, MetricValues};
use super::service::LedgerService;
use super::types::{ControlTotal, Line, LineState, Move, MoveState};
use super::validation::line_state_for;
use super::workflow::{MoveEvent, is_valid_transition};
use crate::fiscal::{Period, PeriodState, PeriodType};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn open_period() -> Period {
    Period {
        id: PeriodId::generate(),
        year_id: YearId::generate(),
        name: "2024-03".into(),
        start_date: d(2024, 3, 1),
        end_date: d(2024, 3, 31),
        state: PeriodState::Open,
        period_type: PeriodType::Standard,
    }
}

fn make_move(period: &Period) -> Move {
    Move {
        id: MoveId::generate(),
        company_id: CompanyId::generate(),
        number: None,
        post_number: None,
        date: d(2024, 3, 10),
        post_date: None,
        description: None,
        state: MoveState::Draft,
        group_id: MetaGroupId::generate(),
        period_id: period.id,
        control: None,
    }
}

fn make_lines(mv: &Move, amounts: &[Decimal]) -> Vec<Line> {
    amounts
        .iter()
        .map(|a| Line {
            id: LineId::generate(),
            move_id: mv.id,
            group_id: GroupId::generate(),
            state: LineState::Draft,
            values: MetricValues::zero().with(Metric::Tithe, *a),
        })
        .collect()
}

fn state_strategy() -> impl Strategy<Value = MoveState> {
    prop_oneof![
        Just(MoveState::Draft),
        Just(MoveState::Quotation),
        Just(MoveState::Posted),
        Just(MoveState::Canceled),
    ]
}

fn event_strategy() -> impl Strategy<Value = MoveEvent> {
    prop_oneof![
        Just(MoveEvent::Quote),
        Just(MoveEvent::Post),
        Just(MoveEvent::Cancel),
        Just(MoveEvent::Draft),
    ]
}

/// Cent amounts 0.00 to 5,000.00.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..500_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The full round trip succeeds for any non-empty balanced move, and
    /// numbers are drawn exactly twice (one quote number, one post number).
    #[test]
    fn prop_round_trip_is_legal(amounts in prop::collection::vec(amount(), 1..8)) {
        let period = open_period();
        let mut mv = make_move(&period);
        let lines = make_lines(&mv, &amounts);
        mv.control = Some(ControlTotal {
            metric: Metric::Tithe,
            amount: amounts.iter().copied().sum(),
        });
        let today = d(2024, 4, 2);
        let mut drawn = 0u32;

        for event in [MoveEvent::Quote, MoveEvent::Post, MoveEvent::Quote, MoveEvent::Draft] {
            let action = LedgerService::apply(event, &mv, &lines, &period, Digits::CENTS, today)
                .expect("round trip step must be legal");
            let number = action.needs_number().then(|| {
                drawn += 1;
                format!("MV{drawn:06}")
            });
            action.apply(&mut mv, number);
        }

        prop_assert_eq!(mv.state, MoveState::Draft);
        prop_assert_eq!(drawn, 2);
        prop_assert_eq!(mv.number.as_deref(), Some("MV000001"));
        prop_assert_eq!(mv.post_number.as_deref(), Some("MV000002"));
        prop_assert_eq!(mv.post_date, Some(today));
    }

    /// Every event either fails or lands on its target state, and the
    /// resulting line state is the one implied by the new move state.
    #[test]
    fn prop_events_land_on_target(state in state_strategy(), event in event_strategy()) {
        let period = open_period();
        let mut mv = make_move(&period);
        mv.state = state;
        let lines = make_lines(&mv, &[Decimal::ONE]);

        match LedgerService::apply(event, &mv, &lines, &period, Digits::CENTS, d(2024, 3, 31)) {
            Ok(action) => {
                prop_assert_eq!(action.to, event.target());
                prop_assert!(is_valid_transition(state, action.to));
                prop_assert_eq!(action.line_state, line_state_for(action.to));
            }
            Err(err) => prop_assert_eq!(err.error_code(), "INVALID_TRANSITION"),
        }
    }

    /// Posted moves can only be reopened.
    #[test]
    fn prop_posted_only_reopens(event in event_strategy()) {
        let period = open_period();
        let mut mv = make_move(&period);
        mv.state = MoveState::Posted;
        let result = LedgerService::apply(event, &mv, &[], &period, Digits::CENTS, d(2024, 3, 31));
        prop_assert_eq!(result.is_ok(), event == MoveEvent::Quote);
    }

    /// An unbalanced control total always blocks the quote.
    #[test]
    fn prop_unbalanced_blocks_quote(
        amounts in prop::collection::vec(amount(), 1..8),
        off_by in 1i64..10_000i64,
    ) {
        let period = open_period();
        let mut mv = make_move(&period);
        let lines = make_lines(&mv, &amounts);
        let total: Decimal = amounts.iter().copied().sum();
        mv.control = Some(ControlTotal {
            metric: Metric::Tithe,
            amount: total + Decimal::new(off_by, 2),
        });
        let err = LedgerService::quote(&mv, &lines, &period, Digits::CENTS, d(2024, 3, 31)).unwrap_err();
        prop_assert_eq!(err.error_code(), "UNBALANCED_MOVE");
    }

    /// After any sequence of events, recomputation leaves every line in
    /// the state implied by the move.
    #[test]
    fn prop_line_states_follow_move(events in prop::collection::vec(event_strategy(), 0..10)) {
        let period = open_period();
        let mut mv = make_move(&period);
        let mut lines = make_lines(&mv, &[Decimal::ONE, Decimal::TWO]);

        for event in events {
            if let Ok(action) = LedgerService::apply(event, &mv, &lines, &period, Digits::CENTS, d(2024, 3, 31)) {
                action.apply(&mut mv, Some("MV000001".into()));
                LedgerService::recompute_line_states(&mv, &mut lines);
            }
            let expected = line_state_for(mv.state);
            prop_assert!(lines.iter().all(|l| l.state == expected));
        }
    }
}

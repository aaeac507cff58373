//! Integration tests for moves, lines and their roll-up.
//!
//! Covers the full path from calendar setup to a posted move showing up in
//! the district balance, the move workflow with its derived line states,
//! and rollback of a batch transition that fails halfway.

#![allow(clippy::items_after_statements)]

mod common;

use rust_decimal_macros::dec;
use tmi_core::aggregation::{DateWindow, RequestContext};
use tmi_core::ledger::{ControlTotal, LedgerError, LineState, Metric, MetricValues, MoveState};
use tmi_db::repositories::{CreateMoveInput, LineTarget, MoveRepoError};
use tmi_shared::types::GroupId;

use common::{Repos, connect, date, district_fixture};

fn baptisms(n: rust_decimal::Decimal) -> MetricValues {
    MetricValues::zero().with(Metric::Baptism, n)
}

#[tokio::test]
async fn test_posted_move_rolls_up_to_district() {
    let repos = Repos::new(connect().await, date(2024, 1, 20));
    let company_id = repos.company().await;

    let (_, periods) = repos.year_with_months(company_id, 2024).await;
    let names: Vec<_> = periods.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names.len(), 12);
    assert_eq!(names.first(), Some(&"2024-01"));
    assert_eq!(names.last(), Some(&"2024-12"));
    let january = &periods[0];

    let fx = district_fixture(&repos, company_id).await;

    let mut input = CreateMoveInput::new(company_id, fx.church.id);
    input.period_id = Some(january.id);
    input.date = Some(date(2024, 1, 15));
    let created = repos.moves.create(input).await.expect("Failed to create move");
    let move_id = created.mv.id;

    repos
        .moves
        .add_line(move_id, fx.groups[0].id, baptisms(dec!(3)))
        .await
        .expect("Failed to add line");
    repos
        .moves
        .add_line(move_id, fx.groups[1].id, baptisms(dec!(5)))
        .await
        .expect("Failed to add line");

    repos.moves.quote(&[move_id]).await.expect("Failed to quote");
    let posted = repos.moves.post(&[move_id]).await.expect("Failed to post");
    assert_eq!(posted[0].state, MoveState::Posted);
    assert_eq!(posted[0].post_date, Some(date(2024, 1, 20)));

    let ctx = RequestContext::new(company_id).with_window(DateWindow::periods([january.id]));
    let balance = repos
        .aggregation
        .get_balance(&ctx, &[fx.district.id], &["baptism"])
        .await
        .expect("Failed to aggregate");
    assert_eq!(balance[&Metric::Baptism][&fx.district.id], dec!(8));

    // A window without January sees nothing.
    let ctx = RequestContext::new(company_id).with_window(DateWindow::periods([periods[1].id]));
    let balance = repos
        .aggregation
        .get_balance(&ctx, &[fx.district.id], &["baptism"])
        .await
        .expect("Failed to aggregate");
    assert_eq!(balance[&Metric::Baptism][&fx.district.id], dec!(0));
}

#[tokio::test]
async fn test_workflow_numbers_and_line_states() {
    let repos = Repos::new(connect().await, date(2024, 3, 10));
    let company_id = repos.company().await;
    let (_, periods) = repos.year_with_months(company_id, 2024).await;
    let fx = district_fixture(&repos, company_id).await;

    let mut input = CreateMoveInput::new(company_id, fx.church.id);
    input.prefill = true;
    let created = repos.moves.create(input).await.expect("Failed to create move");
    assert_eq!(created.mv.period_id, periods[2].id, "period defaults from today");
    assert_eq!(created.lines.len(), 2, "one zero line per active small group");
    assert!(created.lines.iter().all(|l| l.state == LineState::Draft));
    let id = created.mv.id;

    let quoted = repos.moves.quote(&[id]).await.expect("Failed to quote");
    assert_eq!(quoted[0].number.as_deref(), Some("MV000001"));

    let posted = repos.moves.post(&[id]).await.expect("Failed to post");
    assert_eq!(posted[0].post_number.as_deref(), Some("MV000002"));

    let stored = repos.moves.get(id).await.unwrap().unwrap();
    assert!(stored.lines.iter().all(|l| l.state == LineState::Valid));

    // Posted moves are read-only.
    let err = repos
        .moves
        .add_line(id, fx.groups[0].id, baptisms(dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, MoveRepoError::Ledger(LedgerError::ModifyPostedMove(_))));

    // Back to quotation and draft keeps the numbers.
    repos.moves.quote(&[id]).await.expect("Failed to reopen");
    let drafted = repos.moves.draft(&[id]).await.expect("Failed to draft");
    assert_eq!(drafted[0].number.as_deref(), Some("MV000001"));
    assert_eq!(drafted[0].post_number.as_deref(), Some("MV000002"));

    let stored = repos.moves.get(id).await.unwrap().unwrap();
    assert!(stored.lines.iter().all(|l| l.state == LineState::Draft));

    // Once posted, a move can never be deleted.
    let err = repos.moves.delete(&[id]).await.unwrap_err();
    assert!(matches!(err, MoveRepoError::Ledger(LedgerError::DeleteNumberedMove(_))));
    assert!(repos.moves.get(id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_one_move_per_church_and_period() {
    let repos = Repos::new(connect().await, date(2024, 5, 2));
    let company_id = repos.company().await;
    repos.year_with_months(company_id, 2024).await;
    let fx = district_fixture(&repos, company_id).await;

    repos
        .moves
        .create(CreateMoveInput::new(company_id, fx.church.id))
        .await
        .expect("Failed to create move");
    let err = repos
        .moves
        .create(CreateMoveInput::new(company_id, fx.church.id))
        .await
        .unwrap_err();
    assert!(matches!(err, MoveRepoError::Ledger(LedgerError::DuplicateMove { .. })));
}

#[tokio::test]
async fn test_draft_move_is_deleted_with_its_lines() {
    let repos = Repos::new(connect().await, date(2024, 6, 5));
    let company_id = repos.company().await;
    repos.year_with_months(company_id, 2024).await;
    let fx = district_fixture(&repos, company_id).await;

    let mut input = CreateMoveInput::new(company_id, fx.church.id);
    input.prefill = true;
    let created = repos.moves.create(input).await.expect("Failed to create move");

    repos.moves.delete(&[created.mv.id]).await.expect("Failed to delete");
    assert!(repos.moves.get(created.mv.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_batch_quote_rolls_back() {
    let repos = Repos::new(connect().await, date(2024, 4, 8));
    let company_id = repos.company().await;
    let (_, periods) = repos.year_with_months(company_id, 2024).await;
    let fx = district_fixture(&repos, company_id).await;

    let mut first = CreateMoveInput::new(company_id, fx.church.id);
    first.period_id = Some(periods[2].id);
    first.date = Some(date(2024, 3, 31));
    let first = repos.moves.create(first).await.expect("Failed to create move").mv;

    // Declares 10 baptisms but records 4.
    let mut second = CreateMoveInput::new(company_id, fx.church.id);
    second.control = Some(ControlTotal {
        metric: Metric::Baptism,
        amount: dec!(10),
    });
    let second = repos.moves.create(second).await.expect("Failed to create move").mv;
    repos
        .moves
        .add_line(second.id, fx.groups[0].id, baptisms(dec!(4)))
        .await
        .expect("Failed to add line");

    let err = repos.moves.quote(&[first.id, second.id]).await.unwrap_err();
    assert!(matches!(err, MoveRepoError::Ledger(LedgerError::UnbalancedMove { .. })));

    // The first move was numbered inside the aborted transaction.
    let first = repos.moves.get(first.id).await.unwrap().unwrap().mv;
    assert_eq!(first.state, MoveState::Draft);
    assert_eq!(first.number, None);

    // Nothing was drawn from the sequence either.
    let quoted = repos.moves.quote(&[first.id]).await.expect("Failed to quote");
    assert_eq!(quoted[0].number.as_deref(), Some("MV000001"));
}

#[tokio::test]
async fn test_copy_into_next_period() {
    let repos = Repos::new(connect().await, date(2024, 2, 1));
    let company_id = repos.company().await;
    let (_, periods) = repos.year_with_months(company_id, 2024).await;
    let fx = district_fixture(&repos, company_id).await;

    let mut input = CreateMoveInput::new(company_id, fx.church.id);
    input.period_id = Some(periods[0].id);
    input.date = Some(date(2024, 1, 31));
    let source = repos.moves.create(input).await.expect("Failed to create move").mv;
    repos
        .moves
        .add_line(source.id, fx.groups[1].id, baptisms(dec!(2)))
        .await
        .expect("Failed to add line");
    repos.moves.quote(&[source.id]).await.expect("Failed to quote");

    let copy = repos
        .moves
        .copy(source.id, periods[1].id, None)
        .await
        .expect("Failed to copy");
    assert_eq!(copy.mv.state, MoveState::Draft);
    assert_eq!(copy.mv.period_id, periods[1].id);
    assert_eq!(copy.mv.date, periods[1].start_date);
    assert_eq!(copy.mv.number, None);
    assert_eq!(copy.lines.len(), 1);
    assert_eq!(copy.lines[0].values.get(Metric::Baptism), dec!(2));
    assert_eq!(copy.lines[0].state, LineState::Draft);
}

#[tokio::test]
async fn test_lines_without_move_get_a_bare_move() {
    let repos = Repos::new(connect().await, date(2024, 3, 10));
    let company_id = repos.company().await;
    let (_, periods) = repos.year_with_months(company_id, 2024).await;
    let fx = district_fixture(&repos, company_id).await;

    let target = LineTarget::NewMove {
        company_id,
        church: fx.church.id,
        date: Some(date(2024, 4, 5)),
    };
    let created = repos
        .moves
        .add_lines(target, &[(fx.groups[0].id, baptisms(dec!(2)))])
        .await
        .expect("Failed to add lines");
    assert_eq!(created.mv.state, MoveState::Draft);
    assert_eq!(created.mv.date, date(2024, 4, 5));
    assert_eq!(created.mv.period_id, periods[3].id);
    assert_eq!(created.mv.group_id, fx.church.id);
    assert_eq!(created.lines.len(), 1);
    assert_eq!(created.lines[0].state, LineState::Draft);

    let extended = repos
        .moves
        .add_lines(LineTarget::Move(created.mv.id), &[(fx.groups[1].id, baptisms(dec!(1)))])
        .await
        .expect("Failed to add lines");
    assert_eq!(extended.mv.id, created.mv.id);
    assert_eq!(extended.lines.len(), 2);
    assert_eq!(repos.moves.list(company_id, Some(periods[3].id)).await.unwrap().len(), 1);

    // A bad line takes the freshly created move down with it.
    let target = LineTarget::NewMove {
        company_id,
        church: fx.church.id,
        date: Some(date(2024, 5, 2)),
    };
    let err = repos
        .moves
        .add_lines(
            target,
            &[(fx.groups[0].id, baptisms(dec!(1))), (GroupId::generate(), baptisms(dec!(1)))],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MoveRepoError::GroupNotFound(_)));
    assert!(repos.moves.list(company_id, Some(periods[4].id)).await.unwrap().is_empty());
}

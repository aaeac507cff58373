//! Integration tests for target comparison and hierarchy reports.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tmi_core::aggregation::{AggregationError, DateWindow, RequestContext};
use tmi_core::ledger::{Metric, MetricValues};
use tmi_core::organization::GroupType;
use tmi_db::repositories::{AggregationRepoError, CreateMoveInput};
use tmi_shared::types::{CompanyId, MetaGroupId, MoveId};

use common::{Fixture, Repos, connect, date, district_fixture};

/// Quotes one March move: Hope baptizes 5, Faith baptizes 1 and tithes 120.50.
async fn march_activity(repos: &Repos, company_id: CompanyId, fx: &Fixture) -> MoveId {
    let mut input = CreateMoveInput::new(company_id, fx.church.id);
    input.date = Some(date(2024, 3, 15));
    let mv = repos.moves.create(input).await.expect("Failed to create move").mv;
    let entries = [
        (0, MetricValues::zero().with(Metric::Baptism, dec!(5))),
        (
            1,
            MetricValues::zero()
                .with(Metric::Baptism, dec!(1))
                .with(Metric::Tithe, dec!(120.50)),
        ),
    ];
    for (i, values) in entries {
        repos
            .moves
            .add_line(mv.id, fx.groups[i].id, values)
            .await
            .expect("Failed to add line");
    }
    repos.moves.quote(&[mv.id]).await.expect("Failed to quote");
    mv.id
}

#[tokio::test]
async fn test_targets_scale_with_small_groups() {
    let repos = Repos::new(connect().await, date(2024, 3, 20));
    let company_id = repos.company().await;
    let (_, periods) = repos.year_with_months(company_id, 2024).await;
    let fx = district_fixture(&repos, company_id).await;
    march_activity(&repos, company_id, &fx).await;
    repos
        .configuration
        .set_target(company_id, Metric::Baptism, dec!(2))
        .await
        .expect("Failed to set target");

    let ctx = RequestContext::new(company_id).with_window(DateWindow::periods([periods[2].id]));
    let ids = [fx.district.id, fx.church.id, fx.small_groups[0].id];

    let target = repos.aggregation.get_target(&ctx, &ids, &["baptism"]).await.unwrap();
    assert_eq!(target[&Metric::Baptism][&fx.district.id], dec!(4));
    assert_eq!(target[&Metric::Baptism][&fx.small_groups[0].id], dec!(2));

    let difference = repos.aggregation.get_difference(&ctx, &ids, &["baptism"]).await.unwrap();
    assert_eq!(difference[&Metric::Baptism][&fx.church.id], dec!(-2));
    assert_eq!(difference[&Metric::Baptism][&fx.small_groups[0].id], dec!(-3));

    let percentage = repos.aggregation.get_percentage(&ctx, &ids, &["baptism"]).await.unwrap();
    assert_eq!(percentage[&Metric::Baptism][&fx.district.id], dec!(1.50));

    // Two elapsed months double the target.
    let ctx = RequestContext::new(company_id).with_window(DateWindow::dates(date(2024, 3, 1), date(2024, 5, 31)));
    let target = repos.aggregation.get_target(&ctx, &ids, &["baptism"]).await.unwrap();
    assert_eq!(target[&Metric::Baptism][&fx.district.id], dec!(8));
}

#[tokio::test]
async fn test_posted_only_and_draft_lines() {
    let repos = Repos::new(connect().await, date(2024, 3, 20));
    let company_id = repos.company().await;
    repos.year_with_months(company_id, 2024).await;
    let fx = district_fixture(&repos, company_id).await;
    march_activity(&repos, company_id, &fx).await;

    let window = DateWindow::dates(date(2024, 1, 1), date(2024, 12, 31));
    let all = RequestContext::new(company_id).with_window(window.clone());
    let balance = repos
        .aggregation
        .get_balance(&all, &[fx.church.id], &["baptism", "tithe"])
        .await
        .unwrap();
    assert_eq!(balance[&Metric::Baptism][&fx.church.id], dec!(6));
    assert_eq!(balance[&Metric::Tithe][&fx.church.id], dec!(120.50));

    // The move is only quoted.
    let posted = RequestContext::new(company_id).with_window(window).posted(true);
    let balance = repos.aggregation.get_balance(&posted, &[fx.church.id], &["baptism"]).await.unwrap();
    assert_eq!(balance[&Metric::Baptism][&fx.church.id], Decimal::ZERO);

    let groups = repos
        .aggregation
        .get_group_balance(&all, &[fx.groups[0].id, fx.groups[1].id], &["baptism"])
        .await
        .unwrap();
    assert_eq!(groups[&Metric::Baptism][&fx.groups[0].id], dec!(5));
    assert_eq!(groups[&Metric::Baptism][&fx.groups[1].id], dec!(1));
}

#[tokio::test]
async fn test_reports_order_by_metric() {
    let repos = Repos::new(connect().await, date(2024, 3, 20));
    let company_id = repos.company().await;
    repos.year_with_months(company_id, 2024).await;
    let fx = district_fixture(&repos, company_id).await;
    let move_id = march_activity(&repos, company_id, &fx).await;
    repos.moves.post(&[move_id]).await.expect("Failed to post");

    // Current year, posted moves only.
    let ctx = repos.aggregation.report_context(company_id).await.unwrap();

    let ordered = repos
        .aggregation
        .ordered_descendants(&ctx, fx.district.id, Metric::Tithe)
        .await
        .unwrap();
    assert_eq!(ordered, vec![fx.church.id, fx.small_groups[1].id, fx.small_groups[0].id]);

    let sections = repos
        .aggregation
        .children_report(&ctx, GroupType::Church, Some(fx.church.id), Metric::Baptism)
        .await
        .unwrap();
    assert_eq!(sections.len(), 1);
    let rows: Vec<_> = sections[0].rows.iter().map(|r| r.meta_id).collect();
    assert_eq!(rows, vec![fx.small_groups[0].id, fx.small_groups[1].id]);

    let stats = repos.aggregation.statistics(&ctx, fx.district.id).await.unwrap();
    let baptism = stats.get(Metric::Baptism).unwrap();
    assert_eq!(baptism.actual, dec!(6));
    assert_eq!(stats.child_value, 2);
}

#[tokio::test]
async fn test_unknown_metric_and_node() {
    let repos = Repos::new(connect().await, date(2024, 3, 20));
    let company_id = repos.company().await;
    repos.year_with_months(company_id, 2024).await;
    let fx = district_fixture(&repos, company_id).await;
    let ctx = RequestContext::new(company_id);

    let err = repos
        .aggregation
        .get_balance(&ctx, &[fx.district.id], &["weight"])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AggregationRepoError::Aggregation(AggregationError::UnknownMetric(_))
    ));

    let stranger = MetaGroupId::generate();
    let err = repos.aggregation.statistics(&ctx, stranger).await.unwrap_err();
    assert!(matches!(
        err,
        AggregationRepoError::Aggregation(AggregationError::Organization(_))
    ));
}

#[tokio::test]
async fn test_balance_never_sees_half_a_post() {
    let repos = Repos::new(connect().await, date(2024, 3, 20));
    let company_id = repos.company().await;
    repos.year_with_months(company_id, 2024).await;
    let fx = district_fixture(&repos, company_id).await;
    let move_id = march_activity(&repos, company_id, &fx).await;

    let ctx = RequestContext::new(company_id).posted(true);
    let ids = [fx.district.id];
    let read = || repos.aggregation.get_balance(&ctx, &ids, &["baptism"]);
    let move_ids = [move_id];
    let (posted, first, second, third) = futures::join!(repos.moves.post(&move_ids), read(), read(), read());
    posted.expect("Failed to post");

    for balance in [first, second, third] {
        let seen = balance.unwrap()[&Metric::Baptism][&fx.district.id];
        assert!(seen == dec!(0) || seen == dec!(6), "partial balance {seen}");
    }
    let after = read().await.unwrap();
    assert_eq!(after[&Metric::Baptism][&fx.district.id], dec!(6));
}

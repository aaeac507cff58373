//! Property-based tests for the aggregation engine.
//!
//! - Additivity: a parent's balance equals the sum of its children's
//! - Batching: asking for overlapping nodes in one batch changes nothing
//! - child_value equals the number of small group leaves

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tmi_shared::types::{CompanyId, Digits, GroupId, LineId, MetaGroupId, MoveId, PeriodId, YearId};

use super::context::{DateWindow, LineFact, RequestContext, Scope};
use super::engine::AggregationEngine;
use crate::fiscal::{FiscalService, Period, PeriodState, PeriodType, Year, YearState};
use crate::ledger::{LineState, Metric, MetricValues, MoveState};
use crate::organization::{Group, GroupType, MetaGroup, OrganizationTree};
use crate::target::TargetConfiguration;

fn company() -> CompanyId {
    CompanyId::from(uuid::Uuid::nil())
}

fn node(name: String, group_type: GroupType, parent: Option<MetaGroupId>) -> MetaGroup {
    MetaGroup {
        id: MetaGroupId::generate(),
        company_id: company(),
        name,
        code: None,
        active: true,
        group_type,
        parent_id: parent,
        sequence: 0,
    }
}

/// Zone → districts → churches → small groups with the given fan-outs.
fn build(shape: &[Vec<usize>]) -> (OrganizationTree, MetaGroupId, Vec<MetaGroupId>, Vec<(MetaGroupId, GroupId)>) {
    let zone = node("Zone".into(), GroupType::Zone, None);
    let mut metas = vec![zone.clone()];
    let mut groups = Vec::new();
    let mut districts = Vec::new();
    let mut leaves = Vec::new();
    for (i, churches) in shape.iter().enumerate() {
        let district = node(format!("D{i}"), GroupType::District, Some(zone.id));
        districts.push(district.id);
        for (j, &sgs) in churches.iter().enumerate() {
            let church = node(format!("D{i}C{j}"), GroupType::Church, Some(district.id));
            for k in 0..sgs {
                let sg = node(format!("D{i}C{j}S{k}"), GroupType::SmallGroup, Some(church.id));
                let group = Group {
                    id: GroupId::generate(),
                    meta_id: sg.id,
                };
                leaves.push((sg.id, group.id));
                groups.push(group);
                metas.push(sg);
            }
            metas.push(church);
        }
        metas.push(district);
    }
    (OrganizationTree::build(metas, groups).unwrap(), zone.id, districts, leaves)
}

fn year_with_months() -> (Year, Vec<Period>) {
    let year = Year {
        id: YearId::generate(),
        company_id: company(),
        name: "2024".into(),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        state: YearState::Open,
    };
    let periods = FiscalService::plan_periods(&year, 1)
        .unwrap()
        .into_iter()
        .map(|plan| Period {
            id: PeriodId::generate(),
            year_id: year.id,
            name: plan.name,
            start_date: plan.start_date,
            end_date: plan.end_date,
            state: PeriodState::Open,
            period_type: PeriodType::Standard,
        })
        .collect();
    (year, periods)
}

fn shape_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(1usize..4, 1..4), 1..4)
}

/// (leaf selector, month, baptisms, tithe cents)
fn line_strategy() -> impl Strategy<Value = Vec<(usize, usize, i64, i64)>> {
    prop::collection::vec((0usize..64, 0usize..12, 0i64..50, 0i64..100_000), 0..40)
}

fn facts_for(
    lines: &[(usize, usize, i64, i64)],
    leaves: &[(MetaGroupId, GroupId)],
    year: &Year,
    periods: &[Period],
) -> Vec<LineFact> {
    lines
        .iter()
        .map(|&(leaf, month, baptism, cents)| {
            let (meta_id, group_id) = leaves[leaf % leaves.len()];
            let period = &periods[month];
            LineFact {
                line_id: LineId::generate(),
                group_id,
                meta_id,
                move_id: MoveId::generate(),
                period_id: period.id,
                year_id: year.id,
                move_date: period.start_date,
                move_state: MoveState::Posted,
                line_state: LineState::Valid,
                values: MetricValues::zero()
                    .with(Metric::Baptism, Decimal::from(baptism))
                    .with(Metric::Tithe, Decimal::new(cents, 2)),
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_parent_is_sum_of_children(
        shape in shape_strategy(),
        lines in line_strategy(),
        first in 0usize..12,
        len in 1usize..12,
    ) {
        let (tree, zone, districts, leaves) = build(&shape);
        let (year, periods) = year_with_months();
        let facts = facts_for(&lines, &leaves, &year, &periods);
        let last = (first + len).min(12);
        let window = DateWindow::periods(periods[first..last].iter().map(|p| p.id));
        let ctx = RequestContext::new(company()).with_window(window);
        let scope = Scope::resolve(&ctx, std::slice::from_ref(&year), &periods).unwrap();

        let targets = TargetConfiguration::default();
        let engine = AggregationEngine::new(&tree, &targets, Digits::CENTS);
        let metrics = [Metric::Baptism, Metric::Tithe];
        let parent = engine.get_balance(&[zone], &metrics, &facts, &scope).unwrap();
        let children = engine.get_balance(&districts, &metrics, &facts, &scope).unwrap();

        for metric in metrics {
            let sum: Decimal = districts.iter().map(|d| children[&metric][d]).sum();
            prop_assert_eq!(parent[&metric][&zone], sum);
        }
    }

    #[test]
    fn prop_batches_match_single_requests(shape in shape_strategy(), lines in line_strategy()) {
        let (tree, zone, districts, leaves) = build(&shape);
        let (year, periods) = year_with_months();
        let facts = facts_for(&lines, &leaves, &year, &periods);
        let scope = Scope::resolve(&RequestContext::new(company()), std::slice::from_ref(&year), &periods).unwrap();

        let targets = TargetConfiguration::default();
        let engine = AggregationEngine::new(&tree, &targets, Digits::CENTS);
        let mut batch = vec![zone];
        batch.extend(&districts);
        let together = engine.get_balance(&batch, &[Metric::Baptism], &facts, &scope).unwrap();
        for id in batch {
            let alone = engine.get_balance(&[id], &[Metric::Baptism], &facts, &scope).unwrap();
            prop_assert_eq!(together[&Metric::Baptism][&id], alone[&Metric::Baptism][&id]);
        }
    }

    #[test]
    fn prop_child_value_counts_leaves(shape in shape_strategy()) {
        let (tree, zone, districts, _) = build(&shape);
        let total: usize = shape.iter().flatten().sum();
        prop_assert_eq!(tree.child_value(zone).unwrap(), total as u64);
        for (district, churches) in districts.iter().zip(&shape) {
            prop_assert_eq!(tree.child_value(*district).unwrap(), churches.iter().sum::<usize>() as u64);
        }
    }
}

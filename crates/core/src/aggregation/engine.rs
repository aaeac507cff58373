//! Recursive roll-up of line values through the organization tree.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use tmi_shared::types::{Digits, GroupId, MetaGroupId};

use super::context::{LineFact, Scope};
use super::error::AggregationError;
use crate::ledger::{Metric, MetricValues};
use crate::organization::{GroupType, OrganizationTree};
use crate::target::{TargetConfiguration, TargetService};

/// `{metric: {id: value}}`, the shape every batch query returns.
pub type BalanceTable<K> = BTreeMap<Metric, HashMap<K, Decimal>>;

/// Actual, target and their comparison for one metric of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricStatistic {
    /// Metric.
    pub metric: Metric,
    /// Summed line values.
    pub actual: Decimal,
    /// Scaled target.
    pub target: Decimal,
    /// `target - actual`.
    pub difference: Decimal,
    /// `actual / target`, 0 without target.
    pub percentage: Decimal,
}

/// Every metric statistic of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatistics {
    /// Node.
    pub meta_id: MetaGroupId,
    /// `name - code - parent` label.
    pub display_name: String,
    /// Node type.
    pub group_type: GroupType,
    /// Depth from the root.
    pub level: u32,
    /// Small groups under the node.
    pub child_value: u64,
    /// One entry per metric, in column order.
    pub metrics: Vec<MetricStatistic>,
}

impl NodeStatistics {
    /// Statistic of one metric.
    #[must_use]
    pub fn get(&self, metric: Metric) -> Option<&MetricStatistic> {
        self.metrics.iter().find(|m| m.metric == metric)
    }

    fn actual(&self, metric: Metric) -> Decimal {
        self.get(metric).map_or(Decimal::ZERO, |m| m.actual)
    }
}

/// Children of one node, ready for printing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    /// Parent node.
    pub parent: MetaGroupId,
    /// Parent label.
    pub parent_name: String,
    /// Direct children, ordered by the report metric.
    pub rows: Vec<NodeStatistics>,
}

/// Resolves metric names coming from outside the crate.
///
/// # Errors
///
/// `UnknownMetric` for any name outside the tracked set.
pub fn parse_metrics<S: AsRef<str>>(names: &[S]) -> Result<Vec<Metric>, AggregationError> {
    Ok(Metric::parse_all(names)?)
}

/// Aggregation over one company's tree.
///
/// Lines are summed per owning node once per batch, then each requested
/// node is summed over its own descendant set, so overlapping subtrees in
/// one batch are each counted in full.
pub struct AggregationEngine<'a> {
    tree: &'a OrganizationTree,
    targets: &'a TargetConfiguration,
    currency: Digits,
}

impl<'a> AggregationEngine<'a> {
    /// Creates an engine over a loaded tree.
    #[must_use]
    pub fn new(tree: &'a OrganizationTree, targets: &'a TargetConfiguration, currency: Digits) -> Self {
        Self {
            tree,
            targets,
            currency,
        }
    }

    /// Admitted line values summed per owning node, restricted to `closure`.
    fn leaf_sums(
        closure: &HashSet<MetaGroupId>,
        facts: &[LineFact],
        scope: &Scope,
    ) -> HashMap<MetaGroupId, MetricValues> {
        facts
            .par_iter()
            .filter(|f| closure.contains(&f.meta_id) && scope.admits(f))
            .fold(HashMap::new, |mut acc: HashMap<MetaGroupId, MetricValues>, f| {
                acc.entry(f.meta_id).or_default().accumulate(&f.values);
                acc
            })
            .reduce(HashMap::new, |mut acc, part| {
                for (id, values) in part {
                    acc.entry(id).or_default().accumulate(&values);
                }
                acc
            })
    }

    fn quantize(&self, values: &MetricValues) -> MetricValues {
        let mut out = *values;
        for metric in Metric::ALL {
            let slot = out.get_mut(metric);
            *slot = metric.precision(self.currency).quantize(*slot);
        }
        out
    }

    /// Rounded totals of every metric for each node, closure-summed.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` when an id is not in the tree.
    pub fn node_values(
        &self,
        ids: &[MetaGroupId],
        facts: &[LineFact],
        scope: &Scope,
    ) -> Result<HashMap<MetaGroupId, MetricValues>, AggregationError> {
        let closure = self.tree.closure(ids)?;
        let sums = Self::leaf_sums(&closure, facts, scope);

        let mut out = HashMap::with_capacity(ids.len());
        for &id in ids {
            let total: MetricValues = self
                .tree
                .descendants(id)?
                .iter()
                .filter_map(|d| sums.get(d))
                .copied()
                .sum();
            out.insert(id, self.quantize(&total));
        }
        Ok(out)
    }

    /// Actual values of `metrics` for each node.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` when an id is not in the tree.
    pub fn get_balance(
        &self,
        ids: &[MetaGroupId],
        metrics: &[Metric],
        facts: &[LineFact],
        scope: &Scope,
    ) -> Result<BalanceTable<MetaGroupId>, AggregationError> {
        let values = self.node_values(ids, facts, scope)?;
        Ok(table(metrics, ids, |metric, id| {
            values.get(id).map_or(Decimal::ZERO, |v| v.get(metric))
        }))
    }

    /// Values of lines attached directly to each group, without roll-up.
    #[must_use]
    pub fn get_group_balance(
        &self,
        group_ids: &[GroupId],
        metrics: &[Metric],
        facts: &[LineFact],
        scope: &Scope,
    ) -> BalanceTable<GroupId> {
        let wanted: HashSet<GroupId> = group_ids.iter().copied().collect();
        let sums = facts
            .iter()
            .filter(|f| wanted.contains(&f.group_id) && scope.admits(f))
            .fold(HashMap::<GroupId, MetricValues>::new(), |mut acc, f| {
                acc.entry(f.group_id).or_default().accumulate(&f.values);
                acc
            });
        table(metrics, group_ids, |metric, id| {
            let value = sums.get(id).map_or(Decimal::ZERO, |v| v.get(metric));
            metric.precision(self.currency).quantize(value)
        })
    }

    fn target_of(&self, id: MetaGroupId, metric: Metric, scope: &Scope) -> Result<Decimal, AggregationError> {
        let child_value = self.tree.child_value(id)?;
        Ok(TargetService::target(self.targets.unit(metric), child_value, scope.span)?)
    }

    /// Scaled targets of `metrics` for each node.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` for unknown ids, `InvalidSpan` for a reversed span.
    pub fn get_target(
        &self,
        ids: &[MetaGroupId],
        metrics: &[Metric],
        scope: &Scope,
    ) -> Result<BalanceTable<MetaGroupId>, AggregationError> {
        try_table(metrics, ids, |metric, id| self.target_of(*id, metric, scope))
    }

    /// `target - actual` for each node.
    ///
    /// # Errors
    ///
    /// See [`get_balance`](Self::get_balance) and [`get_target`](Self::get_target).
    pub fn get_difference(
        &self,
        ids: &[MetaGroupId],
        metrics: &[Metric],
        facts: &[LineFact],
        scope: &Scope,
    ) -> Result<BalanceTable<MetaGroupId>, AggregationError> {
        let values = self.node_values(ids, facts, scope)?;
        try_table(metrics, ids, |metric, id| {
            let actual = values.get(id).map_or(Decimal::ZERO, |v| v.get(metric));
            Ok(TargetService::difference(self.target_of(*id, metric, scope)?, actual))
        })
    }

    /// `actual / target` rounded to two decimals, 0 without target.
    ///
    /// # Errors
    ///
    /// See [`get_balance`](Self::get_balance) and [`get_target`](Self::get_target).
    pub fn get_percentage(
        &self,
        ids: &[MetaGroupId],
        metrics: &[Metric],
        facts: &[LineFact],
        scope: &Scope,
    ) -> Result<BalanceTable<MetaGroupId>, AggregationError> {
        let values = self.node_values(ids, facts, scope)?;
        try_table(metrics, ids, |metric, id| {
            let actual = values.get(id).map_or(Decimal::ZERO, |v| v.get(metric));
            Ok(TargetService::percentage(actual, self.target_of(*id, metric, scope)?))
        })
    }

    fn statistics_from(
        &self,
        id: MetaGroupId,
        values: &MetricValues,
        scope: &Scope,
    ) -> Result<NodeStatistics, AggregationError> {
        let meta = self.tree.node(id)?;
        let metrics = Metric::ALL
            .into_iter()
            .map(|metric| {
                let actual = values.get(metric);
                let target = self.target_of(id, metric, scope)?;
                Ok(MetricStatistic {
                    metric,
                    actual,
                    target,
                    difference: TargetService::difference(target, actual),
                    percentage: TargetService::percentage(actual, target),
                })
            })
            .collect::<Result<Vec<_>, AggregationError>>()?;
        Ok(NodeStatistics {
            meta_id: id,
            display_name: self.tree.display_name(id)?,
            group_type: meta.group_type,
            level: self.tree.level(id)?,
            child_value: self.tree.child_value(id)?,
            metrics,
        })
    }

    /// Every statistic of one node.
    ///
    /// # Errors
    ///
    /// See [`get_difference`](Self::get_difference).
    pub fn statistics(&self, id: MetaGroupId, facts: &[LineFact], scope: &Scope) -> Result<NodeStatistics, AggregationError> {
        let values = self.node_values(&[id], facts, scope)?;
        let own = values.get(&id).copied().unwrap_or_default();
        self.statistics_from(id, &own, scope)
    }

    /// Descendants of `id` depth-first, siblings ordered by `metric`
    /// (highest first) then name.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` when `id` is not in the tree.
    pub fn ordered_descendants(
        &self,
        id: MetaGroupId,
        metric: Metric,
        facts: &[LineFact],
        scope: &Scope,
    ) -> Result<Vec<MetaGroupId>, AggregationError> {
        let all = self.tree.descendants(id)?;
        let values = self.node_values(&all, facts, scope)?;
        let value_of = |m: MetaGroupId| values.get(&m).map_or(Decimal::ZERO, |v| v.get(metric));
        Ok(self
            .tree
            .childs_by_order(id, |a, b| by_value_desc(value_of(a.id), value_of(b.id), &a.name, &b.name))?)
    }

    /// Direct children of every node of `group_type`, or only of `group`
    /// when given, each with its statistics and ordered by `order_by`.
    ///
    /// # Errors
    ///
    /// See [`get_difference`](Self::get_difference).
    pub fn children_report(
        &self,
        group_type: GroupType,
        group: Option<MetaGroupId>,
        order_by: Metric,
        facts: &[LineFact],
        scope: &Scope,
    ) -> Result<Vec<ReportSection>, AggregationError> {
        let parents = match group {
            Some(id) => vec![id],
            None => self.tree.of_type(group_type),
        };

        let mut children = Vec::new();
        for &parent in &parents {
            children.extend_from_slice(self.tree.children(parent)?);
        }
        let values = self.node_values(&children, facts, scope)?;

        parents
            .into_iter()
            .map(|parent| {
                let mut rows = self
                    .tree
                    .children(parent)?
                    .iter()
                    .map(|&child| {
                        let own = values.get(&child).copied().unwrap_or_default();
                        self.statistics_from(child, &own, scope)
                    })
                    .collect::<Result<Vec<_>, AggregationError>>()?;
                rows.sort_by(|a, b| {
                    by_value_desc(a.actual(order_by), b.actual(order_by), &a.display_name, &b.display_name)
                });
                Ok(ReportSection {
                    parent,
                    parent_name: self.tree.display_name(parent)?,
                    rows,
                })
            })
            .collect()
    }
}

fn by_value_desc(a: Decimal, b: Decimal, a_name: &str, b_name: &str) -> Ordering {
    b.cmp(&a).then_with(|| a_name.cmp(b_name))
}

fn table<K, F>(metrics: &[Metric], ids: &[K], mut value: F) -> BalanceTable<K>
where
    K: Copy + Eq + std::hash::Hash,
    F: FnMut(Metric, &K) -> Decimal,
{
    let mut out = BalanceTable::new();
    for &metric in metrics {
        let row = ids.iter().map(|id| (*id, value(metric, id))).collect();
        out.insert(metric, row);
    }
    out
}

fn try_table<K, F>(metrics: &[Metric], ids: &[K], mut value: F) -> Result<BalanceTable<K>, AggregationError>
where
    K: Copy + Eq + std::hash::Hash,
    F: FnMut(Metric, &K) -> Result<Decimal, AggregationError>,
{
    let mut out = BalanceTable::new();
    for &metric in metrics {
        let mut row = HashMap::with_capacity(ids.len());
        for id in ids {
            row.insert(*id, value(metric, id)?);
        }
        out.insert(metric, row);
    }
    Ok(out)
}

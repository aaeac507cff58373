//! Aggregation repository.
//!
//! Loads the cached tree, the company calendar, the target configuration
//! and the valid lines under the requested nodes, then hands everything to
//! the [`AggregationEngine`]. Results are computed on every call; only the
//! tree shape is cached.
//!
//! All reads of one request share a read-only repeatable-read transaction,
//! so a move posted mid-request is either fully seen or not at all.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    TransactionTrait,
};
use tmi_core::aggregation::{
    AggregationEngine, AggregationError, BalanceTable, LineFact, NodeStatistics, ReportSection, RequestContext, Scope,
    parse_metrics,
};
use tmi_core::clock::{Clock, SystemClock};
use tmi_core::fiscal::Period;
use tmi_core::ledger::{LineState, Metric};
use tmi_core::organization::{GroupType, OrganizationError, OrganizationTree, TreeCache};
use tmi_core::target::TargetConfiguration;
use tmi_shared::types::{CompanyId, Digits, GroupId, MetaGroupId, PeriodId, YearId};
use tracing::debug;

use super::company::{CompanyError, digits_of};
use super::configuration::load_configuration;
use super::fiscal::{load_company_periods, load_years};
use super::organization::{OrganizationRepoError, cached_tree};
use crate::entities::{companies, lines, moves, periods, sea_orm_active_enums};

const SNAPSHOT_SQL: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY";

/// Error types for aggregation queries.
#[derive(Debug, thiserror::Error)]
pub enum AggregationRepoError {
    /// The request could not be resolved or computed.
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    /// The company record is missing or inconsistent.
    #[error(transparent)]
    Company(#[from] CompanyError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<OrganizationRepoError> for AggregationRepoError {
    fn from(err: OrganizationRepoError) -> Self {
        match err {
            OrganizationRepoError::Organization(e) => Self::Aggregation(e.into()),
            OrganizationRepoError::Database(e) => Self::Database(e),
        }
    }
}

impl From<OrganizationError> for AggregationRepoError {
    fn from(err: OrganizationError) -> Self {
        Self::Aggregation(err.into())
    }
}

/// Everything one request reads, loaded up front.
struct Snapshot {
    tree: Arc<OrganizationTree>,
    targets: TargetConfiguration,
    currency: Digits,
    scope: Scope,
    facts: Vec<LineFact>,
}

impl Snapshot {
    fn engine(&self) -> AggregationEngine<'_> {
        AggregationEngine::new(&self.tree, &self.targets, self.currency)
    }
}

/// Aggregation repository.
#[derive(Debug, Clone)]
pub struct AggregationRepository {
    db: DatabaseConnection,
    cache: TreeCache,
    clock: Arc<dyn Clock>,
}

impl AggregationRepository {
    /// Creates a new aggregation repository using the UTC wall clock.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_parts(db, TreeCache::new(), Arc::new(SystemClock::default()))
    }

    /// Creates a repository with a shared tree cache and an explicit clock.
    #[must_use]
    pub fn with_parts(db: DatabaseConnection, cache: TreeCache, clock: Arc<dyn Clock>) -> Self {
        Self { db, cache, clock }
    }

    /// Reporting context for a company: current year, posted moves only.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn report_context(
        &self,
        company_id: CompanyId,
    ) -> Result<RequestContext, AggregationRepoError> {
        let years = load_years(&self.db, company_id).await?;
        Ok(RequestContext::report(company_id, &years, self.clock.today()))
    }

    /// Sums of each metric over every node's subtree.
    ///
    /// # Errors
    ///
    /// Returns `UnknownMetric`, `NodeNotFound` or a window error, or a
    /// database error.
    pub async fn get_balance<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        ids: &[MetaGroupId],
        metric_names: &[S],
    ) -> Result<BalanceTable<MetaGroupId>, AggregationRepoError> {
        let metrics = parse_metrics(metric_names)?;
        let snapshot = self.snapshot(ctx, ids).await?;
        Ok(snapshot.engine().get_balance(ids, &metrics, &snapshot.facts, &snapshot.scope)?)
    }

    /// Sums of each metric over the lines of each operational group.
    ///
    /// # Errors
    ///
    /// Returns `UnknownMetric` or a window error, or a database error.
    pub async fn get_group_balance<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        group_ids: &[GroupId],
        metric_names: &[S],
    ) -> Result<BalanceTable<GroupId>, AggregationRepoError> {
        let metrics = parse_metrics(metric_names)?;
        let tree = cached_tree(&self.db, &self.cache, ctx.company_id).await?;
        let metas: Vec<MetaGroupId> = group_ids.iter().filter_map(|g| tree.meta_of_group(*g)).collect();
        let snapshot = self.snapshot(ctx, &metas).await?;
        Ok(snapshot
            .engine()
            .get_group_balance(group_ids, &metrics, &snapshot.facts, &snapshot.scope))
    }

    /// Targets of each node.
    ///
    /// # Errors
    ///
    /// Returns `UnknownMetric`, `NodeNotFound` or `InvalidSpan`, or a
    /// database error.
    pub async fn get_target<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        ids: &[MetaGroupId],
        metric_names: &[S],
    ) -> Result<BalanceTable<MetaGroupId>, AggregationRepoError> {
        let metrics = parse_metrics(metric_names)?;
        let txn = self.read_txn().await?;
        let (tree, targets, currency) = self.settings(&txn, ctx).await?;
        let scope = scope(&txn, ctx).await?;
        txn.commit().await?;
        let engine = AggregationEngine::new(&tree, &targets, currency);
        Ok(engine.get_target(ids, &metrics, &scope)?)
    }

    /// Target minus actual for each node.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_balance`] plus `InvalidSpan`.
    pub async fn get_difference<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        ids: &[MetaGroupId],
        metric_names: &[S],
    ) -> Result<BalanceTable<MetaGroupId>, AggregationRepoError> {
        let metrics = parse_metrics(metric_names)?;
        let snapshot = self.snapshot(ctx, ids).await?;
        Ok(snapshot
            .engine()
            .get_difference(ids, &metrics, &snapshot.facts, &snapshot.scope)?)
    }

    /// Actual over target for each node, 0 where the target is 0.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_balance`] plus `InvalidSpan`.
    pub async fn get_percentage<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        ids: &[MetaGroupId],
        metric_names: &[S],
    ) -> Result<BalanceTable<MetaGroupId>, AggregationRepoError> {
        let metrics = parse_metrics(metric_names)?;
        let snapshot = self.snapshot(ctx, ids).await?;
        Ok(snapshot
            .engine()
            .get_percentage(ids, &metrics, &snapshot.facts, &snapshot.scope)?)
    }

    /// Actual, target, difference and percentage of every metric for one
    /// node.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or a window error, or a database error.
    pub async fn statistics(&self, ctx: &RequestContext, id: MetaGroupId) -> Result<NodeStatistics, AggregationRepoError> {
        let snapshot = self.snapshot(ctx, &[id]).await?;
        Ok(snapshot.engine().statistics(id, &snapshot.facts, &snapshot.scope)?)
    }

    /// Every descendant of a node, depth first, siblings ordered by
    /// `metric` descending.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or a window error, or a database error.
    pub async fn ordered_descendants(
        &self,
        ctx: &RequestContext,
        id: MetaGroupId,
        metric: Metric,
    ) -> Result<Vec<MetaGroupId>, AggregationRepoError> {
        let snapshot = self.snapshot(ctx, &[id]).await?;
        Ok(snapshot
            .engine()
            .ordered_descendants(id, metric, &snapshot.facts, &snapshot.scope)?)
    }

    /// Direct children of every node of `group_type` (or of `group` only),
    /// with their statistics, ordered by `order_by` descending.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or a window error, or a database error.
    pub async fn children_report(
        &self,
        ctx: &RequestContext,
        group_type: GroupType,
        group: Option<MetaGroupId>,
        order_by: Metric,
    ) -> Result<Vec<ReportSection>, AggregationRepoError> {
        let tree = cached_tree(&self.db, &self.cache, ctx.company_id).await?;
        let parents = match group {
            Some(id) => vec![id],
            None => tree.of_type(group_type),
        };
        let snapshot = self.snapshot(ctx, &parents).await?;
        Ok(snapshot
            .engine()
            .children_report(group_type, group, order_by, &snapshot.facts, &snapshot.scope)?)
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    async fn read_txn(&self) -> Result<DatabaseTransaction, DbErr> {
        let txn = self.db.begin().await?;
        txn.execute_unprepared(SNAPSHOT_SQL).await?;
        Ok(txn)
    }

    async fn settings<C: ConnectionTrait>(
        &self,
        conn: &C,
        ctx: &RequestContext,
    ) -> Result<(Arc<OrganizationTree>, TargetConfiguration, Digits), AggregationRepoError> {
        let tree = cached_tree(conn, &self.cache, ctx.company_id).await?;
        let targets = load_configuration(conn, ctx.company_id).await?;
        let company = companies::Entity::find_by_id(ctx.company_id.uuid())
            .one(conn)
            .await?
            .ok_or(CompanyError::NotFound(ctx.company_id))?;
        Ok((tree, targets, digits_of(&company)?))
    }

    async fn snapshot(&self, ctx: &RequestContext, ids: &[MetaGroupId]) -> Result<Snapshot, AggregationRepoError> {
        let txn = self.read_txn().await?;
        let (tree, targets, currency) = self.settings(&txn, ctx).await?;
        let scope = scope(&txn, ctx).await?;
        let closure = tree.closure(ids)?;
        let facts = load_facts(&txn, &tree, &closure).await?;
        txn.commit().await?;
        debug!(
            company_id = %ctx.company_id,
            nodes = ids.len(),
            closure = closure.len(),
            count = facts.len(),
            "Aggregation snapshot loaded"
        );
        Ok(Snapshot {
            tree,
            targets,
            currency,
            scope,
            facts,
        })
    }
}

async fn scope<C: ConnectionTrait>(conn: &C, ctx: &RequestContext) -> Result<Scope, AggregationRepoError> {
    let years = load_years(conn, ctx.company_id).await?;
    let periods = load_company_periods(conn, ctx.company_id).await?;
    Ok(Scope::resolve(ctx, &years, &periods)?)
}

/// Valid lines of the groups bound to `closure`, with their move keys.
async fn load_facts<C: ConnectionTrait>(
    conn: &C,
    tree: &OrganizationTree,
    closure: &HashSet<MetaGroupId>,
) -> Result<Vec<LineFact>, DbErr> {
    let group_ids: Vec<_> = closure
        .iter()
        .filter_map(|id| tree.group_for(*id))
        .map(|g| g.id.uuid())
        .collect();
    if group_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = lines::Entity::find()
        .filter(lines::Column::GroupId.is_in(group_ids))
        .filter(lines::Column::State.eq(sea_orm_active_enums::LineState::Valid))
        .find_also_related(moves::Entity)
        .all(conn)
        .await?;

    let period_ids: HashSet<_> = rows
        .iter()
        .filter_map(|(_, mv)| mv.as_ref().map(|m| m.period_id))
        .collect();
    let year_of: HashMap<PeriodId, YearId> = periods::Entity::find()
        .filter(periods::Column::Id.is_in(period_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(Period::from)
        .map(|p| (p.id, p.year_id))
        .collect();

    Ok(rows
        .into_iter()
        .filter_map(|(line, mv)| {
            let mv = mv?;
            let group_id = GroupId::from(line.group_id);
            let period_id = PeriodId::from(mv.period_id);
            Some(LineFact {
                line_id: line.id.into(),
                group_id,
                meta_id: tree.meta_of_group(group_id)?,
                move_id: mv.id.into(),
                period_id,
                year_id: *year_of.get(&period_id)?,
                move_date: mv.date,
                move_state: mv.state.into(),
                line_state: LineState::from(line.state),
                values: line.values(),
            })
        })
        .collect())
}

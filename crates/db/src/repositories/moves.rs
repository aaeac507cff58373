//! Move and line repository.
//!
//! Every operation loads the move aggregate (move, lines, period, church),
//! asks `LedgerService` for the outcome and writes it back in the same
//! transaction. Any failure drops the transaction, so a number drawn for a
//! move whose later check fails is never committed.

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tmi_core::clock::{Clock, SystemClock};
use tmi_core::fiscal::{FiscalError, FiscalService, Period};
use tmi_core::ledger::validation::{default_move_date, line_state_for};
use tmi_core::ledger::{ControlTotal, LedgerError, LedgerService, Line, MetricValues, Move, MoveEvent, MoveState};
use tmi_core::organization::{OrganizationError, OrganizationTree, TreeCache};
use tmi_shared::types::{CompanyId, Digits, GroupId, LineId, MetaGroupId, MoveId, PeriodId, UserId};
use tracing::{info, warn};

use super::company::{CompanyError, digits_of};
use super::configuration::load_configuration;
use super::fiscal::load_company_periods;
use super::organization::{OrganizationRepoError, cached_tree};
use super::sequence::{SequenceError, next_value};
use crate::entities::{companies, lines, moves, periods, sea_orm_active_enums};

/// Error types for move repository operations.
#[derive(Debug, thiserror::Error)]
pub enum MoveRepoError {
    /// A ledger rule was violated.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// No period matches the move date.
    #[error(transparent)]
    Fiscal(#[from] FiscalError),

    /// The church or small group is unknown.
    #[error(transparent)]
    Organization(#[from] OrganizationError),

    /// The company record is missing or inconsistent.
    #[error(transparent)]
    Company(#[from] CompanyError),

    /// The move sequence failed.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// Move not found.
    #[error("Move not found: {0}")]
    MoveNotFound(MoveId),

    /// Line not found.
    #[error("Line not found: {0}")]
    LineNotFound(LineId),

    /// Period not found.
    #[error("Period not found: {0}")]
    PeriodNotFound(PeriodId),

    /// Group not found in the company tree.
    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    /// The company has no sequence to number moves with.
    #[error("No move sequence configured for company {0}")]
    MissingSequence(CompanyId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<OrganizationRepoError> for MoveRepoError {
    fn from(err: OrganizationRepoError) -> Self {
        match err {
            OrganizationRepoError::Organization(e) => Self::Organization(e),
            OrganizationRepoError::Database(e) => Self::Database(e),
        }
    }
}

/// A move with its lines.
#[derive(Debug, Clone)]
pub struct MoveWithLines {
    /// The move header.
    pub mv: Move,
    /// Its lines.
    pub lines: Vec<Line>,
}

/// Input for creating a move.
#[derive(Debug, Clone)]
pub struct CreateMoveInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// The church the move reports for.
    pub group_id: MetaGroupId,
    /// Period; defaults to the open standard period containing `date`.
    pub period_id: Option<PeriodId>,
    /// Move date; defaults to today.
    pub date: Option<NaiveDate>,
    /// Free text.
    pub description: Option<String>,
    /// Declared total checked on quote and post.
    pub control: Option<ControlTotal>,
    /// Create a zero line for every active small group of the church.
    pub prefill: bool,
    /// Acting user.
    pub created_by: Option<UserId>,
}

impl CreateMoveInput {
    /// A move for `church` with every default applied.
    #[must_use]
    pub fn new(company_id: CompanyId, church: MetaGroupId) -> Self {
        Self {
            company_id,
            group_id: church,
            period_id: None,
            date: None,
            description: None,
            control: None,
            prefill: false,
            created_by: None,
        }
    }
}

/// Header changes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateMoveInput {
    /// New date.
    pub date: Option<NaiveDate>,
    /// New period.
    pub period_id: Option<PeriodId>,
    /// New description (`Some(None)` clears it).
    pub description: Option<Option<String>>,
    /// New control total (`Some(None)` clears it).
    pub control: Option<Option<ControlTotal>>,
}

/// Where [`MoveRepository::add_lines`] puts its lines.
#[derive(Debug, Clone)]
pub enum LineTarget {
    /// An existing move.
    Move(MoveId),
    /// A bare draft move created in the same transaction.
    NewMove {
        /// Owning company.
        company_id: CompanyId,
        /// The church the move reports for.
        church: MetaGroupId,
        /// Move date; defaults to today and picks the period.
        date: Option<NaiveDate>,
    },
}

/// Move and line repository.
#[derive(Debug, Clone)]
pub struct MoveRepository {
    db: DatabaseConnection,
    cache: TreeCache,
    clock: Arc<dyn Clock>,
}

impl MoveRepository {
    /// Creates a new move repository using the UTC wall clock.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_parts(db, TreeCache::new(), Arc::new(SystemClock::default()))
    }

    /// Creates a repository with a shared tree cache and an explicit clock.
    #[must_use]
    pub fn with_parts(db: DatabaseConnection, cache: TreeCache, clock: Arc<dyn Clock>) -> Self {
        Self { db, cache, clock }
    }

    // ------------------------------------------------------------------
    // Moves
    // ------------------------------------------------------------------

    /// Creates a draft move for a church.
    ///
    /// # Errors
    ///
    /// Returns `NoPeriodForDate` when no open period contains the date,
    /// `MoveGroupNotChurch`, `DateOutsidePeriod`, `PeriodNotOpen` or
    /// `DuplicateMove`, or a database error.
    pub async fn create(&self, input: CreateMoveInput) -> Result<MoveWithLines, MoveRepoError> {
        let txn = self.db.begin().await?;

        let prefill = input.prefill;
        let (mv, tree) = self.insert_draft(&txn, input).await?;
        let lines = if prefill {
            let groups = tree.active_small_groups(mv.group_id)?;
            let lines = LedgerService::prefill_lines(&mv, &groups);
            for line in &lines {
                insert_line(&txn, line, mv.company_id).await?;
            }
            lines
        } else {
            Vec::new()
        };

        txn.commit().await?;
        info!(move_id = %mv.id, church = %mv.group_id, period_id = %mv.period_id, count = lines.len(), "Move created");
        Ok(MoveWithLines { mv, lines })
    }

    /// Validates and inserts a draft move header.
    async fn insert_draft(
        &self,
        txn: &DatabaseTransaction,
        input: CreateMoveInput,
    ) -> Result<(Move, Arc<OrganizationTree>), MoveRepoError> {
        let date = default_move_date(input.date, self.clock.today());
        let period = match input.period_id {
            Some(period_id) => require_period(txn, period_id).await?,
            None => {
                let periods = load_company_periods(txn, input.company_id).await?;
                FiscalService::require_period(&periods, date, true)?.clone()
            }
        };
        let tree = cached_tree(txn, &self.cache, input.company_id).await?;
        let church = tree.node(input.group_id)?;

        let mv = Move {
            id: MoveId::generate(),
            company_id: input.company_id,
            number: None,
            post_number: None,
            date,
            post_date: None,
            description: input.description,
            state: MoveState::Draft,
            group_id: input.group_id,
            period_id: period.id,
            control: input.control,
        };
        let existing = church_moves(txn, input.group_id).await?;
        LedgerService::validate_move(&mv, church, &period, &existing)?;
        insert_move(txn, &mv, input.created_by).await?;
        Ok((mv, tree))
    }

    /// Changes the header of a move that is not posted.
    ///
    /// # Errors
    ///
    /// Returns `ModifyPostedMove`, any header rule error, or a database
    /// error.
    pub async fn update(&self, id: MoveId, changes: UpdateMoveInput) -> Result<Move, MoveRepoError> {
        let txn = self.db.begin().await?;

        let mut mv = require_move(&txn, id).await?;
        LedgerService::validate_move_edit(&mv)?;
        if let Some(date) = changes.date {
            mv.date = date;
        }
        if let Some(period_id) = changes.period_id {
            mv.period_id = period_id;
        }
        if let Some(description) = changes.description {
            mv.description = description;
        }
        if let Some(control) = changes.control {
            mv.control = control;
        }

        let period = require_period(&txn, mv.period_id).await?;
        let tree = cached_tree(&txn, &self.cache, mv.company_id).await?;
        let church = tree.node(mv.group_id)?;
        let existing = church_moves(&txn, mv.group_id).await?;
        LedgerService::validate_move(&mv, church, &period, &existing)?;

        moves::ActiveModel {
            id: Set(id.uuid()),
            date: Set(mv.date),
            period_id: Set(mv.period_id.uuid()),
            description: Set(mv.description.clone()),
            control_metric: Set(mv.control.map(|c| c.metric.into())),
            control_amount: Set(mv.control.map(|c| c.amount)),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        txn.commit().await?;
        info!(move_id = %id, "Move updated");
        Ok(mv)
    }

    /// Loads a move with its lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: MoveId) -> Result<Option<MoveWithLines>, MoveRepoError> {
        let Some(model) = moves::Entity::find_by_id(id.uuid()).one(&self.db).await? else {
            return Ok(None);
        };
        let lines = move_lines(&self.db, id).await?;
        Ok(Some(MoveWithLines {
            mv: model.into(),
            lines,
        }))
    }

    /// Moves of a company, optionally restricted to one period.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, company_id: CompanyId, period_id: Option<PeriodId>) -> Result<Vec<Move>, MoveRepoError> {
        let mut query = moves::Entity::find().filter(moves::Column::CompanyId.eq(company_id.uuid()));
        if let Some(period_id) = period_id {
            query = query.filter(moves::Column::PeriodId.eq(period_id.uuid()));
        }
        Ok(query
            .order_by_asc(moves::Column::Date)
            .order_by_asc(moves::Column::Number)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Move::from)
            .collect())
    }

    // ------------------------------------------------------------------
    // Workflow
    // ------------------------------------------------------------------

    /// Quotes the moves: draft ones get a number, posted ones reopen.
    ///
    /// # Errors
    ///
    /// The first failing move aborts the whole batch.
    pub async fn quote(&self, ids: &[MoveId]) -> Result<Vec<Move>, MoveRepoError> {
        self.transition(ids, MoveEvent::Quote).await
    }

    /// Posts quoted moves, assigning post number and post date.
    ///
    /// # Errors
    ///
    /// The first failing move aborts the whole batch.
    pub async fn post(&self, ids: &[MoveId]) -> Result<Vec<Move>, MoveRepoError> {
        self.transition(ids, MoveEvent::Post).await
    }

    /// Cancels draft or quoted moves.
    ///
    /// # Errors
    ///
    /// The first failing move aborts the whole batch.
    pub async fn cancel(&self, ids: &[MoveId]) -> Result<Vec<Move>, MoveRepoError> {
        self.transition(ids, MoveEvent::Cancel).await
    }

    /// Sends quoted or canceled moves back to draft.
    ///
    /// # Errors
    ///
    /// The first failing move aborts the whole batch.
    pub async fn draft(&self, ids: &[MoveId]) -> Result<Vec<Move>, MoveRepoError> {
        self.transition(ids, MoveEvent::Draft).await
    }

    async fn transition(&self, ids: &[MoveId], event: MoveEvent) -> Result<Vec<Move>, MoveRepoError> {
        let txn = self.db.begin().await?;
        let today = self.clock.today();

        let mut done = Vec::with_capacity(ids.len());
        for &id in ids {
            let mut mv = require_move(&txn, id).await?;
            let mut lines = move_lines(&txn, id).await?;
            let period = require_period(&txn, mv.period_id).await?;
            let currency = company_digits(&txn, mv.company_id).await?;

            let action = match LedgerService::apply(event, &mv, &lines, &period, currency, today) {
                Ok(action) => action,
                Err(err) => {
                    warn!(move_id = %id, event = %event, error = %err, "Move transition rejected");
                    return Err(err.into());
                }
            };
            let number = if action.needs_number() {
                Some(draw_move_number(&txn, mv.company_id).await?)
            } else {
                None
            };
            action.apply(&mut mv, number);
            save_workflow_fields(&txn, &mv).await?;
            sync_line_states(&txn, &mv, &mut lines).await?;

            info!(move_id = %id, from = %action.from, to = %action.to, "Move transition");
            done.push(mv);
        }

        txn.commit().await?;
        Ok(done)
    }

    /// Deletes moves, canceling them first.
    ///
    /// # Errors
    ///
    /// Returns `ModifyPostedMove` for posted moves and `DeleteNumberedMove`
    /// for moves that were posted once. Nothing is deleted on failure.
    pub async fn delete(&self, ids: &[MoveId]) -> Result<(), MoveRepoError> {
        let txn = self.db.begin().await?;
        let today = self.clock.today();

        for &id in ids {
            let mut mv = require_move(&txn, id).await?;
            let lines = move_lines(&txn, id).await?;
            let period = require_period(&txn, mv.period_id).await?;
            match LedgerService::prepare_delete(&mv, &lines, &period, today) {
                Ok(Some(cancel)) => {
                    cancel.apply(&mut mv, None);
                    save_workflow_fields(&txn, &mv).await?;
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(move_id = %id, error = %err, "Move delete rejected");
                    return Err(err.into());
                }
            }
            moves::Entity::delete_by_id(id.uuid()).exec(&txn).await?;
            info!(move_id = %id, count = lines.len(), "Move deleted");
        }

        txn.commit().await?;
        Ok(())
    }

    /// Duplicates a move and its lines into `period_id` as a new draft.
    ///
    /// The copy is dated `date`, or the first day of the target period.
    ///
    /// # Errors
    ///
    /// Returns any header rule error for the copy (the church may already
    /// have a move in the target period), or a database error.
    pub async fn copy(
        &self,
        id: MoveId,
        period_id: PeriodId,
        date: Option<NaiveDate>,
    ) -> Result<MoveWithLines, MoveRepoError> {
        let txn = self.db.begin().await?;

        let source = require_move(&txn, id).await?;
        let source_lines = move_lines(&txn, id).await?;
        let period = require_period(&txn, period_id).await?;
        let date = date.unwrap_or(period.start_date);
        let (copy, lines) = LedgerService::copy_move(&source, &source_lines, &period, date);

        let tree = cached_tree(&txn, &self.cache, copy.company_id).await?;
        let church = tree.node(copy.group_id)?;
        let existing = church_moves(&txn, copy.group_id).await?;
        LedgerService::validate_move(&copy, church, &period, &existing)?;

        insert_move(&txn, &copy, None).await?;
        for line in &lines {
            insert_line(&txn, line, copy.company_id).await?;
        }

        txn.commit().await?;
        info!(move_id = %copy.id, source = %id, count = lines.len(), "Move copied");
        Ok(MoveWithLines { mv: copy, lines })
    }

    // ------------------------------------------------------------------
    // Lines
    // ------------------------------------------------------------------

    /// Adds a small group line to a move.
    ///
    /// # Errors
    ///
    /// Returns `ModifyPostedMove`, `LineGroupNotSmallGroup`,
    /// `InactiveGroup` or `PrecisionExceeded`, or a database error.
    pub async fn add_line(&self, move_id: MoveId, group_id: GroupId, values: MetricValues) -> Result<Line, MoveRepoError> {
        let txn = self.db.begin().await?;

        let mv = require_move(&txn, move_id).await?;
        let tree = cached_tree(&txn, &self.cache, mv.company_id).await?;
        let currency = company_digits(&txn, mv.company_id).await?;
        check_line(&tree, &mv, group_id, &values, currency)?;

        let line = Line {
            id: LineId::generate(),
            move_id,
            group_id,
            state: line_state_for(mv.state),
            values,
        };
        insert_line(&txn, &line, mv.company_id).await?;
        let mut lines = move_lines(&txn, move_id).await?;
        sync_line_states(&txn, &mv, &mut lines).await?;

        txn.commit().await?;
        info!(move_id = %move_id, line_id = %line.id, "Line added");
        Ok(line)
    }

    /// Adds several lines at once. With [`LineTarget::NewMove`] a bare
    /// draft move is created first, so the lines never end up orphaned.
    ///
    /// # Errors
    ///
    /// Any move creation error for a new move, then the same rules as
    /// [`Self::add_line`] for every line. Nothing is written on failure.
    pub async fn add_lines(
        &self,
        target: LineTarget,
        entries: &[(GroupId, MetricValues)],
    ) -> Result<MoveWithLines, MoveRepoError> {
        let txn = self.db.begin().await?;

        let (mv, tree) = match target {
            LineTarget::Move(id) => {
                let mv = require_move(&txn, id).await?;
                let tree = cached_tree(&txn, &self.cache, mv.company_id).await?;
                (mv, tree)
            }
            LineTarget::NewMove { company_id, church, date } => {
                let mut input = CreateMoveInput::new(company_id, church);
                input.date = date;
                let (mv, tree) = self.insert_draft(&txn, input).await?;
                info!(move_id = %mv.id, church = %church, "Bare move created for lines");
                (mv, tree)
            }
        };
        let currency = company_digits(&txn, mv.company_id).await?;
        for (group_id, values) in entries {
            check_line(&tree, &mv, *group_id, values, currency)?;
            let line = Line {
                id: LineId::generate(),
                move_id: mv.id,
                group_id: *group_id,
                state: line_state_for(mv.state),
                values: *values,
            };
            insert_line(&txn, &line, mv.company_id).await?;
        }
        let mut lines = move_lines(&txn, mv.id).await?;
        sync_line_states(&txn, &mv, &mut lines).await?;

        txn.commit().await?;
        info!(move_id = %mv.id, count = entries.len(), "Lines added");
        Ok(MoveWithLines { mv, lines })
    }

    /// Rewrites the values (and optionally the group) of a line.
    ///
    /// # Errors
    ///
    /// Same rules as [`Self::add_line`], checked against the parent move.
    pub async fn update_line(
        &self,
        line_id: LineId,
        group_id: Option<GroupId>,
        values: MetricValues,
    ) -> Result<Line, MoveRepoError> {
        let txn = self.db.begin().await?;

        let mut line = require_line(&txn, line_id).await?;
        let mv = require_move(&txn, line.move_id).await?;
        let tree = cached_tree(&txn, &self.cache, mv.company_id).await?;
        let currency = company_digits(&txn, mv.company_id).await?;
        let group_id = group_id.unwrap_or(line.group_id);
        check_line(&tree, &mv, group_id, &values, currency)?;

        line.group_id = group_id;
        line.values = values;
        lines::ActiveModel {
            id: Set(line_id.uuid()),
            group_id: Set(group_id.uuid()),
            baptism: Set(values.baptism),
            tithe: Set(values.tithe),
            offering: Set(values.offering),
            small_group: Set(values.small_group),
            gathering: Set(values.gathering),
            church_planting: Set(values.church_planting),
            organizing_church: Set(values.organizing_church),
            praise_thanksgiving: Set(values.praise_thanksgiving),
            ..Default::default()
        }
        .update(&txn)
        .await?;
        let mut lines = move_lines(&txn, mv.id).await?;
        sync_line_states(&txn, &mv, &mut lines).await?;
        if let Some(synced) = lines.iter().find(|l| l.id == line_id) {
            line.state = synced.state;
        }

        txn.commit().await?;
        info!(move_id = %mv.id, line_id = %line_id, "Line updated");
        Ok(line)
    }

    /// Deletes a line.
    ///
    /// # Errors
    ///
    /// Returns `ModifyPostedMove` when the parent move is posted.
    pub async fn delete_line(&self, line_id: LineId) -> Result<(), MoveRepoError> {
        let txn = self.db.begin().await?;

        let line = require_line(&txn, line_id).await?;
        let mv = require_move(&txn, line.move_id).await?;
        if let Err(err) = LedgerService::validate_line_delete(&mv) {
            warn!(move_id = %mv.id, line_id = %line_id, error = %err, "Line delete rejected");
            return Err(err.into());
        }
        lines::Entity::delete_by_id(line_id.uuid()).exec(&txn).await?;
        let mut lines = move_lines(&txn, mv.id).await?;
        sync_line_states(&txn, &mv, &mut lines).await?;

        txn.commit().await?;
        info!(move_id = %mv.id, line_id = %line_id, "Line deleted");
        Ok(())
    }
}

// ----------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------

fn check_line(
    tree: &OrganizationTree,
    mv: &Move,
    group_id: GroupId,
    values: &MetricValues,
    currency: Digits,
) -> Result<(), MoveRepoError> {
    let meta_id = tree
        .meta_of_group(group_id)
        .ok_or(MoveRepoError::GroupNotFound(group_id))?;
    let meta = tree.node(meta_id)?;
    if let Err(err) = LedgerService::validate_line_write(mv, meta, values, currency) {
        warn!(move_id = %mv.id, group_id = %group_id, error = %err, "Line write rejected");
        return Err(err.into());
    }
    Ok(())
}

async fn require_move<C: ConnectionTrait>(conn: &C, id: MoveId) -> Result<Move, MoveRepoError> {
    moves::Entity::find_by_id(id.uuid())
        .one(conn)
        .await?
        .map(Move::from)
        .ok_or(MoveRepoError::MoveNotFound(id))
}

async fn require_line<C: ConnectionTrait>(conn: &C, id: LineId) -> Result<Line, MoveRepoError> {
    lines::Entity::find_by_id(id.uuid())
        .one(conn)
        .await?
        .map(Line::from)
        .ok_or(MoveRepoError::LineNotFound(id))
}

async fn require_period<C: ConnectionTrait>(conn: &C, id: PeriodId) -> Result<Period, MoveRepoError> {
    periods::Entity::find_by_id(id.uuid())
        .one(conn)
        .await?
        .map(Period::from)
        .ok_or(MoveRepoError::PeriodNotFound(id))
}

async fn move_lines<C: ConnectionTrait>(conn: &C, move_id: MoveId) -> Result<Vec<Line>, DbErr> {
    Ok(lines::Entity::find()
        .filter(lines::Column::MoveId.eq(move_id.uuid()))
        .order_by_asc(lines::Column::CreatedAt)
        .order_by_asc(lines::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(Line::from)
        .collect())
}

async fn church_moves<C: ConnectionTrait>(conn: &C, church: MetaGroupId) -> Result<Vec<Move>, DbErr> {
    Ok(moves::Entity::find()
        .filter(moves::Column::GroupId.eq(church.uuid()))
        .all(conn)
        .await?
        .into_iter()
        .map(Move::from)
        .collect())
}

async fn company_digits<C: ConnectionTrait>(conn: &C, company_id: CompanyId) -> Result<Digits, MoveRepoError> {
    let company = companies::Entity::find_by_id(company_id.uuid())
        .one(conn)
        .await?
        .ok_or(CompanyError::NotFound(company_id))?;
    Ok(digits_of(&company)?)
}

async fn draw_move_number(txn: &DatabaseTransaction, company_id: CompanyId) -> Result<String, MoveRepoError> {
    let config = load_configuration(txn, company_id).await?;
    let sequence_id = config
        .move_sequence_id
        .ok_or(MoveRepoError::MissingSequence(company_id))?;
    Ok(next_value(txn, sequence_id).await?)
}

/// Brings the stored line states in line with the move in one UPDATE.
async fn sync_line_states(txn: &DatabaseTransaction, mv: &Move, lines: &mut [Line]) -> Result<(), DbErr> {
    let changed = LedgerService::recompute_line_states(mv, lines);
    let Some(state) = lines.first().map(|l| l.state) else {
        return Ok(());
    };
    if changed.is_empty() {
        return Ok(());
    }
    lines::Entity::update_many()
        .col_expr(
            lines::Column::State,
            sea_orm_active_enums::LineState::from(state).as_enum(),
        )
        .filter(lines::Column::Id.is_in(changed.iter().map(|id| id.uuid())))
        .exec(txn)
        .await?;
    Ok(())
}

async fn save_workflow_fields(txn: &DatabaseTransaction, mv: &Move) -> Result<(), DbErr> {
    moves::ActiveModel {
        id: Set(mv.id.uuid()),
        state: Set(mv.state.into()),
        number: Set(mv.number.clone()),
        post_number: Set(mv.post_number.clone()),
        post_date: Set(mv.post_date),
        ..Default::default()
    }
    .update(txn)
    .await?;
    Ok(())
}

async fn insert_move(txn: &DatabaseTransaction, mv: &Move, created_by: Option<UserId>) -> Result<(), DbErr> {
    let now = chrono::Utc::now().into();
    moves::ActiveModel {
        id: Set(mv.id.uuid()),
        company_id: Set(mv.company_id.uuid()),
        number: Set(mv.number.clone()),
        post_number: Set(mv.post_number.clone()),
        date: Set(mv.date),
        post_date: Set(mv.post_date),
        description: Set(mv.description.clone()),
        state: Set(mv.state.into()),
        group_id: Set(mv.group_id.uuid()),
        period_id: Set(mv.period_id.uuid()),
        control_metric: Set(mv.control.map(|c| c.metric.into())),
        control_amount: Set(mv.control.map(|c| c.amount)),
        created_by: Set(created_by.map(UserId::uuid)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_line(txn: &DatabaseTransaction, line: &Line, company_id: CompanyId) -> Result<(), DbErr> {
    let now = chrono::Utc::now().into();
    let v = line.values;
    lines::ActiveModel {
        id: Set(line.id.uuid()),
        company_id: Set(company_id.uuid()),
        move_id: Set(line.move_id.uuid()),
        group_id: Set(line.group_id.uuid()),
        state: Set(line.state.into()),
        baptism: Set(v.baptism),
        tithe: Set(v.tithe),
        offering: Set(v.offering),
        small_group: Set(v.small_group),
        gathering: Set(v.gathering),
        church_planting: Set(v.church_planting),
        organizing_church: Set(v.organizing_church),
        praise_thanksgiving: Set(v.praise_thanksgiving),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await?;
    Ok(())
}

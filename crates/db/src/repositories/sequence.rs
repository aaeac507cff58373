//! Number sequence repository.
//!
//! `next_value` bumps the counter with `UPDATE … RETURNING`, which holds
//! the row lock until the surrounding transaction ends. A move quoted in a
//! transaction that later rolls back therefore gives its number back.

use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait, FromQueryResult, Set,
    Statement,
};
use tmi_core::sequence::SequenceFormat;
use tmi_shared::types::{CompanyId, SequenceId};
use tracing::{debug, info};

use crate::entities::sequences;

/// Error types for sequence operations.
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    /// Sequence not found.
    #[error("Sequence not found: {0}")]
    NotFound(SequenceId),

    /// Stored padding is out of range.
    #[error("Invalid sequence padding {0}")]
    InvalidPadding(i32),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a sequence.
#[derive(Debug, Clone)]
pub struct CreateSequenceInput {
    /// Owning company; `None` for a global sequence.
    pub company_id: Option<CompanyId>,
    /// Sequence name.
    pub name: String,
    /// Counter prefix.
    pub prefix: String,
    /// Counter zero padding.
    pub padding: u32,
}

const NEXT_VALUE_SQL: &str = r"
UPDATE sequences
SET next_number = next_number + 1
WHERE id = $1
RETURNING prefix, padding, next_number - 1 AS number
";

/// Number sequence repository.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    db: DatabaseConnection,
}

impl SequenceRepository {
    /// Creates a new sequence repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a sequence starting at 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, input: CreateSequenceInput) -> Result<sequences::Model, SequenceError> {
        let padding = i32::try_from(input.padding).map_err(|_| SequenceError::InvalidPadding(i32::MAX))?;
        let now = chrono::Utc::now().into();
        let sequence = sequences::ActiveModel {
            id: Set(SequenceId::generate().uuid()),
            company_id: Set(input.company_id.map(CompanyId::uuid)),
            name: Set(input.name),
            prefix: Set(input.prefix),
            padding: Set(padding),
            next_number: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(sequence_id = %sequence.id, prefix = %sequence.prefix, "Sequence created");
        Ok(sequence)
    }

    /// Finds a sequence by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, id: SequenceId) -> Result<Option<sequences::Model>, SequenceError> {
        Ok(sequences::Entity::find_by_id(id.uuid()).one(&self.db).await?)
    }

    /// Draws the next formatted number in its own statement.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown sequence, or a database error.
    pub async fn next_value(&self, id: SequenceId) -> Result<String, SequenceError> {
        next_value(&self.db, id).await
    }
}

/// Draws the next number on `conn`, typically an open transaction.
pub(crate) async fn next_value<C: ConnectionTrait>(conn: &C, id: SequenceId) -> Result<String, SequenceError> {
    #[derive(Debug, FromQueryResult)]
    struct NextRow {
        prefix: String,
        padding: i32,
        number: i64,
    }

    let row = NextRow::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        NEXT_VALUE_SQL,
        [id.uuid().into()],
    ))
    .one(conn)
    .await?
    .ok_or(SequenceError::NotFound(id))?;

    let padding = u32::try_from(row.padding).map_err(|_| SequenceError::InvalidPadding(row.padding))?;
    let value = SequenceFormat::new(row.prefix, padding).format(row.number);
    debug!(sequence_id = %id, value = %value, "Sequence number drawn");
    Ok(value)
}

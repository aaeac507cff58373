//! Company configuration repository.
//!
//! One `configurations` row per company holds the move sequence; target
//! overrides live in `configuration_targets`, one row per metric. A metric
//! without a row falls back to the default unit.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tmi_core::ledger::Metric;
use tmi_core::target::{TargetConfiguration, TargetError};
use tmi_shared::types::{CompanyId, SequenceId};
use tracing::info;
use uuid::Uuid;

use crate::entities::{configuration_targets, configurations, sea_orm_active_enums};

/// Error types for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// A target rule was violated.
    #[error(transparent)]
    Target(#[from] TargetError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Company configuration repository.
#[derive(Debug, Clone)]
pub struct ConfigurationRepository {
    db: DatabaseConnection,
}

impl ConfigurationRepository {
    /// Creates a new configuration repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Target configuration of a company with its overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, company_id: CompanyId) -> Result<TargetConfiguration, ConfigurationError> {
        Ok(load_configuration(&self.db, company_id).await?)
    }

    /// Overrides the unit target of one metric.
    ///
    /// # Errors
    ///
    /// Returns `NegativeUnit` for a negative value, or a database error.
    pub async fn set_target(
        &self,
        company_id: CompanyId,
        metric: Metric,
        value: Decimal,
    ) -> Result<TargetConfiguration, ConfigurationError> {
        let txn = self.db.begin().await?;

        let mut config = load_configuration(&txn, company_id).await?;
        config.set_unit(metric, value)?;

        let row = ensure_row(&txn, company_id).await?;
        let existing = configuration_targets::Entity::find()
            .filter(configuration_targets::Column::ConfigurationId.eq(row.id))
            .filter(configuration_targets::Column::Metric.eq(sea_orm_active_enums::Metric::from(metric)))
            .one(&txn)
            .await?;
        match existing {
            Some(target) => {
                configuration_targets::ActiveModel {
                    id: Set(target.id),
                    value: Set(value),
                    ..Default::default()
                }
                .update(&txn)
                .await?;
            }
            None => {
                let now = chrono::Utc::now().into();
                configuration_targets::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    configuration_id: Set(row.id),
                    metric: Set(metric.into()),
                    value: Set(value),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?;
            }
        }

        txn.commit().await?;
        info!(company_id = %company_id, metric = %metric, value = %value, "Target updated");
        Ok(config)
    }

    /// Removes the override of one metric, restoring the default unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn clear_target(&self, company_id: CompanyId, metric: Metric) -> Result<TargetConfiguration, ConfigurationError> {
        let txn = self.db.begin().await?;
        if let Some(row) = find_row(&txn, company_id).await? {
            configuration_targets::Entity::delete_many()
                .filter(configuration_targets::Column::ConfigurationId.eq(row.id))
                .filter(configuration_targets::Column::Metric.eq(sea_orm_active_enums::Metric::from(metric)))
                .exec(&txn)
                .await?;
        }
        let config = load_configuration(&txn, company_id).await?;
        txn.commit().await?;
        Ok(config)
    }

    /// Sets the sequence used to number the company's moves.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn set_move_sequence(
        &self,
        company_id: CompanyId,
        sequence_id: SequenceId,
    ) -> Result<TargetConfiguration, ConfigurationError> {
        let txn = self.db.begin().await?;
        let row = ensure_row(&txn, company_id).await?;
        configurations::ActiveModel {
            id: Set(row.id),
            move_sequence_id: Set(Some(sequence_id.uuid())),
            ..Default::default()
        }
        .update(&txn)
        .await?;
        let config = load_configuration(&txn, company_id).await?;
        txn.commit().await?;
        info!(company_id = %company_id, sequence_id = %sequence_id, "Move sequence configured");
        Ok(config)
    }
}

async fn find_row<C: ConnectionTrait>(conn: &C, company_id: CompanyId) -> Result<Option<configurations::Model>, DbErr> {
    configurations::Entity::find()
        .filter(configurations::Column::CompanyId.eq(company_id.uuid()))
        .one(conn)
        .await
}

async fn ensure_row<C: ConnectionTrait>(conn: &C, company_id: CompanyId) -> Result<configurations::Model, DbErr> {
    if let Some(row) = find_row(conn, company_id).await? {
        return Ok(row);
    }
    let now = chrono::Utc::now().into();
    configurations::ActiveModel {
        id: Set(Uuid::now_v7()),
        company_id: Set(company_id.uuid()),
        move_sequence_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

/// Builds the target configuration of a company; missing rows mean
/// defaults everywhere.
pub(crate) async fn load_configuration<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
) -> Result<TargetConfiguration, DbErr> {
    let mut config = TargetConfiguration::for_company(company_id);
    let Some(row) = find_row(conn, company_id).await? else {
        return Ok(config);
    };
    config.move_sequence_id = row.move_sequence_id.map(SequenceId::from);

    let targets = configuration_targets::Entity::find()
        .filter(configuration_targets::Column::ConfigurationId.eq(row.id))
        .all(conn)
        .await?;
    for target in targets {
        config.overrides.insert(target.metric.into(), target.value);
    }
    Ok(config)
}

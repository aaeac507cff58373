//! Company repository.
//!
//! Companies scope every other record. A company sees its own records and
//! those of its descendant companies.

use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait, FromQueryResult, Set,
    Statement,
};
use tmi_shared::types::{CompanyId, Digits};
use tracing::info;
use uuid::Uuid;

use crate::entities::companies;

/// Error types for company operations.
#[derive(Debug, thiserror::Error)]
pub enum CompanyError {
    /// Company not found.
    #[error("Company not found: {0}")]
    NotFound(CompanyId),

    /// Parent company not found.
    #[error("Parent company not found: {0}")]
    ParentNotFound(CompanyId),

    /// Stored currency precision is out of range.
    #[error("Invalid currency digits {0}")]
    InvalidDigits(i32),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a company.
#[derive(Debug, Clone)]
pub struct CreateCompanyInput {
    /// Company name.
    pub name: String,
    /// Parent company, if any.
    pub parent_id: Option<CompanyId>,
    /// ISO currency code.
    pub currency_code: String,
    /// Decimal digits of the currency.
    pub currency_digits: u32,
}

const VISIBLE_COMPANIES_SQL: &str = r"
WITH RECURSIVE visible AS (
    SELECT id FROM companies WHERE id = $1
    UNION
    SELECT c.id FROM companies c JOIN visible v ON c.parent_id = v.id
)
SELECT id FROM visible
";

/// Company repository.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent does not exist or the insert fails.
    pub async fn create(&self, input: CreateCompanyInput) -> Result<companies::Model, CompanyError> {
        if let Some(parent_id) = input.parent_id
            && self.find(parent_id).await?.is_none()
        {
            return Err(CompanyError::ParentNotFound(parent_id));
        }
        let digits = i32::try_from(input.currency_digits).map_err(|_| CompanyError::InvalidDigits(i32::MAX))?;

        let now = chrono::Utc::now().into();
        let company = companies::ActiveModel {
            id: Set(CompanyId::generate().uuid()),
            name: Set(input.name),
            parent_id: Set(input.parent_id.map(CompanyId::uuid)),
            currency_code: Set(input.currency_code),
            currency_digits: Set(digits),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(company_id = %company.id, name = %company.name, "Company created");
        Ok(company)
    }

    /// Finds a company by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, id: CompanyId) -> Result<Option<companies::Model>, CompanyError> {
        Ok(companies::Entity::find_by_id(id.uuid()).one(&self.db).await?)
    }

    /// Returns the company and all of its descendant companies.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn visible_companies(&self, id: CompanyId) -> Result<HashSet<CompanyId>, CompanyError> {
        visible_companies(&self.db, id).await.map_err(Into::into)
    }

    /// Decimal digits of the company currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the company does not exist or stores a negative
    /// precision.
    pub async fn currency_digits(&self, id: CompanyId) -> Result<Digits, CompanyError> {
        let company = self.find(id).await?.ok_or(CompanyError::NotFound(id))?;
        digits_of(&company)
    }
}

/// Precision recorded on a company row.
pub(crate) fn digits_of(company: &companies::Model) -> Result<Digits, CompanyError> {
    u32::try_from(company.currency_digits)
        .map(Digits)
        .map_err(|_| CompanyError::InvalidDigits(company.currency_digits))
}

/// Visible company set, runnable inside a transaction.
pub(crate) async fn visible_companies<C: ConnectionTrait>(
    conn: &C,
    id: CompanyId,
) -> Result<HashSet<CompanyId>, DbErr> {
    #[derive(Debug, FromQueryResult)]
    struct CompanyRow {
        id: Uuid,
    }

    let rows = CompanyRow::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        VISIBLE_COMPANIES_SQL,
        [id.uuid().into()],
    ))
    .all(conn)
    .await?;
    Ok(rows.into_iter().map(|r| CompanyId::from(r.id)).collect())
}

//! Application-wide error types.
//!
//! Module errors in `tmi-core` and repository errors in `tmi-db` are folded
//! into this shape at the edges (binaries, callers embedding the library).

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Record lookup failed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User-correctable input error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule violation (workflow, ordering, immutability).
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Conflict (e.g., a second move for the same church and period).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Contract violation between components.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns a stable machine-readable code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true when the caller can fix the problem by changing input.
    #[must_use]
    pub const fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Validation(_) | Self::BusinessRule(_) | Self::Conflict(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::NotFound(String::new()).error_code(), "NOT_FOUND");
        assert_eq!(AppError::Validation(String::new()).error_code(), "VALIDATION_ERROR");
        assert_eq!(
            AppError::BusinessRule(String::new()).error_code(),
            "BUSINESS_RULE_VIOLATION"
        );
        assert_eq!(AppError::Conflict(String::new()).error_code(), "CONFLICT");
        assert_eq!(AppError::Database(String::new()).error_code(), "DATABASE_ERROR");
        assert_eq!(AppError::Internal(String::new()).error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_user_correctable() {
        assert!(AppError::Validation("x".into()).is_user_correctable());
        assert!(AppError::Conflict("x".into()).is_user_correctable());
        assert!(!AppError::Database("x".into()).is_user_correctable());
        assert!(!AppError::Internal("x".into()).is_user_correctable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::NotFound("no year for 2024-01-01".into()).to_string(),
            "Not found: no year for 2024-01-01"
        );
        assert_eq!(
            AppError::BusinessRule("msg".into()).to_string(),
            "Business rule violation: msg"
        );
    }
}

//! Shared types, errors, and configuration for TMI.
//!
//! This crate provides the vocabulary every other crate speaks:
//! - Typed IDs for type-safe entity references
//! - Currency precision helpers (quantize, zero checks)
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

//! Repository Module
//!
//! Per-table CRUD as free functions over `&SqlitePool` (or an open
//! transaction where the caller owns atomicity). No business rules here;
//! the order core composes these inside its own transactions.

pub mod accounting;
pub mod catalog;
pub mod code;
pub mod currency;
pub mod dispatch_log;
pub mod order;
pub mod provider;
pub mod routing;
pub mod tenant;
pub mod user;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.to_string())
            }
            other => RepoError::Database(other.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

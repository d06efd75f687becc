//! Repository Module
//!
//! Free async functions over `&SqlitePool`, one file per table family.
//! Money travels as decimal TEXT, structured payloads as JSON TEXT.

pub mod leadership_level;
pub mod member;
pub mod rate_version;
pub mod sale;

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Keeps `IN (...)` lists well under SQLite's bound-parameter limit
const ID_CHUNK: usize = 500;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return RepoError::Duplicate(db_err.message().to_string());
        }
        RepoError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(err: serde_json::Error) -> Self {
        RepoError::Corrupt(format!("invalid JSON column: {err}"))
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

pub(crate) fn parse_decimal(column: &str, raw: &str) -> RepoResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| RepoError::Corrupt(format!("{column} = {raw:?}: {e}")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    /// In-memory pool with the real migrations applied.
    ///
    /// Single connection: every `sqlite::memory:` connection is its own database.
    pub async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }
}

//! Typed error enums for the storage layer.
//!
//! `StorageError` covers the assertion files and the history table.
//! `ExecutionError` covers running one assertion against the target database;
//! it is recorded per assertion and never aborts a batch.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to persist or read assertions or history records.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure (root not writable, unreadable file, failed rename).
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Assertion or table name that cannot be stored.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Assertion body rejected before persistence.
    #[error("invalid SQL: {0}")]
    InvalidSql(String),

    /// SQL / connection failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool exhausted or misconfigured.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Row data could not be mapped to a domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Whether this error is likely transient (worth retrying).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Pool(_) => true,
            Self::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Failure of a single assertion against the target database.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Statement did not compile against the target schema.
    #[error("failed to prepare statement: {0}")]
    Prepare(#[source] rusqlite::Error),

    /// Statement would modify the target database.
    #[error("statement is not read-only")]
    NotReadOnly,

    /// Statement failed while stepping through rows.
    #[error("query failed: {0}")]
    Query(#[source] rusqlite::Error),

    /// Result set has no verdict column.
    #[error("result has no `{column}` column (columns: {found:?})")]
    MissingVerdictColumn { column: &'static str, found: Vec<String> },

    /// A row carried something other than PASS or FAIL.
    #[error("row {row}: unexpected verdict {value}")]
    UnexpectedVerdict { row: usize, value: String },

    /// No connection available.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The assertion file could not be read.
    #[error("assertion file unreadable: {0}")]
    Unreadable(#[source] StorageError),

    /// The task executing the assertion panicked or was cancelled.
    #[error("execution task failed: {0}")]
    Task(String),
}

//! Storage seams used by the service layer.
//!
//! Both traits are synchronous; async callers run them on the blocking pool.

use std::fmt::{Display, Formatter, Result as FmtResult};

use dqbot_core::{AggregateRecord, PassRateRow, ReportQuery};

use crate::error::{ExecutionError, StorageError};

/// One cell of a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
        }
    }
}

/// Full result of one statement, rows in the order the database returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultSet {
    /// Index of `name`, compared ASCII case-insensitively.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }
}

/// SQL endpoint assertions are executed against.
pub trait TargetDatabase: Send + Sync {
    /// Runs a read statement and returns every row with its column names.
    fn execute(&self, sql: &str) -> Result<ResultSet, ExecutionError>;
}

/// Append-only store of aggregate records plus the reporting reads over it.
pub trait HistoryStore: Send + Sync {
    /// Appends one record, creating the history table on first use.
    fn append_record(&self, record: &AggregateRecord) -> Result<(), StorageError>;

    /// Pivoted pass rates per (assertion, run).
    fn pass_rates(&self, query: &ReportQuery) -> Result<Vec<PassRateRow>, StorageError>;

    /// Distinct assertion ids present in history, ascending.
    fn assertion_ids(&self) -> Result<Vec<String>, StorageError>;
}

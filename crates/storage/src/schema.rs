//! History table DDL and helpers.
//!
//! The history table lives in the target database, so the schema is created
//! with `IF NOT EXISTS` on first write instead of a versioned migration.

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::StorageError;

/// Rejects anything but `[A-Za-z_][A-Za-z0-9_]*`; the name is spliced into SQL.
pub(crate) fn validate_table_name(name: &str) -> Result<(), StorageError> {
    let mut chars = name.chars();
    let valid_start = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(StorageError::InvalidName(format!("table name {name:?}")))
    }
}

pub(crate) fn create_history_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
    sql_query_id TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    test_result TEXT NOT NULL CHECK(test_result IN ('PASS', 'FAIL')),
    count INTEGER NOT NULL CHECK(count >= 0)
);

CREATE INDEX IF NOT EXISTS idx_{table}_query_ts ON {table}(sql_query_id, timestamp);"
    )
}

pub(crate) fn ensure_history_table(conn: &Connection, table: &str) -> Result<(), StorageError> {
    conn.execute_batch(&create_history_table_sql(table))?;
    Ok(())
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> Result<bool, StorageError> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

//! `SQLite` target database with the history table alongside the checked data.

mod history;
mod target;

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use dqbot_core::DEFAULT_HISTORY_TABLE;

use crate::error::StorageError;
use crate::schema::validate_table_name;

/// Type alias for pooled connection
pub(crate) type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Pooled connection to the target database.
#[derive(Clone, Debug)]
pub struct Database {
    pub(crate) pool: Pool<SqliteConnectionManager>,
    pub(crate) history_table: String,
}

/// Concurrency settings applied to every pooled connection.
fn init_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA busy_timeout = 30000;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )
}

impl Database {
    /// Opens (or creates) the database file with the default history table name.
    ///
    /// # Errors
    /// Returns error if the pool cannot be built.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Self::open_with_history_table(path, DEFAULT_HISTORY_TABLE)
    }

    /// Opens the database, storing aggregate records in `history_table`.
    ///
    /// # Errors
    /// Returns `InvalidName` for a table name that is not a plain identifier,
    /// or a pool error if no connection can be established.
    pub fn open_with_history_table(path: &Path, history_table: &str) -> Result<Self, StorageError> {
        validate_table_name(history_table)?;
        let manager = SqliteConnectionManager::file(path).with_init(init_connection);
        let pool = Pool::builder().max_size(8).build(manager)?;
        tracing::debug!(path = %path.display(), history_table, "opened target database");
        Ok(Self { pool, history_table: history_table.to_owned() })
    }

    #[must_use]
    pub fn history_table(&self) -> &str {
        &self.history_table
    }

    pub(crate) fn conn(&self) -> Result<PooledConn, r2d2::Error> {
        self.pool.get()
    }

    /// Runs a batch of statements with write access, bypassing the read-only
    /// guard of [`TargetDatabase::execute`](crate::TargetDatabase::execute).
    ///
    /// # Errors
    /// Returns error if a connection cannot be acquired or a statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

//! Storage layer for dqbot
//!
//! - [`AssertionStore`]: one `.sql` file per named assertion.
//! - [`Database`]: pooled `SQLite` connection to the target database. It runs
//!   assertions ([`TargetDatabase`]) and owns the append-only history table
//!   ([`HistoryStore`]).

mod assertion_store;
mod database;
mod error;
mod schema;
pub mod traits;

pub use assertion_store::{AssertionStore, Listing};
pub use database::Database;
pub use error::{ExecutionError, StorageError};
pub use traits::{CellValue, HistoryStore, ResultSet, TargetDatabase};

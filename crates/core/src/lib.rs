//! Core types and helpers for dqbot
//!
//! This crate contains the domain types shared across all other crates:
//! conversation turns, stored assertions, verdicts, aggregate records and
//! pass rates, plus the SQL validator used to gate the save flow.

mod assertion;
pub mod constants;
mod conversation;
mod env_config;
mod error;
mod report;
pub mod sql;
mod text_utils;

pub use assertion::{AggregateRecord, StoredAssertion, Verdict, run_timestamp_now};
pub use constants::*;
pub use conversation::{Role, Turn};
pub use env_config::env_parse_with_default;
pub use error::{CoreError, Result};
pub use report::{PassRate, PassRateRow, ReportQuery, SortOrder};
pub use sql::{extract_sql, is_well_formed};
pub use text_utils::{slugify, truncate};

use std::result::Result as StdResult;

use thiserror::Error;

/// Errors raised by core domain helpers.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid SQL: {0}")]
    InvalidSql(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = StdResult<T, CoreError>;

//! SQL syntax validation and extraction of SQL from generated replies.
//!
//! Validation is purely syntactic: the text is parsed with the generic
//! `sqlparser` dialect and must yield exactly one statement. Nothing is
//! executed and no catalog is consulted, so unknown tables still validate.

use std::sync::LazyLock;

use regex::Regex;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::error::{CoreError, Result};

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static SQL_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)```sql\b(.*?)```").unwrap());

/// Returns `true` iff `text` parses as exactly one SQL statement.
#[must_use]
pub fn is_well_formed(text: &str) -> bool {
    validate(text).is_ok()
}

/// Parses `text` as a single SQL statement.
///
/// # Errors
/// Returns `CoreError::InvalidSql` with the parser message when the text is
/// empty, does not parse, or contains more than one statement.
pub fn validate(text: &str) -> Result<()> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidSql("empty statement".to_owned()));
    }
    let statements = Parser::parse_sql(&GenericDialect {}, trimmed)
        .map_err(|e| CoreError::InvalidSql(e.to_string()))?;
    match statements.len() {
        1 => Ok(()),
        0 => Err(CoreError::InvalidSql("no statement found".to_owned())),
        n => Err(CoreError::InvalidSql(format!("expected a single statement, found {n}"))),
    }
}

/// Pulls the SQL out of a generated reply.
///
/// Takes the body of the first ```` ```sql ```` block if present, otherwise
/// strips a bare ```` ``` ```` fence, otherwise returns the trimmed reply.
#[must_use]
pub fn extract_sql(reply: &str) -> &str {
    if let Some(body) = SQL_FENCE.captures(reply).and_then(|c| c.get(1)) {
        return body.as_str().trim();
    }
    let trimmed = reply.trim();
    if trimmed.len() >= 6 && trimmed.starts_with("```") && trimmed.ends_with("```") {
        let inner = trimmed.get(3..trimmed.len().saturating_sub(3)).unwrap_or(trimmed);
        // Drop a language tag on the opening fence line.
        return inner.split_once('\n').map_or(inner.trim(), |(_, rest)| rest.trim());
    }
    trimmed
}

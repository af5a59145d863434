//! Stored assertions, per-row verdicts and the aggregate records written to history.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A named SQL assertion as persisted in the assertion store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAssertion {
    pub name: String,
    pub body: String,
}

impl StoredAssertion {
    #[must_use]
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self { name: name.into(), body: body.into() }
    }
}

/// Verdict an assertion projects for each of its result rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    /// Labels in the order aggregate records are emitted.
    pub const ALL: [Self; 2] = [Self::Pass, Self::Fail];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = CoreError;

    /// Exact match only: `"PASS"` or `"FAIL"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PASS" => Ok(Self::Pass),
            "FAIL" => Ok(Self::Fail),
            other => Err(CoreError::InvalidInput(format!("not a verdict: {other:?}"))),
        }
    }
}

/// One history entry: how many rows of one assertion carried one verdict in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub assertion_name: String,
    pub run_timestamp: String,
    pub result_label: Verdict,
    pub count: u64,
}

/// Current time as the ISO-8601 text stored in the history table.
#[must_use]
pub fn run_timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_parse_is_exact() {
        assert_eq!("PASS".parse::<Verdict>().ok(), Some(Verdict::Pass));
        assert_eq!("FAIL".parse::<Verdict>().ok(), Some(Verdict::Fail));
        assert!("pass".parse::<Verdict>().is_err());
        assert!(" PASS".parse::<Verdict>().is_err());
        assert!("".parse::<Verdict>().is_err());
    }

    #[test]
    fn verdict_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Verdict::Fail).expect("serialize"), "\"FAIL\"");
    }

    #[test]
    fn run_timestamp_is_rfc3339() {
        let ts = run_timestamp_now();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok(), "bad timestamp {ts}");
        assert!(ts.ends_with('Z'));
    }
}

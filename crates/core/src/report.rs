//! Pass-rate reporting types.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Share of PASS rows for one assertion in one run.
///
/// Serialized as a JSON number, or `null` when the run produced no rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PassRate {
    Defined(f64),
    /// Both counts were zero, so the ratio has no value.
    Undefined,
}

impl PassRate {
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "row counts are far below 2^52")]
    pub fn from_counts(pass: u64, fail: u64) -> Self {
        let total = pass.saturating_add(fail);
        if total == 0 {
            Self::Undefined
        } else {
            Self::Defined(pass as f64 / total as f64)
        }
    }

    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        match *self {
            Self::Defined(v) => Some(v),
            Self::Undefined => None,
        }
    }
}

impl Serialize for PassRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::Defined(v) => serializer.serialize_f64(v),
            Self::Undefined => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for PassRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.map_or(Self::Undefined, Self::Defined))
    }
}

/// PASS and FAIL counts of one (assertion, run) pivoted into a single row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassRateRow {
    #[serde(rename = "sql_query_id")]
    pub assertion_name: String,
    #[serde(rename = "timestamp")]
    pub run_timestamp: String,
    #[serde(rename = "PASS")]
    pub pass_count: u64,
    #[serde(rename = "FAIL")]
    pub fail_count: u64,
    pub pass_rate: PassRate,
}

impl PassRateRow {
    #[must_use]
    pub fn new(assertion_name: String, run_timestamp: String, pass_count: u64, fail_count: u64) -> Self {
        Self {
            assertion_name,
            run_timestamp,
            pass_count,
            fail_count,
            pass_rate: PassRate::from_counts(pass_count, fail_count),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortOrder {
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match *self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(CoreError::InvalidInput(format!("unknown sort order: {other}"))),
        }
    }
}

/// Filter and ordering for pass-rate queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportQuery {
    /// Restrict to these assertion ids. `None` or an empty set means all.
    pub ids: Option<BTreeSet<String>>,
    pub order: SortOrder,
}

impl ReportQuery {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { ids: Some(ids.into_iter().map(Into::into).collect()), order: SortOrder::default() }
    }

    #[must_use]
    pub const fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// The id filter, or `None` when every assertion should be reported.
    #[must_use]
    pub fn id_filter(&self) -> Option<&BTreeSet<String>> {
        self.ids.as_ref().filter(|ids| !ids.is_empty())
    }
}

//! Request/query types (Deserialize)

use dqbot_core::{ReportQuery, SortOrder};
use serde::Deserialize;

use crate::api_error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Omit to open a new session.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Builds a report query from raw query pairs.
///
/// Accepts repeated `ids` (or `ids[]`) keys and an optional `order`
/// (`asc` / `desc`). Other keys are ignored.
pub fn report_query(pairs: &[(String, String)]) -> Result<ReportQuery, ApiError> {
    let mut ids = Vec::new();
    let mut order = SortOrder::default();
    for (key, value) in pairs {
        match key.as_str() {
            "ids" | "ids[]" => ids.push(value.clone()),
            "order" => order = value.parse().map_err(|e| ApiError::BadRequest(format!("{e}")))?,
            _ => {},
        }
    }
    let query = if ids.is_empty() { ReportQuery::all() } else { ReportQuery::with_ids(ids) };
    Ok(query.order(order))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[test]
    fn repeated_ids_collect() {
        let q = report_query(&pairs(&[("ids", "A"), ("ids[]", "B"), ("page", "2")])).unwrap();
        let ids: Vec<_> = q.id_filter().unwrap().iter().cloned().collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(q.order, SortOrder::Ascending);
    }

    #[test]
    fn no_ids_means_everything() {
        let q = report_query(&pairs(&[("order", "DESC")])).unwrap();
        assert!(q.id_filter().is_none());
        assert_eq!(q.order, SortOrder::Descending);
    }

    #[test]
    fn bad_order_is_rejected() {
        assert!(matches!(report_query(&pairs(&[("order", "sideways")])), Err(ApiError::BadRequest(_))));
    }
}

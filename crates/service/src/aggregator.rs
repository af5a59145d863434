//! Folds per-row verdicts into history records.

use std::collections::BTreeMap;
use std::sync::Arc;

use dqbot_core::{AggregateRecord, Verdict};
use dqbot_storage::HistoryStore;

use crate::error::AggregationError;

/// Counts verdicts per assertion.
///
/// Emits exactly one PASS and one FAIL record per assertion (zero-filled),
/// assertions in name order.
#[must_use]
pub fn tally(outcomes: &BTreeMap<String, Vec<Verdict>>, run_timestamp: &str) -> Vec<AggregateRecord> {
    outcomes
        .iter()
        .flat_map(|(name, verdicts)| {
            Verdict::ALL.into_iter().map(move |label| AggregateRecord {
                assertion_name: name.clone(),
                run_timestamp: run_timestamp.to_owned(),
                result_label: label,
                count: verdicts.iter().filter(|v| **v == label).count() as u64,
            })
        })
        .collect()
}

pub struct Aggregator {
    history: Arc<dyn HistoryStore>,
}

impl Aggregator {
    #[must_use]
    pub fn new(history: Arc<dyn HistoryStore>) -> Self {
        Self { history }
    }

    /// Tallies `outcomes` and appends the records to history.
    pub async fn aggregate(
        &self,
        outcomes: &BTreeMap<String, Vec<Verdict>>,
        run_timestamp: &str,
    ) -> Result<Vec<AggregateRecord>, AggregationError> {
        self.append_all(tally(outcomes, run_timestamp)).await
    }

    /// Appends records one at a time. Nothing is rolled back on failure;
    /// the error says how many made it.
    pub async fn append_all(
        &self,
        records: Vec<AggregateRecord>,
    ) -> Result<Vec<AggregateRecord>, AggregationError> {
        let history = Arc::clone(&self.history);
        tokio::task::spawn_blocking(move || {
            let total = records.len();
            for (written, record) in records.iter().enumerate() {
                history
                    .append_record(record)
                    .map_err(|source| AggregationError::Append { written, total, source })?;
            }
            tracing::info!(records = total, "history updated");
            Ok(records)
        })
        .await
        .map_err(|e| AggregationError::Task(e.to_string()))?
    }
}

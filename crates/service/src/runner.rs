//! Batch execution of every stored assertion.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use dqbot_core::{DEFAULT_MAX_PARALLEL_TESTS, VERDICT_COLUMN, Verdict, run_timestamp_now};
use dqbot_storage::{AssertionStore, CellValue, ExecutionError, Listing, ResultSet, TargetDatabase};
use tokio::sync::Semaphore;

use crate::blocking::blocking;
use crate::error::ServiceError;

/// Verdicts and failures of one `run_all` invocation.
#[derive(Debug)]
pub struct RunOutcome {
    /// Shared by every assertion in the run.
    pub run_timestamp: String,
    /// Per-row verdicts of assertions that executed cleanly.
    pub outcomes: BTreeMap<String, Vec<Verdict>>,
    /// Assertions that failed; they contribute no records. Unreadable files
    /// are keyed by file stem.
    pub errors: BTreeMap<String, ExecutionError>,
}

impl RunOutcome {
    #[must_use]
    pub fn assertions_run(&self) -> usize {
        self.outcomes.len() + self.errors.len()
    }
}

/// Maps every result row to its verdict.
///
/// # Errors
/// `MissingVerdictColumn` when no `test_result` column exists (any case),
/// `UnexpectedVerdict` for the first row whose value is not exactly
/// `PASS` or `FAIL`.
pub fn classify(result: &ResultSet) -> Result<Vec<Verdict>, ExecutionError> {
    let idx = result.column_index(VERDICT_COLUMN).ok_or_else(|| {
        ExecutionError::MissingVerdictColumn {
            column: VERDICT_COLUMN,
            found: result.columns.clone(),
        }
    })?;

    result
        .rows
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let cell = cells.get(idx);
            cell.and_then(CellValue::as_text)
                .and_then(|text| text.parse::<Verdict>().ok())
                .ok_or_else(|| ExecutionError::UnexpectedVerdict {
                    row,
                    value: cell.map_or_else(|| "<missing>".to_owned(), ToString::to_string),
                })
        })
        .collect()
}

pub struct TestRunner {
    store: AssertionStore,
    max_parallel: usize,
}

impl TestRunner {
    #[must_use]
    pub const fn new(store: AssertionStore) -> Self {
        Self { store, max_parallel: DEFAULT_MAX_PARALLEL_TESTS }
    }

    /// Caps how many assertions execute at once (at least one).
    #[must_use]
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    #[must_use]
    pub const fn store(&self) -> &AssertionStore {
        &self.store
    }

    /// Executes every stored assertion against `target` under one timestamp.
    ///
    /// A failing, panicking or unreadable assertion is recorded in `errors`
    /// and never stops its siblings. If two files carry the same name only
    /// the first (by file name) runs.
    pub async fn run_all(&self, target: Arc<dyn TargetDatabase>) -> Result<RunOutcome, ServiceError> {
        let store = self.store.clone();
        let Listing { assertions, unreadable } = blocking(move || Ok(store.scan()?)).await?;
        let run_timestamp = run_timestamp_now();
        tracing::info!(
            count = assertions.len(),
            unreadable = unreadable.len(),
            %run_timestamp,
            "running assertions"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut seen = BTreeSet::new();
        let mut handles = Vec::with_capacity(assertions.len());
        for assertion in assertions {
            if !seen.insert(assertion.name.clone()) {
                tracing::warn!(name = %assertion.name, "duplicate assertion name, skipping");
                continue;
            }
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| ServiceError::Task(e.to_string()))?;
            let target = Arc::clone(&target);
            let body = assertion.body;
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                classify(&target.execute(&body)?)
            });
            handles.push((assertion.name, handle));
        }

        let mut outcomes = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for (stem, e) in unreadable {
            tracing::warn!(%stem, error = %e, "assertion file unreadable");
            errors.insert(stem, ExecutionError::Unreadable(e));
        }
        for (name, handle) in handles {
            let result = handle.await.unwrap_or_else(|e| Err(ExecutionError::Task(e.to_string())));
            match result {
                Ok(verdicts) => {
                    tracing::debug!(%name, rows = verdicts.len(), "assertion executed");
                    outcomes.insert(name, verdicts);
                },
                Err(e) => {
                    tracing::warn!(%name, error = %e, "assertion failed");
                    errors.insert(name, e);
                },
            }
        }

        tracing::info!(ok = outcomes.len(), failed = errors.len(), "run finished");
        Ok(RunOutcome { run_timestamp, outcomes, errors })
    }
}

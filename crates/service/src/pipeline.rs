//! One full run: execute every assertion, then append the tallies to history.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use dqbot_core::AggregateRecord;
use dqbot_storage::{AssertionStore, Database, HistoryStore, TargetDatabase};
use serde::Serialize;

use crate::aggregator::{Aggregator, tally};
use crate::error::ServiceError;
use crate::runner::TestRunner;

/// What a run did, in a form the chat, HTTP and CLI surfaces can show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_timestamp: String,
    pub assertions_run: usize,
    /// Tally of the assertions that executed cleanly.
    pub records: Vec<AggregateRecord>,
    pub records_written: usize,
    /// Rendered per-assertion execution failures.
    pub execution_errors: BTreeMap<String, String>,
    pub aggregation_error: Option<String>,
    /// Set when nothing ran at all (the assertions could not be listed).
    pub failure: Option<String>,
}

impl RunReport {
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self { failure: Some(reason.into()), ..Self::default() }
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failure.is_none() && self.aggregation_error.is_none() && self.execution_errors.is_empty()
    }

    /// Multi-line human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if let Some(reason) = &self.failure {
            return format!("Test run failed: {reason}");
        }
        let mut out = format!(
            "Ran {} test(s) at {}; {} record(s) written.",
            self.assertions_run, self.run_timestamp, self.records_written
        );
        for pair in self.records.chunks(2) {
            if let [pass, fail] = pair {
                let _ = write!(out, "\n  {}: {} PASS, {} FAIL", pass.assertion_name, pass.count, fail.count);
            }
        }
        for (name, error) in &self.execution_errors {
            let _ = write!(out, "\n  {name}: error: {error}");
        }
        if let Some(error) = &self.aggregation_error {
            let _ = write!(out, "\n  history not fully updated: {error}");
        }
        out
    }
}

pub struct RunPipeline {
    runner: TestRunner,
    aggregator: Aggregator,
    target: Arc<dyn TargetDatabase>,
}

impl RunPipeline {
    #[must_use]
    pub fn new(runner: TestRunner, aggregator: Aggregator, target: Arc<dyn TargetDatabase>) -> Self {
        Self { runner, aggregator, target }
    }

    /// Pipeline whose assertions run against `db` and whose history lives in it.
    #[must_use]
    pub fn for_database(store: AssertionStore, db: Arc<Database>, max_parallel: usize) -> Self {
        let runner = TestRunner::new(store).with_max_parallel(max_parallel);
        let aggregator = Aggregator::new(Arc::clone(&db) as Arc<dyn HistoryStore>);
        Self::new(runner, aggregator, db)
    }

    /// Runs every stored assertion and records the results.
    ///
    /// Per-assertion and aggregation failures are carried in the report;
    /// only a failure to list the assertions is an error.
    pub async fn run(&self) -> Result<RunReport, ServiceError> {
        let outcome = self.runner.run_all(Arc::clone(&self.target)).await?;
        let records = tally(&outcome.outcomes, &outcome.run_timestamp);

        let (records_written, aggregation_error) = match self.aggregator.append_all(records.clone()).await {
            Ok(written) => (written.len(), None),
            Err(e) => {
                tracing::warn!(error = %e, "aggregation incomplete");
                (e.written(), Some(e.to_string()))
            },
        };

        Ok(RunReport {
            assertions_run: outcome.assertions_run(),
            run_timestamp: outcome.run_timestamp,
            records,
            records_written,
            execution_errors: outcome.errors.into_iter().map(|(name, e)| (name, e.to_string())).collect(),
            aggregation_error,
            failure: None,
        })
    }

    /// Like [`run`](Self::run), folding a run-level failure into the report.
    pub async fn run_reported(&self) -> RunReport {
        match self.run().await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "test run failed");
                RunReport::failed(e.to_string())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use dqbot_core::{PassRate, ReportQuery, Verdict};
    use tempfile::TempDir;

    use super::*;

    fn setup() -> (TempDir, AssertionStore, Arc<Database>) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("crm.db")).unwrap();
        db.execute_batch(
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, amount REAL);
             INSERT INTO orders (id, amount) VALUES (1, 10.0), (2, -3.0), (3, 7.5), (4, 1.0);",
        )
        .unwrap();
        let store = AssertionStore::new(dir.path().join("tests"));
        (dir, store, Arc::new(db))
    }

    #[tokio::test]
    async fn run_writes_two_records_per_clean_assertion() {
        let (_dir, store, db) = setup();
        store
            .save(
                "positive amounts",
                "SELECT id, CASE WHEN amount > 0 THEN 'PASS' ELSE 'FAIL' END AS test_result FROM orders",
            )
            .unwrap();
        store.save("bad", "SELECT FROM nowhere").unwrap();

        let pipeline = RunPipeline::for_database(store, Arc::clone(&db), 2);
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.assertions_run, 2);
        assert_eq!(report.records_written, 2);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].result_label, Verdict::Pass);
        assert_eq!(report.records[0].count, 3);
        assert!(report.execution_errors.contains_key("bad"));
        assert!(!report.is_clean());

        let rows = db.pass_rates(&ReportQuery::all()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pass_rate, PassRate::Defined(0.75));
        assert_eq!(rows[0].run_timestamp, report.run_timestamp);
    }

    #[test]
    fn summary_lists_counts_and_errors() {
        let report = RunReport {
            run_timestamp: "T".to_owned(),
            assertions_run: 2,
            records: tally(
                &[("a".to_owned(), vec![Verdict::Pass, Verdict::Fail])].into_iter().collect(),
                "T",
            ),
            records_written: 2,
            execution_errors: [("b".to_owned(), "boom".to_owned())].into_iter().collect(),
            aggregation_error: None,
            failure: None,
        };
        let text = report.summary();
        assert!(text.contains("Ran 2 test(s) at T"));
        assert!(text.contains("a: 1 PASS, 1 FAIL"));
        assert!(text.contains("b: error: boom"));
    }

    #[tokio::test]
    async fn unreadable_store_is_reported() {
        let (dir, _store, db) = setup();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let pipeline = RunPipeline::for_database(AssertionStore::new(blocker.clone()), db, 1);

        assert!(pipeline.run().await.is_err());
        let report = pipeline.run_reported().await;
        assert!(report.failure.is_some());
        assert!(report.summary().starts_with("Test run failed"));
    }
}

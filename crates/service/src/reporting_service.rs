use std::sync::Arc;

use dqbot_core::{PassRateRow, ReportQuery};
use dqbot_storage::HistoryStore;

use crate::blocking::blocking;
use crate::error::ServiceError;

/// Read side of the history table.
pub struct ReportingService {
    history: Arc<dyn HistoryStore>,
}

impl ReportingService {
    #[must_use]
    pub fn new(history: Arc<dyn HistoryStore>) -> Self {
        Self { history }
    }

    pub async fn pass_rates(&self, query: ReportQuery) -> Result<Vec<PassRateRow>, ServiceError> {
        let history = Arc::clone(&self.history);
        blocking(move || Ok(history.pass_rates(&query)?)).await
    }

    pub async fn assertion_ids(&self) -> Result<Vec<String>, ServiceError> {
        let history = Arc::clone(&self.history);
        blocking(move || Ok(history.assertion_ids()?)).await
    }
}

#[cfg(test)]
mod tests {
    use dqbot_core::{AggregateRecord, PassRate, SortOrder, Verdict};
    use dqbot_storage::Database;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn reads_through_to_history() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(Database::open(&dir.path().join("h.db")).unwrap());
        for (name, ts, label, count) in [
            ("A", "t1", Verdict::Pass, 1),
            ("A", "t1", Verdict::Fail, 1),
            ("B", "t1", Verdict::Pass, 0),
            ("B", "t1", Verdict::Fail, 0),
        ] {
            db.append_record(&AggregateRecord {
                assertion_name: name.to_owned(),
                run_timestamp: ts.to_owned(),
                result_label: label,
                count,
            })
            .unwrap();
        }
        let service = ReportingService::new(db);

        assert_eq!(service.assertion_ids().await.unwrap(), vec!["A", "B"]);

        let rows = service.pass_rates(ReportQuery::all().order(SortOrder::Descending)).await.unwrap();
        assert_eq!(rows[0].assertion_name, "B");
        assert_eq!(rows[0].pass_rate, PassRate::Undefined);
        assert_eq!(rows[1].pass_rate, PassRate::Defined(0.5));

        let only_a = service.pass_rates(ReportQuery::with_ids(["A"])).await.unwrap();
        assert_eq!(only_a.len(), 1);
    }
}

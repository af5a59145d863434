use dqbot_core::{AggregateRecord, PassRateRow, ReportQuery};
use rusqlite::{params, params_from_iter};

use super::Database;
use crate::error::StorageError;
use crate::schema::{ensure_history_table, table_exists};
use crate::traits::HistoryStore;

fn to_count(raw: i64, context: &str) -> Result<u64, StorageError> {
    u64::try_from(raw).map_err(|_| StorageError::DataCorruption(format!("negative count {raw} for {context}")))
}

impl HistoryStore for Database {
    fn append_record(&self, record: &AggregateRecord) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let table = &self.history_table;
        ensure_history_table(&conn, table)?;
        let count = i64::try_from(record.count).map_err(|_| {
            StorageError::DataCorruption(format!("count {} does not fit in INTEGER", record.count))
        })?;
        conn.execute(
            &format!(
                "INSERT INTO {table} (sql_query_id, timestamp, test_result, count)
                 VALUES (?1, ?2, ?3, ?4)"
            ),
            params![record.assertion_name, record.run_timestamp, record.result_label.as_str(), count],
        )?;
        Ok(())
    }

    /// Exact-duplicate records (a replayed aggregation) are collapsed before
    /// counts are summed, then PASS and FAIL are pivoted into one row.
    fn pass_rates(&self, query: &ReportQuery) -> Result<Vec<PassRateRow>, StorageError> {
        let conn = self.conn()?;
        let table = &self.history_table;
        if !table_exists(&conn, table)? {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> =
            query.id_filter().map(|set| set.iter().map(String::as_str).collect()).unwrap_or_default();
        let filter = if ids.is_empty() {
            String::new()
        } else {
            let placeholders = vec!["?"; ids.len()].join(", ");
            format!("WHERE sql_query_id IN ({placeholders})")
        };
        let order = query.order.as_sql();

        let sql = format!(
            "SELECT sql_query_id, timestamp,
                    CAST(SUM(CASE WHEN test_result = 'PASS' THEN count ELSE 0 END) AS INTEGER),
                    CAST(SUM(CASE WHEN test_result = 'FAIL' THEN count ELSE 0 END) AS INTEGER)
             FROM (SELECT DISTINCT sql_query_id, timestamp, test_result, count FROM {table} {filter})
             GROUP BY sql_query_id, timestamp
             ORDER BY sql_query_id {order}, timestamp {order}"
        );

        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params_from_iter(ids.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(name, ts, pass, fail)| {
                let context = format!("{name} @ {ts}");
                Ok(PassRateRow::new(name, ts, to_count(pass, &context)?, to_count(fail, &context)?))
            })
            .collect()
    }

    fn assertion_ids(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.conn()?;
        let table = &self.history_table;
        if !table_exists(&conn, table)? {
            return Ok(Vec::new());
        }
        let mut stmt =
            conn.prepare(&format!("SELECT DISTINCT sql_query_id FROM {table} ORDER BY sql_query_id"))?;
        let ids = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

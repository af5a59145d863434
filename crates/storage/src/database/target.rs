use rusqlite::types::ValueRef;

use super::Database;
use crate::error::ExecutionError;
use crate::traits::{CellValue, ResultSet, TargetDatabase};

fn to_cell(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(v) => CellValue::Integer(v),
        ValueRef::Real(v) => CellValue::Real(v),
        ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Blob(bytes.to_vec()),
    }
}

impl TargetDatabase for Database {
    fn execute(&self, sql: &str) -> Result<ResultSet, ExecutionError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(ExecutionError::Prepare)?;
        if !stmt.readonly() {
            return Err(ExecutionError::NotReadOnly);
        }
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
        let width = columns.len();

        let mut rows = stmt.query([]).map_err(ExecutionError::Query)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(ExecutionError::Query)? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(to_cell(row.get_ref(idx).map_err(ExecutionError::Query)?));
            }
            out.push(cells);
        }
        Ok(ResultSet { columns, rows: out })
    }
}

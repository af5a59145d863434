use std::sync::Arc;

use anyhow::Result;
use dqbot_core::{ReportQuery, SortOrder};
use dqbot_service::ReportingService;
use dqbot_storage::HistoryStore;

use crate::{assertion_store, open_database};

pub(crate) async fn run_report(ids: Vec<String>, desc: bool) -> Result<()> {
    let db = open_database()?;
    let reporting = ReportingService::new(db as Arc<dyn HistoryStore>);
    let order = if desc { SortOrder::Descending } else { SortOrder::Ascending };
    let rows = reporting.pass_rates(ReportQuery::with_ids(ids).order(order)).await?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

pub(crate) fn run_list() -> Result<()> {
    let assertions = assertion_store().list()?;
    println!("{}", serde_json::to_string_pretty(&assertions)?);
    Ok(())
}

use std::time::Duration;

use anyhow::Result;
use dqbot_http::start_scheduled_runs;

use crate::{assertion_store, build_pipeline, open_database};

pub(crate) async fn run(every: Option<u64>, json: bool) -> Result<()> {
    let pipeline = build_pipeline(assertion_store(), open_database()?);

    if let Some(secs) = every.filter(|secs| *secs > 0) {
        tracing::info!("Running all tests every {secs}s, Ctrl-C to stop");
        let scheduler = start_scheduled_runs(pipeline, Duration::from_secs(secs));
        tokio::signal::ctrl_c().await?;
        scheduler.abort();
        return Ok(());
    }

    let report = pipeline.run().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary());
    }
    Ok(())
}

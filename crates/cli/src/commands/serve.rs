use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dqbot_core::{DEFAULT_SESSION_IDLE_SECS, env_parse_with_default};
use dqbot_http::{AppState, SessionRegistry, create_router, start_scheduled_runs, start_session_sweeper};
use dqbot_service::ReportingService;
use dqbot_storage::HistoryStore;

use crate::{assertion_store, build_gateway, build_pipeline, open_database, session_prompt};

pub(crate) async fn run(port: u16, host: String, schedule_secs: Option<u64>) -> Result<()> {
    let db = open_database()?;
    let store = assertion_store();
    let pipeline = build_pipeline(store.clone(), Arc::clone(&db));
    let gateway = build_gateway(store.clone(), Arc::clone(&pipeline))?;
    let idle = Duration::from_secs(env_parse_with_default("DQBOT_SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS).max(1));

    let state = Arc::new(AppState {
        gateway: Arc::new(gateway),
        sessions: SessionRegistry::new(session_prompt()).with_idle_ttl(idle),
        pipeline: Arc::clone(&pipeline),
        reporting: ReportingService::new(db as Arc<dyn HistoryStore>),
        store,
    });

    let _scheduler = schedule_secs.filter(|secs| *secs > 0).map(|secs| {
        tracing::info!("Scheduled runs every {secs}s");
        start_scheduled_runs(pipeline, Duration::from_secs(secs))
    });

    let _sweeper = start_session_sweeper(Arc::clone(&state), idle.min(Duration::from_secs(60)));

    let router = create_router(state);
    let addr = format!("{host}:{port}");
    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

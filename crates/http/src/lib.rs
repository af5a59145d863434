//! HTTP API server for dqbot.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(unreachable_pub, reason = "pub items are re-exported")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::min_ident_chars, reason = "Short closure params are idiomatic")]
#![allow(clippy::shadow_reuse, reason = "Shadowing for Arc clones is idiomatic")]

pub mod api_error;
mod blocking;
mod handlers;
mod query_types;
mod response_types;
mod session_registry;
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    routing::{delete, get, post},
};
use dqbot_service::{ConversationGateway, ReportingService, RunPipeline};
use dqbot_storage::AssertionStore;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use response_types::{ChatResponse, VersionResponse};
pub use session_registry::SessionRegistry;

/// Spawns a background task that runs every stored assertion every `every`.
///
/// The first run starts immediately. Errors are logged and the loop carries
/// on with the next tick.
pub fn start_scheduled_runs(pipeline: Arc<RunPipeline>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            tracing::debug!("scheduled run starting");
            let pipeline = Arc::clone(&pipeline);
            let result = tokio::spawn(async move { pipeline.run().await }).await;
            match result {
                Ok(Ok(report)) => {
                    tracing::info!(
                        assertions = report.assertions_run,
                        records = report.records_written,
                        failed = report.execution_errors.len(),
                        "scheduled run finished"
                    );
                },
                Ok(Err(e)) => {
                    tracing::warn!("scheduled run error: {e}");
                },
                Err(e) => {
                    tracing::warn!("scheduled run panic: {e:?}");
                },
            }
        }
    })
}

/// Spawns a background task that evicts idle chat sessions every `every`.
pub fn start_session_sweeper(state: Arc<AppState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let evicted = state.sessions.evict_idle().await;
            if evicted > 0 {
                let remaining = state.sessions.count().await;
                tracing::info!(evicted, remaining, "idle chat sessions evicted");
            }
        }
    })
}

/// Shared application state for all HTTP handlers.
pub struct AppState {
    /// Save flow shared by every chat session
    pub gateway: Arc<ConversationGateway>,
    /// Live chat sessions
    pub sessions: SessionRegistry,
    /// Full run (execute + aggregate)
    pub pipeline: Arc<RunPipeline>,
    /// History reads
    pub reporting: ReportingService,
    /// Stored assertions
    pub store: AssertionStore,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/version", get(version))
        .route("/chat", post(handlers::chat::chat))
        .route("/chat/{session_id}", delete(handlers::chat::end_chat))
        .route("/api/ids", get(handlers::reports::get_ids))
        .route("/api/data", get(handlers::reports::get_data))
        .route("/api/assertions", get(handlers::assertions::list_assertions))
        .route("/api/run", post(handlers::assertions::run_now))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse { version: env!("CARGO_PKG_VERSION") })
}

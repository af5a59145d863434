use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use dqbot_core::StoredAssertion;
use dqbot_service::RunReport;

use crate::AppState;
use crate::api_error::ApiError;
use crate::blocking::blocking_json;

pub async fn list_assertions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StoredAssertion>>, ApiError> {
    let store = state.store.clone();
    blocking_json(move || Ok(store.list()?)).await
}

pub async fn run_now(State(state): State<Arc<AppState>>) -> Result<Json<RunReport>, ApiError> {
    Ok(Json(state.pipeline.run().await?))
}

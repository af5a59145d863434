use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use dqbot_core::PassRateRow;

use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::report_query;

pub async fn get_ids(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.reporting.assertion_ids().await?))
}

/// `GET /api/data?ids=A&ids=B&order=desc`
pub async fn get_data(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<PassRateRow>>, ApiError> {
    let query = report_query(&pairs)?;
    Ok(Json(state.reporting.pass_rates(query).await?))
}

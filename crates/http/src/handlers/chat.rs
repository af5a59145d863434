use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use dqbot_service::TurnReply;

use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::ChatRequest;
use crate::response_types::{ChatResponse, SessionDeleteResponse};

/// One chat turn. Opens a session when `session_id` is absent and closes it
/// when the operator exits. A session opened by a failed turn is discarded.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_owned()));
    }
    let opened = req.session_id.is_none();
    let (session_id, session) = match req.session_id {
        Some(id) => {
            let session = state
                .sessions
                .get(&id)
                .await
                .ok_or_else(|| ApiError::NotFound(format!("chat session '{id}' not found")))?;
            (id, session)
        },
        None => state.sessions.create().await,
    };

    let mut guard = session.lock().await;
    let result = state.gateway.handle_turn(&mut guard, &req.message).await;
    let current = guard.state();
    drop(guard);

    let reply = match result {
        Ok(reply) => reply,
        Err(e) => {
            // id was never returned to the client
            if opened {
                state.sessions.remove(&session_id).await;
            }
            return Err(e.into());
        },
    };

    if matches!(reply, TurnReply::Exit) {
        state.sessions.remove(&session_id).await;
    }
    Ok(Json(ChatResponse { session_id, kind: reply.kind(), response: reply.message(), state: current }))
}

pub async fn end_chat(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionDeleteResponse>, ApiError> {
    if state.sessions.remove(&session_id).await {
        Ok(Json(SessionDeleteResponse { deleted: true, session_id }))
    } else {
        Err(ApiError::NotFound(format!("chat session '{session_id}' not found")))
    }
}

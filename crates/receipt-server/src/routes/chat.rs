//! Receipt chat endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::StatusResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for a chat question.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Answer a question about stored receipts.
/// POST /ai/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    if request.query.trim().is_empty() {
        return Err(ApiError::validation("query must not be empty"));
    }

    let response = state.assistant.ask(&request.query).await?;
    Ok(Json(ChatResponse { response }))
}

/// Forget the conversation so far.
/// POST /ai/chat/clear
pub async fn clear_history(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    state.history.clear().await;
    info!("Chat history cleared");
    Ok(Json(StatusResponse::success(
        "Chat history cleared successfully",
    )))
}

//! Route definitions for the REST API.

mod chat;
mod health;
mod receipts;

use axum::{
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::state::AppState;

/// Body of endpoints that only acknowledge success.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Receipts
        .route("/process-receipt", post(receipts::process_receipt))
        .route("/receipts/store", post(receipts::store_receipt))
        // Chat
        .route("/ai/chat", post(chat::chat))
        .route("/ai/chat/clear", post(chat::clear_history))
        // Attach state
        .with_state(state)
}

//! Error handling for the REST API server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use receipt_assistant::AssistantError;
use receipt_core::ReceiptError;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            detail: self.message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<ReceiptError> for ApiError {
    fn from(err: ReceiptError) -> Self {
        let code = match err {
            ReceiptError::Decode(_) => "DECODE_ERROR",
            ReceiptError::Ocr(_) => "RECOGNITION_ERROR",
            ReceiptError::Io(_) | ReceiptError::Config(_) => "INTERNAL_ERROR",
        };
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, err.to_string())
    }
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::Store(msg) => ApiError::internal(format!("Document store error: {}", msg)),
            AssistantError::Completion(msg) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "COMPLETION_ERROR", msg)
            }
            AssistantError::Http(e) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "COMPLETION_ERROR", e.to_string())
            }
            AssistantError::Config(msg) => ApiError::internal(msg),
        }
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

//! receipt-server - REST API server for receipt processing.
//!
//! Exposes the receipt pipeline and the receipt chat assistant over HTTP.
//!
//! # Example
//!
//! ```ignore
//! use receipt_core::ReceiptConfig;
//! use receipt_server::{create_server, AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let state = AppState::from_config(&ReceiptConfig::default())?;
//!     let app = create_server(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8006").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, DynProcessor};

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use pretty_assertions::assert_eq;
    use receipt_assistant::{ChatMessage, CompletionOptions, CompletionService, InMemoryDocumentStore};
    use receipt_core::{OcrError, ReceiptConfig, ReceiptProcessor, TextRecognizer};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Returns fixed text without running an OCR engine.
    struct CannedRecognizer(&'static str);

    impl TextRecognizer for CannedRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    /// Holds the blocking pool longer than the request timeout.
    struct SlowRecognizer;

    impl TextRecognizer for SlowRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok("Total: 1.00".to_string())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    /// Replies with the length of the system prompt.
    struct EchoCompletion;

    #[async_trait]
    impl CompletionService for EchoCompletion {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _options: CompletionOptions,
        ) -> receipt_assistant::Result<String> {
            Ok(format!("echo: {}", messages[0].content.len()))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn app() -> Router {
        let config = ReceiptConfig::default();
        let recognizer: Box<dyn TextRecognizer> = Box::new(CannedRecognizer(
            "ACME STORE\nDate: 01/02/2023\nCoffee 3.50\nTotal: 3.50",
        ));
        let processor: DynProcessor = ReceiptProcessor::new(recognizer);
        let state = AppState::new(
            processor,
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(EchoCompletion),
            &config,
        );
        create_server(state)
    }

    fn png_base64() -> String {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([255, 255, 255])))
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        STANDARD.encode(bytes.into_inner())
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_process_receipt() {
        let (status, body) =
            post_json(app(), "/process-receipt", json!({ "image": png_base64() })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["vendor_name"], "ACME STORE");
        assert_eq!(body["date"], "2023-01-02");
        assert_eq!(body["total_amount"], json!(3.5));
    }

    #[tokio::test]
    async fn test_malformed_image_is_server_error() {
        let (status, body) =
            post_json(app(), "/process-receipt", json!({ "image": "%%%not-base64" })).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "DECODE_ERROR");
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Error processing receipt:"));
    }

    #[tokio::test]
    async fn test_slow_recognition_times_out() {
        let recognizer: Box<dyn TextRecognizer> = Box::new(SlowRecognizer);
        let mut state = AppState::new(
            ReceiptProcessor::new(recognizer),
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(EchoCompletion),
            &ReceiptConfig::default(),
        );
        state.ocr_timeout = Some(Duration::from_millis(50));

        let (status, body) = post_json(
            create_server(state),
            "/process-receipt",
            json!({ "image": png_base64() }),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "RECOGNITION_ERROR");
        assert!(body["detail"].as_str().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_missing_field_is_client_error() {
        let (status, _) = post_json(app(), "/process-receipt", json!({ "img": "x" })).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_store_chat_and_clear() {
        let app = app();

        let (status, body) = post_json(
            app.clone(),
            "/receipts/store",
            json!({
                "title": "ACME STORE",
                "total": 3.5,
                "date": "2023-01-02",
                "items": [{ "name": "Coffee", "price": 3.5 }],
                "raw_text": "ACME STORE"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "status": "success", "message": "Receipt stored successfully" })
        );

        let (status, body) =
            post_json(app.clone(), "/ai/chat", json!({ "query": "acme coffee" })).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["response"].as_str().unwrap().starts_with("echo: "));

        let (status, body) = post_json(app.clone(), "/ai/chat/clear", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Chat history cleared successfully");
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let (status, body) = post_json(app(), "/ai/chat", json!({ "query": "  " })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

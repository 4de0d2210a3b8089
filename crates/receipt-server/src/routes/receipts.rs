//! Receipt processing and storage endpoints.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::{debug, error, info};

use receipt_assistant::ReceiptRecord;
use receipt_core::{OcrError, ReceiptError, ReceiptFields};

use super::StatusResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body carrying a base64 image.
#[derive(Debug, Deserialize)]
pub struct ProcessReceiptRequest {
    pub image: String,
}

/// Extract fields from a receipt image.
/// POST /process-receipt
pub async fn process_receipt(
    State(state): State<AppState>,
    Json(request): Json<ProcessReceiptRequest>,
) -> ApiResult<Json<ReceiptFields>> {
    let processor = state.processor.clone();
    let task = tokio::task::spawn_blocking(move || processor.process_base64(&request.image));

    let joined = match state.ocr_timeout {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                let err = ReceiptError::from(OcrError::Timeout(limit.as_secs()));
                debug!("Abandoning recognition task; it runs to completion on the blocking pool");
                error!("{}", err);
                return Err(err.into());
            }
        },
        None => task.await,
    };

    let fields = joined
        .map_err(|e| ApiError::internal(format!("processing task failed: {}", e)))?
        .inspect_err(|e| error!("{}", e))?;

    Ok(Json(fields))
}

/// Store a receipt so the assistant can answer questions about it.
/// POST /receipts/store
pub async fn store_receipt(
    State(state): State<AppState>,
    Json(receipt): Json<ReceiptRecord>,
) -> ApiResult<Json<StatusResponse>> {
    info!("Storing receipt for {}", receipt.title);

    let id = receipt.store_in(state.store.as_ref()).await?;

    info!(id = %id, "Stored receipt for {}", receipt.title);
    Ok(Json(StatusResponse::success("Receipt stored successfully")))
}

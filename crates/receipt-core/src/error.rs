//! Error types for the receipt-core library.

use thiserror::Error;

/// Main error type for the receipt library.
///
/// Only decoding and recognition are fatal; field extraction never fails and
/// falls back to sentinel values instead.
#[derive(Error, Debug)]
pub enum ReceiptError {
    /// The payload could not be turned into an image.
    #[error("Error processing receipt: {0}")]
    Decode(#[from] DecodeError),

    /// The text recognizer failed.
    #[error("Error processing receipt: {0}")]
    Ocr(#[from] OcrError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while decoding an incoming image payload.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The payload was empty after stripping whitespace and data-URL prefix.
    #[error("empty image payload")]
    EmptyPayload,

    /// The payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The bytes are not a readable image.
    #[error("unreadable image data: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models or start the engine.
    #[error("failed to load recognizer: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// Recognition did not finish in time.
    #[error("text recognition timed out after {0}s")]
    Timeout(u64),
}

/// Result type for the receipt library.
pub type Result<T> = std::result::Result<T, ReceiptError>;

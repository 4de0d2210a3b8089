//! Core library for receipt OCR processing.
//!
//! This crate provides:
//! - Image preprocessing (grayscale, denoise, adaptive threshold)
//! - Text recognition behind the `TextRecognizer` trait (tesseract, pure-onnx-ocr)
//! - Rule-based receipt field extraction (vendor, date, total, items)
//! - The processing pipeline from base64 payload to `ReceiptFields`

pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod processor;

pub use error::{DecodeError, OcrError, ReceiptError, Result};
pub use extract::{ExtractionResult, ReceiptParser};
pub use models::config::ReceiptConfig;
pub use models::receipt::{ExtractionMode, RawText, ReceiptFields, UNKNOWN_DATE, UNKNOWN_VENDOR};
pub use ocr::{create_recognizer, ImagePreprocessor, TesseractRecognizer, TextRecognizer};
#[cfg(feature = "native")]
pub use ocr::PureOcrRecognizer;
pub use processor::{decode_payload, ReceiptProcessor};

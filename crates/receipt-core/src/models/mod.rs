//! Data models and configuration.

pub mod config;
pub mod receipt;

pub use config::{
    AssistantConfig, ExtractionConfig, OcrConfig, OcrEngineKind, PreprocessConfig, ReceiptConfig,
    ServerConfig,
};
pub use receipt::{ExtractionMode, RawText, ReceiptFields, UNKNOWN_DATE, UNKNOWN_VENDOR};

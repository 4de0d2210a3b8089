//! Configuration structures for the receipt pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::receipt::ExtractionMode;
use crate::error::{ReceiptError, Result};

/// Main configuration for the receipt pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptConfig {
    /// Text recognizer configuration.
    pub ocr: OcrConfig,

    /// Image preprocessing configuration.
    pub preprocessing: PreprocessConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Chat assistant configuration.
    pub assistant: AssistantConfig,
}

/// Which recognizer implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrEngineKind {
    /// Tesseract through `rusty-tesseract`.
    #[default]
    Tesseract,
    /// In-process `pure-onnx-ocr` engine.
    PureOnnx,
}

/// Text recognizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Recognizer implementation.
    pub engine: OcrEngineKind,

    /// Tesseract OCR engine mode (3 = default, LSTM when available).
    pub engine_mode: u8,

    /// Tesseract page segmentation mode (6 = uniform block of text).
    pub page_segmentation: u8,

    /// Recognition language, e.g. "eng".
    pub language: Option<String>,

    /// Directory holding ONNX models for the pure engine.
    pub model_dir: PathBuf,

    /// Upper bound for one recognition call in seconds (0 = no limit).
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: OcrEngineKind::Tesseract,
            engine_mode: 3,
            page_segmentation: 6,
            language: None,
            model_dir: PathBuf::from("models"),
            timeout_secs: 60,
        }
    }
}

/// Image preprocessing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Bilateral filter neighbourhood diameter.
    pub bilateral_diameter: u32,

    /// Bilateral filter range sigma.
    pub bilateral_sigma_color: f32,

    /// Bilateral filter spatial sigma.
    pub bilateral_sigma_space: f32,

    /// Gaussian blur kernel size (odd).
    pub gaussian_kernel: u32,

    /// Adaptive threshold block size (odd, >= 3).
    pub threshold_block_size: u32,

    /// Constant subtracted from the weighted local mean.
    pub threshold_offset: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            bilateral_diameter: 11,
            bilateral_sigma_color: 17.0,
            bilateral_sigma_space: 17.0,
            gaussian_kernel: 5,
            threshold_block_size: 11,
            threshold_offset: 2.0,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Heuristic set used for extraction and preprocessing.
    pub mode: ExtractionMode,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8006,
        }
    }
}

/// Chat assistant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,

    /// Model identifier.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Nucleus sampling.
    pub top_p: f32,

    /// Environment variable holding the API token.
    pub api_key_env: String,

    /// Number of stored receipts retrieved per question.
    pub context_limit: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "https://models.github.ai/inference".to_string(),
            model: "openai/gpt-4.1".to_string(),
            temperature: 0.7,
            top_p: 1.0,
            api_key_env: "GITHUB_TOKEN".to_string(),
            context_limit: 3,
        }
    }
}

impl ReceiptConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ReceiptError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ReceiptError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override settings from `RECEIPT_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = get("RECEIPT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("RECEIPT_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| {
                    ReceiptError::Config(format!(
                        "RECEIPT_PORT must be a valid port number, got {}",
                        port
                    ))
                })?;
        }
        if let Some(mode) = get("RECEIPT_MODE") {
            self.extraction.mode = mode.parse().map_err(ReceiptError::Config)?;
        }
        if let Some(engine) = get("RECEIPT_OCR_ENGINE") {
            self.ocr.engine = match engine.to_lowercase().as_str() {
                "tesseract" => OcrEngineKind::Tesseract,
                "pure_onnx" | "pure-onnx" => OcrEngineKind::PureOnnx,
                other => {
                    return Err(ReceiptError::Config(format!("unknown OCR engine: {}", other)));
                }
            };
        }
        if let Some(dir) = get("RECEIPT_MODEL_DIR") {
            self.ocr.model_dir = PathBuf::from(dir);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let config = ReceiptConfig::default();
        assert_eq!(config.preprocessing.bilateral_diameter, 11);
        assert_eq!(config.preprocessing.threshold_block_size, 11);
        assert_eq!(config.ocr.engine_mode, 3);
        assert_eq!(config.ocr.page_segmentation, 6);
        assert_eq!(config.extraction.mode, ExtractionMode::Keyword);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ReceiptConfig::default();
        config.extraction.mode = ExtractionMode::Simple;
        config.server.port = 9000;
        config.save(&path).unwrap();

        let loaded = ReceiptConfig::from_file(&path).unwrap();
        assert_eq!(loaded.extraction.mode, ExtractionMode::Simple);
        assert_eq!(loaded.server.port, 9000);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ReceiptConfig =
            serde_json::from_str(r#"{"extraction": {"mode": "simple"}}"#).unwrap();
        assert_eq!(config.extraction.mode, ExtractionMode::Simple);
        assert_eq!(config.assistant.model, "openai/gpt-4.1");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RECEIPT_PORT", "8123"),
            ("RECEIPT_MODE", "simple"),
            ("RECEIPT_OCR_ENGINE", "pure-onnx"),
        ]
        .into_iter()
        .collect();

        let mut config = ReceiptConfig::default();
        config
            .apply_vars(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 8123);
        assert_eq!(config.extraction.mode, ExtractionMode::Simple);
        assert_eq!(config.ocr.engine, OcrEngineKind::PureOnnx);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut config = ReceiptConfig::default();
        let err = config
            .apply_vars(|k| (k == "RECEIPT_PORT").then(|| "abc".to_string()))
            .unwrap_err();
        assert!(matches!(&err, ReceiptError::Config(msg) if msg.contains("RECEIPT_PORT")));
    }

    #[test]
    fn test_unknown_engine_is_config_error() {
        let mut config = ReceiptConfig::default();
        let err = config
            .apply_vars(|k| (k == "RECEIPT_OCR_ENGINE").then(|| "abacus".to_string()))
            .unwrap_err();
        assert!(matches!(err, ReceiptError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReceiptConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ReceiptError::Io(_)));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = ReceiptConfig::from_file(&path).unwrap_err();
        assert!(matches!(&err, ReceiptError::Config(msg) if msg.contains("config.json")));
    }
}

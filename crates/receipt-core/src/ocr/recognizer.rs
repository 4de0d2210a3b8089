//! Recognizer backed by tesseract through `rusty-tesseract`.

use std::collections::HashMap;
use std::time::Instant;

use image::DynamicImage;
use rusty_tesseract::{Args, Image, TessError};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::TextRecognizer;

const DEFAULT_LANGUAGE: &str = "eng";

/// Tesseract with a configurable engine mode and page segmentation.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    engine_mode: u8,
    page_segmentation: u8,
    language: Option<String>,
}

impl TesseractRecognizer {
    /// LSTM engine, uniform-block page segmentation.
    pub fn new() -> Self {
        Self::from_config(&OcrConfig::default())
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            engine_mode: config.engine_mode,
            page_segmentation: config.page_segmentation,
            language: config.language.clone(),
        }
    }

    /// Set the recognition language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Arguments for one `image_to_string` call.
    ///
    /// No config variables are set, so tesseract prints plain text.
    pub fn tess_args(&self) -> Args {
        Args {
            lang: self
                .language
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            config_variables: HashMap::new(),
            dpi: None,
            psm: Some(i32::from(self.page_segmentation)),
            oem: Some(i32::from(self.engine_mode)),
        }
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

/// A missing executable is a load failure; anything else failed this image.
fn map_tess_error(err: TessError) -> OcrError {
    match err {
        TessError::TesseractNotFoundError => {
            OcrError::ModelLoad("tesseract executable not found".to_string())
        }
        other => OcrError::Recognition(other.to_string()),
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let start = Instant::now();
        let args = self.tess_args();

        debug!(
            "Running tesseract -l {} {}",
            args.lang,
            self.config_string()
        );

        let input = Image::from_dynamic_image(image).map_err(map_tess_error)?;
        let text = rusty_tesseract::image_to_string(&input, &args).map_err(map_tess_error)?;

        info!(
            "OCR complete: {} lines in {}ms",
            text.lines().count(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }

    fn name(&self) -> &str {
        "tesseract"
    }

    fn config_string(&self) -> String {
        format!("--oem {} --psm {}", self.engine_mode, self.page_segmentation)
    }
}

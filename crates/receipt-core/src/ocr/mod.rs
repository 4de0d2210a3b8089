//! Image preprocessing and text recognition.

mod preprocessing;
mod recognizer;

#[cfg(feature = "native")]
mod pure_engine;

pub use preprocessing::{DenoiseFilter, ImagePreprocessor};
pub use recognizer::TesseractRecognizer;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrRecognizer;

use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;
use crate::models::config::{OcrConfig, OcrEngineKind};

/// Turns a (preprocessed) image into newline-separated text.
///
/// Implementations are blocking and may take hundreds of milliseconds.
pub trait TextRecognizer: Send + Sync {
    /// Recognize all text in the image.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;

    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Engine-mode / page-segmentation settings, if the engine has any.
    fn config_string(&self) -> String {
        String::new()
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        (**self).recognize(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn config_string(&self) -> String {
        (**self).config_string()
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Arc<T> {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        (**self).recognize(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn config_string(&self) -> String {
        (**self).config_string()
    }
}

/// Build the recognizer selected in the configuration.
pub fn create_recognizer(config: &OcrConfig) -> Result<Box<dyn TextRecognizer>, OcrError> {
    match config.engine {
        OcrEngineKind::Tesseract => Ok(Box::new(TesseractRecognizer::from_config(config))),
        #[cfg(feature = "native")]
        OcrEngineKind::PureOnnx => Ok(Box::new(PureOcrRecognizer::from_dir(&config.model_dir)?)),
        #[cfg(not(feature = "native"))]
        OcrEngineKind::PureOnnx => Err(OcrError::ModelLoad(
            "pure_onnx engine requires the `native` feature".to_string(),
        )),
    }
}

/// A recognized text region with its quadrilateral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4).
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Vertical distance from a row's first top within which a box joins that row.
const ROW_TOLERANCE: f32 = 20.0;

/// Sort boxes top-to-bottom, left-to-right and join them into lines.
///
/// A box shares a line with the boxes above it when its top is within
/// `ROW_TOLERANCE` of that line's first top; words on a line are separated
/// by a space.
pub fn join_in_reading_order(boxes: &mut [TextBox]) -> String {
    let by = |a: f32, b: f32| a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal);
    boxes.sort_by(|a, b| by(a.rect().1, b.rect().1));

    let mut rows: Vec<Vec<&TextBox>> = Vec::new();
    let mut row_top = f32::NEG_INFINITY;
    for b in boxes.iter() {
        let top = b.rect().1;
        match rows.last_mut() {
            Some(row) if top - row_top <= ROW_TOLERANCE => row.push(b),
            _ => {
                rows.push(vec![b]);
                row_top = top;
            }
        }
    }

    rows.into_iter()
        .map(|mut row| {
            row.sort_by(|a, b| by(a.rect().0, b.rect().0));
            row.iter()
                .map(|b| b.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

//! Receipt processing pipeline: payload to image to text to fields.

use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, GenericImageView};
use tracing::{debug, info, warn};

use crate::error::{DecodeError, Result};
use crate::extract::{ExtractionResult, ReceiptParser};
use crate::models::config::ReceiptConfig;
use crate::models::receipt::{RawText, ReceiptFields};
use crate::ocr::{create_recognizer, ImagePreprocessor, TextRecognizer};

/// Runs decode, preprocessing, recognition and extraction for one receipt.
pub struct ReceiptProcessor<R: TextRecognizer> {
    recognizer: R,
    preprocessor: ImagePreprocessor,
    parser: ReceiptParser,
}

impl ReceiptProcessor<Box<dyn TextRecognizer>> {
    /// Build the recognizer, preprocessor and parser described by `config`.
    pub fn from_config(config: &ReceiptConfig) -> Result<Self> {
        let recognizer = create_recognizer(&config.ocr)?;
        let mode = config.extraction.mode;
        Ok(Self::new(recognizer)
            .with_preprocessor(
                ImagePreprocessor::new()
                    .with_config(config.preprocessing.clone())
                    .with_mode(mode),
            )
            .with_parser(ReceiptParser::new().with_mode(mode)))
    }
}

impl<R: TextRecognizer> ReceiptProcessor<R> {
    /// Processor with default preprocessing and keyword extraction.
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            preprocessor: ImagePreprocessor::new(),
            parser: ReceiptParser::new(),
        }
    }

    pub fn with_preprocessor(mut self, preprocessor: ImagePreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn with_parser(mut self, parser: ReceiptParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    pub fn parser(&self) -> &ReceiptParser {
        &self.parser
    }

    /// Process a base64 image, optionally wrapped in a `data:` URL.
    pub fn process_base64(&self, payload: &str) -> Result<ReceiptFields> {
        let bytes = decode_payload(payload)?;
        self.process_bytes(&bytes).map(|r| r.fields)
    }

    /// Process encoded image bytes (PNG, JPEG, ...).
    pub fn process_bytes(&self, bytes: &[u8]) -> Result<ExtractionResult> {
        let image = image::load_from_memory(bytes).map_err(DecodeError::from)?;
        // Recognizers see three-channel input, as a camera would produce.
        let image = DynamicImage::ImageRgb8(image.to_rgb8());
        self.process_image(&image)
    }

    /// Process an already decoded image.
    pub fn process_image(&self, image: &DynamicImage) -> Result<ExtractionResult> {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        info!("Processing receipt image: {}x{}", width, height);

        let text = match self.preprocessor.process(image) {
            Ok(gray) => self.recognizer.recognize(&DynamicImage::ImageLuma8(gray))?,
            Err(e) => {
                warn!("Preprocessing failed, recognizing original image: {}", e);
                self.recognizer.recognize(image)?
            }
        };

        debug!(
            engine = self.recognizer.name(),
            "Recognized {} characters",
            text.len()
        );

        let mut result = self.parser.parse(&RawText::new(text));
        result.processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Receipt processed in {}ms: {} / {} / {}",
            result.processing_time_ms,
            result.fields.vendor_name,
            result.fields.date,
            result.fields.total_amount
        );

        Ok(result)
    }
}

/// Strip an optional `data:<mime>;base64,` prefix and whitespace, then decode.
pub fn decode_payload(payload: &str) -> std::result::Result<Vec<u8>, DecodeError> {
    let trimmed = payload.trim();
    let body = match trimmed.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(""),
        None => trimmed,
    };
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }
    Ok(STANDARD.decode(compact)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OcrError, ReceiptError};
    use crate::models::config::PreprocessConfig;
    use image::{ColorType, ImageFormat, Rgb, RgbImage};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::io::Cursor;
    use std::result::Result;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Returns canned text, counts calls and records each input's color type.
    struct StubRecognizer {
        text: Result<String, String>,
        calls: AtomicUsize,
        seen: Mutex<Vec<ColorType>>,
    }

    impl StubRecognizer {
        fn returning(text: &str) -> Self {
            Self {
                text: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                text: Err(message.to_string()),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextRecognizer for StubRecognizer {
        fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(image.color());
            self.text.clone().map_err(OcrError::Recognition)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn png_base64() -> String {
        let img = RgbImage::from_pixel(24, 24, Rgb([250, 250, 250]));
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        STANDARD.encode(bytes.into_inner())
    }

    #[test]
    fn test_process_base64_extracts_fields() {
        let processor = ReceiptProcessor::new(StubRecognizer::returning(
            "ACME STORE\nDate: 01/02/2023\nCoffee 3.50\nTotal: 3.50",
        ));
        let fields = processor.process_base64(&png_base64()).unwrap();

        assert_eq!(fields.vendor_name, "ACME STORE");
        assert_eq!(fields.date, "2023-01-02");
        assert_eq!(fields.total_amount, Decimal::from_str("3.50").unwrap());
        assert_eq!(processor.recognizer().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_recognizer_sees_binarized_image() {
        let processor = ReceiptProcessor::new(StubRecognizer::returning("Total: 1.00"));
        processor.process_base64(&png_base64()).unwrap();
        assert_eq!(*processor.recognizer().seen.lock().unwrap(), vec![ColorType::L8]);
    }

    #[test]
    fn test_preprocessing_failure_recognizes_original_image() {
        let preprocessor = ImagePreprocessor::new().with_config(PreprocessConfig {
            threshold_block_size: 10,
            ..PreprocessConfig::default()
        });
        let processor = ReceiptProcessor::new(StubRecognizer::returning("ACME STORE\nTotal: 2.25"))
            .with_preprocessor(preprocessor);

        let fields = processor.process_base64(&png_base64()).unwrap();

        assert_eq!(fields.vendor_name, "ACME STORE");
        assert_eq!(fields.total_amount, Decimal::from_str("2.25").unwrap());
        assert_eq!(processor.recognizer().calls.load(Ordering::SeqCst), 1);
        assert_eq!(*processor.recognizer().seen.lock().unwrap(), vec![ColorType::Rgb8]);
    }

    #[test]
    fn test_data_url_prefix_is_accepted() {
        let processor = ReceiptProcessor::new(StubRecognizer::returning("Total: 1.00"));
        let payload = format!("data:image/png;base64,{}\n", png_base64());
        let fields = processor.process_base64(&payload).unwrap();
        assert_eq!(fields.total_amount, Decimal::from_str("1.00").unwrap());
    }

    #[test]
    fn test_malformed_base64_is_decode_error() {
        let processor = ReceiptProcessor::new(StubRecognizer::returning("Total: 1.00"));
        let err = processor.process_base64("not*base64!").unwrap_err();

        assert!(matches!(err, ReceiptError::Decode(DecodeError::Base64(_))));
        assert!(err.to_string().starts_with("Error processing receipt:"));
        assert_eq!(processor.recognizer().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_non_image_bytes_are_decode_error() {
        let processor = ReceiptProcessor::new(StubRecognizer::returning(""));
        let payload = STANDARD.encode(b"definitely not an image");
        assert!(matches!(
            processor.process_base64(&payload),
            Err(ReceiptError::Decode(DecodeError::Image(_)))
        ));
    }

    #[test]
    fn test_empty_payload() {
        let processor = ReceiptProcessor::new(StubRecognizer::returning(""));
        assert!(matches!(
            processor.process_base64("  data:image/png;base64,  "),
            Err(ReceiptError::Decode(DecodeError::EmptyPayload))
        ));
    }

    #[test]
    fn test_recognizer_failure_is_wrapped() {
        let processor = ReceiptProcessor::new(StubRecognizer::failing("engine crashed"));
        let err = processor.process_base64(&png_base64()).unwrap_err();

        assert!(matches!(err, ReceiptError::Ocr(OcrError::Recognition(_))));
        assert_eq!(
            err.to_string(),
            "Error processing receipt: text recognition failed: engine crashed"
        );
    }

    #[test]
    fn test_all_default_fields_are_success() {
        let processor = ReceiptProcessor::new(StubRecognizer::returning(""));
        let fields = processor.process_base64(&png_base64()).unwrap();
        assert!(fields.is_empty());
    }
}

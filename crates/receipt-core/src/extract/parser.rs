//! Receipt parser running every field extractor over recognized text.

use std::time::Instant;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::receipt::{ExtractionMode, RawText, ReceiptFields, UNKNOWN_VENDOR};

use super::rules::{DateExtractor, FieldExtractor, ItemExtractor, TotalExtractor, VendorExtractor};

/// Result of receipt extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted fields, sentinels included.
    pub fields: ReceiptFields,
    /// One message per field that fell back to its default.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Rule-based receipt parser.
///
/// Holds no state between calls: parsing the same text twice yields the same
/// fields. Unless pinned, the reference date is the day `parse` runs on.
#[derive(Debug, Clone)]
pub struct ReceiptParser {
    mode: ExtractionMode,
    reference_date: Option<NaiveDate>,
}

impl ReceiptParser {
    /// Keyword-mode parser following the clock.
    pub fn new() -> Self {
        Self {
            mode: ExtractionMode::Keyword,
            reference_date: None,
        }
    }

    /// Set the extraction mode.
    pub fn with_mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the date used for year plausibility and the simple-mode default.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    /// The pinned reference date, or today.
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Parse recognized text into fields with warnings and timing.
    pub fn parse(&self, text: &RawText) -> ExtractionResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        info!(
            mode = %self.mode,
            "Parsing receipt from {} characters of text",
            text.as_str().len()
        );

        let vendor_name = match VendorExtractor::new(self.mode).extract(text) {
            Some(candidate) => candidate.value,
            None => {
                warnings.push("Could not extract vendor name".to_string());
                UNKNOWN_VENDOR.to_string()
            }
        };

        let reference = self.reference_date();
        let dates = DateExtractor::new(self.mode);
        let date = match dates.extract_at(text, reference) {
            Some(candidate) => super::rules::dates::format_iso(candidate.value),
            None => {
                warnings.push("Could not extract date".to_string());
                dates.default_at(reference)
            }
        };

        let total_amount = match TotalExtractor::new(self.mode).extract(text) {
            Some(candidate) => candidate.value,
            None => {
                warnings.push("Could not extract total amount".to_string());
                Decimal::ZERO
            }
        };

        let items = match self.mode {
            ExtractionMode::Keyword => Vec::new(),
            ExtractionMode::Simple => ItemExtractor::new()
                .extract(text)
                .map(|c| c.value)
                .unwrap_or_default(),
        };

        let fields = ReceiptFields {
            vendor_name,
            date,
            total_amount,
            items,
            raw_text: text.as_str().to_string(),
        };

        debug!(
            vendor = %fields.vendor_name,
            date = %fields.date,
            total = %fields.total_amount,
            "Extracted receipt fields"
        );

        ExtractionResult {
            fields,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Parse and keep only the fields.
    pub fn extract_fields(&self, text: &RawText) -> ReceiptFields {
        self.parse(text).fields
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

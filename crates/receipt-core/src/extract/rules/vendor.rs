//! Vendor name extraction.

use super::patterns::{
    SIMPLE_VENDOR_LINES, VENDOR_HEADER_LINES, VENDOR_KEYWORDS, VENDOR_SEPARATOR,
    VENDOR_SKIP_WORDS,
};
use super::{contains_any, Candidate, Cascade, FieldExtractor};
use crate::models::receipt::{ExtractionMode, RawText, UNKNOWN_VENDOR};

/// Vendor field extractor.
pub struct VendorExtractor {
    mode: ExtractionMode,
}

impl VendorExtractor {
    pub fn new(mode: ExtractionMode) -> Self {
        Self { mode }
    }

    fn cascade(&self) -> Cascade<'static, String> {
        match self.mode {
            ExtractionMode::Keyword => Cascade::new("vendor")
                .pass("vendor_label", labelled_vendor)
                .pass("header_line", header_vendor),
            ExtractionMode::Simple => Cascade::new("vendor").pass("plain_line", plain_vendor),
        }
    }
}

impl Default for VendorExtractor {
    fn default() -> Self {
        Self::new(ExtractionMode::Keyword)
    }
}

impl FieldExtractor for VendorExtractor {
    type Output = String;

    fn extract(&self, text: &RawText) -> Option<Candidate<String>> {
        self.cascade()
            .run(text)
            .map(|c| c.map(|name| name.to_uppercase()))
    }
}

/// "Sold by: Acme" style lines. The first keyword line with a usable label
/// value wins.
fn labelled_vendor(text: &RawText) -> Option<Candidate<String>> {
    text.lines()
        .into_iter()
        .filter(|line| contains_any(line, VENDOR_KEYWORDS))
        .find_map(|line| {
            let mut parts = VENDOR_SEPARATOR.splitn(line, 2);
            parts.next();
            let value = parts.next()?.trim();
            (value.chars().count() > 2).then(|| Candidate::new(value.to_string(), line, "vendor_label"))
        })
}

/// First header line with enough letters that is not a date/total line.
fn header_vendor(text: &RawText) -> Option<Candidate<String>> {
    text.lines()
        .into_iter()
        .take(VENDOR_HEADER_LINES)
        .filter(|line| !contains_any(line, VENDOR_SKIP_WORDS))
        .find(|line| line.chars().filter(|c| c.is_ascii_alphabetic()).count() > 3)
        .map(|line| Candidate::new(line.to_string(), line, "header_line"))
}

/// First of the leading raw lines that has text and no digits.
fn plain_vendor(text: &RawText) -> Option<Candidate<String>> {
    text.raw_lines()
        .into_iter()
        .take(SIMPLE_VENDOR_LINES)
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.chars().any(|c| c.is_ascii_digit()))
        .map(|line| Candidate::new(line.to_string(), line, "plain_line"))
}

/// Vendor name using keyword-mode rules, or "Unknown Vendor".
pub fn extract_vendor(text: &str) -> String {
    VendorExtractor::default()
        .extract(&RawText::new(text))
        .map(|c| c.value)
        .unwrap_or_else(|| UNKNOWN_VENDOR.to_string())
}

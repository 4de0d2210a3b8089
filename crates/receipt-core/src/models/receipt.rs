//! Receipt data models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Vendor name used when no candidate qualifies.
pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";

/// Date value used by keyword extraction when no date qualifies.
pub const UNKNOWN_DATE: &str = "Unknown";

/// Text produced by the recognizer for one receipt image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawText {
    text: String,
}

impl RawText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Build from recognizer lines, joined with newlines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = lines
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self { text }
    }

    /// Verbatim recognizer output.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Trimmed, non-empty lines in recognizer order.
    pub fn lines(&self) -> Vec<&str> {
        self.text
            .split('\n')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// Lines exactly as split on newlines, blank ones included.
    pub fn raw_lines(&self) -> Vec<&str> {
        self.text.split('\n').collect()
    }

    /// Non-empty lines joined back together.
    pub fn joined(&self) -> String {
        self.lines().join("\n")
    }
}

impl From<&str> for RawText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for RawText {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Structured fields extracted from a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptFields {
    /// Upper-cased vendor name, or [`UNKNOWN_VENDOR`].
    pub vendor_name: String,

    /// ISO `YYYY-MM-DD` date, or the sentinel of the extraction mode.
    pub date: String,

    /// Total amount, `0` when nothing matched.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,

    /// Item lines (simple extraction mode only).
    #[serde(default)]
    pub items: Vec<String>,

    /// Recognizer output the fields were extracted from.
    pub raw_text: String,
}

impl ReceiptFields {
    /// True when every field holds its default value.
    pub fn is_empty(&self) -> bool {
        self.vendor_name == UNKNOWN_VENDOR
            && self.total_amount.is_zero()
            && self.items.is_empty()
            && (self.date == UNKNOWN_DATE || self.date.is_empty())
    }

    /// Total amount as a float, for display and JSON consumers.
    pub fn total_as_f64(&self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        self.total_amount.to_f64().unwrap_or(0.0)
    }
}

/// Which set of extraction heuristics to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Keyword-anchored cascades with fallbacks; date defaults to "Unknown".
    #[default]
    Keyword,
    /// Leading-line vendor, labelled totals, item lines; date defaults to today.
    Simple,
}

impl ExtractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Simple => "simple",
        }
    }
}

impl std::str::FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "simple" => Ok(Self::Simple),
            other => Err(format!("unknown extraction mode: {}", other)),
        }
    }
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

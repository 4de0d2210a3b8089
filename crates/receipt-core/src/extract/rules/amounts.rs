//! Total amount extraction for receipts.

use std::cmp::Reverse;
use std::str::FromStr;

use rust_decimal::Decimal;

use super::patterns::{AMOUNT, LABELLED_AMOUNT, LABELLED_TOTAL, TOTAL_KEYWORDS, TRAILING_AMOUNT};
use super::{contains_any, first_valid, Candidate, Cascade, FieldExtractor};
use crate::models::receipt::{ExtractionMode, RawText};

/// Total amount field extractor.
pub struct TotalExtractor {
    mode: ExtractionMode,
}

impl TotalExtractor {
    pub fn new(mode: ExtractionMode) -> Self {
        Self { mode }
    }

    fn cascade(&self) -> Cascade<'static, Decimal> {
        match self.mode {
            ExtractionMode::Keyword => Cascade::new("total")
                .pass("total_label", ranked_total)
                .pass("trailing_amount", trailing_amount),
            ExtractionMode::Simple => Cascade::new("total").pass("labelled_total", labelled_total),
        }
    }
}

impl Default for TotalExtractor {
    fn default() -> Self {
        Self::new(ExtractionMode::Keyword)
    }
}

impl FieldExtractor for TotalExtractor {
    type Output = Decimal;

    fn extract(&self, text: &RawText) -> Option<Candidate<Decimal>> {
        self.cascade().run(text)
    }
}

/// Amounts on total-like lines. Lines saying "total" outrank the rest, then
/// the larger amount wins.
fn ranked_total(text: &RawText) -> Option<Candidate<Decimal>> {
    let mut candidates: Vec<Candidate<Decimal>> = text
        .lines()
        .into_iter()
        .filter(|line| contains_any(line, TOTAL_KEYWORDS))
        .filter_map(|line| {
            let token = AMOUNT.find(line)?;
            let value = parse_amount(token.as_str())?;
            Some(Candidate::new(value, line, "total_label"))
        })
        .collect();

    candidates.sort_by_key(|c| (!contains_any(&c.source, &["total"]), Reverse(c.value)));
    candidates.into_iter().next()
}

/// Last line (bottom up) ending in an amount.
fn trailing_amount(text: &RawText) -> Option<Candidate<Decimal>> {
    first_valid(text.lines().into_iter().rev(), |line| {
        let caps = TRAILING_AMOUNT.captures(line)?;
        let value = parse_amount(&caps[1])?;
        Some(Candidate::new(value, line, "trailing_amount"))
    })
}

/// `Total: $12.34`, then `Amount: 12.34`; first match wins.
fn labelled_total(text: &RawText) -> Option<Candidate<Decimal>> {
    first_valid([&*LABELLED_TOTAL, &*LABELLED_AMOUNT], |re| {
        let caps = re.captures(text.as_str())?;
        let value = parse_amount(&caps[1])?;
        Some(Candidate::new(value, &caps[0], "labelled_total"))
    })
}

/// Parse a two-decimal amount such as `12.50`, `12,50`, `1,234.56` or
/// `1.234,56`.
///
/// The separator closest to the end is the decimal one; the other kind is a
/// thousands separator and dropped.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        // A lone comma is always decimal, so "1,234" reads as 1.234.
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}

/// Total using keyword-mode rules, or zero.
pub fn extract_total(text: &str) -> Decimal {
    TotalExtractor::default()
        .extract(&RawText::new(text))
        .map(|c| c.value)
        .unwrap_or(Decimal::ZERO)
}

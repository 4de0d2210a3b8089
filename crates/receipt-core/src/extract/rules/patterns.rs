//! Common regex patterns and keyword lists for receipt extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Keywords that introduce a vendor on the same line.
pub const VENDOR_KEYWORDS: &[&str] = &["from", "vendor", "store", "sold by", "company"];

/// Lines containing these are never taken as a header vendor line.
pub const VENDOR_SKIP_WORDS: &[&str] = &["date", "time", "invoice", "amount", "total"];

/// Keywords marking a line that carries the transaction date.
pub const DATE_KEYWORDS: &[&str] = &[
    "date",
    "due date",
    "invoice date",
    "purchase date",
    "order date",
];

/// Keywords marking a line that may carry the total.
pub const TOTAL_KEYWORDS: &[&str] = &["total", "amount due", "balance", "amount"];

/// Number of leading lines searched for a header vendor (keyword mode).
pub const VENDOR_HEADER_LINES: usize = 7;

/// Number of leading lines searched for a vendor (simple mode).
pub const SIMPLE_VENDOR_LINES: usize = 5;

lazy_static! {
    // Vendor label separator: first colon or hyphen
    pub static ref VENDOR_SEPARATOR: Regex = Regex::new(r"[:\-]").unwrap();

    // Dates: 03/15/2024, 15-03-24. Must start at a non-digit so "2024-03-15"
    // never yields "24-03-15"; letters may touch either end ("Date03/15/2024PM").
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"(?:^|\D)(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})"
    ).unwrap();

    // Dates: 2024-03-15, 2024/3/5
    pub static ref DATE_YMD: Regex = Regex::new(
        r"(?:^|\D)(\d{4})[/-](\d{1,2})[/-](\d{1,2})"
    ).unwrap();

    // Dates: 15 March 2024, 5 Mar 24
    pub static ref DATE_DAY_MONTH: Regex = Regex::new(
        r"(?:^|\D)(\d{1,2})\s+([A-Za-z]{3,9})\s+(\d{2,4})"
    ).unwrap();

    // Dates: March 15, 2024 / Mar 15 2024
    pub static ref DATE_MONTH_DAY: Regex = Regex::new(
        r"([A-Za-z]{3,9})\s+(\d{1,2}),?\s+(\d{2,4})"
    ).unwrap();

    // Simple mode: one separator kind per pattern
    pub static ref DATE_SLASH: Regex = Regex::new(
        r"(?:^|\D)(\d{1,2})/(\d{1,2})/(\d{2,4})"
    ).unwrap();

    pub static ref DATE_DASH: Regex = Regex::new(
        r"(?:^|\D)(\d{1,2})-(\d{1,2})-(\d{2,4})"
    ).unwrap();

    pub static ref DATE_DOT: Regex = Regex::new(
        r"(?:^|\D)(\d{1,2})\.(\d{1,2})\.(\d{2,4})"
    ).unwrap();

    // Any numeric date, used to drop date lines from items
    pub static ref DATE_ANY_NUMERIC: Regex = Regex::new(
        r"\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}"
    ).unwrap();

    // Two-decimal amounts: 1,234.56 | 1.234,56 | 12.50 | 12,50
    pub static ref AMOUNT: Regex = Regex::new(
        r"\d{1,3}(?:,\d{3})+\.\d{2}|\d{1,3}(?:\.\d{3})+,\d{2}|\d+[.,]\d{2}"
    ).unwrap();

    // Amount closing a line, optionally after a currency symbol
    pub static ref TRAILING_AMOUNT: Regex = Regex::new(
        r"[$€£]?\s?(\d{1,3}(?:,\d{3})+\.\d{2}|\d{1,3}(?:\.\d{3})+,\d{2}|\d+[.,]\d{2})$"
    ).unwrap();

    // Simple mode labelled totals
    pub static ref LABELLED_TOTAL: Regex = Regex::new(
        r"(?i)Total:?\s*\$?\s*(\d+\.\d{2})"
    ).unwrap();

    pub static ref LABELLED_AMOUNT: Regex = Regex::new(
        r"(?i)Amount:?\s*\$?\s*(\d+\.\d{2})"
    ).unwrap();

    // Summary lines that are not items
    pub static ref ITEM_EXCLUDE: Regex = Regex::new(
        r"(?i)total|amount|tax"
    ).unwrap();
}

//! Receipt field extraction module.

mod parser;
pub mod rules;

pub use parser::{ExtractionResult, ReceiptParser};
pub use rules::{extract_date, extract_items, extract_total, extract_vendor, Candidate, FieldExtractor};

//! Rule-based field extractors for receipts.
//!
//! Every field is found by a cascade of passes tried in order, from the most
//! specific (keyword-anchored) to the most permissive. The first pass that
//! yields an accepted candidate wins; if none does, the caller substitutes
//! the field's sentinel value.

pub mod amounts;
pub mod dates;
pub mod items;
pub mod patterns;
pub mod vendor;

pub use amounts::{extract_total, parse_amount, TotalExtractor};
pub use dates::{extract_date, parse_date_token, DateExtractor, DatePattern};
pub use items::{extract_items, ItemExtractor};
pub use vendor::{extract_vendor, VendorExtractor};

use tracing::trace;

use crate::models::receipt::RawText;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Run the cascade and return the winning candidate, if any.
    fn extract(&self, text: &RawText) -> Option<Candidate<Self::Output>>;
}

/// A provisionally extracted value and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    /// Extracted value.
    pub value: T,
    /// Line (or text fragment) the value was read from.
    pub source: String,
    /// Name of the pass that produced it.
    pub pass: &'static str,
}

impl<T> Candidate<T> {
    pub fn new(value: T, source: impl Into<String>, pass: &'static str) -> Self {
        Self {
            value,
            source: source.into(),
            pass,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Candidate<U> {
        Candidate {
            value: f(self.value),
            source: self.source,
            pass: self.pass,
        }
    }
}

type PassFn<'a, T> = Box<dyn Fn(&RawText) -> Option<Candidate<T>> + 'a>;

/// Ordered list of independent passes; the first success wins.
pub struct Cascade<'a, T> {
    field: &'static str,
    passes: Vec<(&'static str, PassFn<'a, T>)>,
}

impl<'a, T> Cascade<'a, T> {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            passes: Vec::new(),
        }
    }

    /// Append a pass. Passes run in insertion order.
    pub fn pass<F>(mut self, name: &'static str, f: F) -> Self
    where
        F: Fn(&RawText) -> Option<Candidate<T>> + 'a,
    {
        self.passes.push((name, Box::new(f)));
        self
    }

    pub fn run(&self, text: &RawText) -> Option<Candidate<T>> {
        for (name, pass) in &self.passes {
            if let Some(candidate) = pass(text) {
                trace!(field = self.field, pass = *name, source = %candidate.source, "candidate accepted");
                return Some(candidate);
            }
        }
        trace!(field = self.field, "no pass produced a candidate");
        None
    }
}

/// First item of `candidates` for which `accept` returns a value.
///
/// `accept` both parses and validates; `None` moves on to the next candidate.
pub fn first_valid<I, C, T, F>(candidates: I, mut accept: F) -> Option<T>
where
    I: IntoIterator<Item = C>,
    F: FnMut(C) -> Option<T>,
{
    candidates.into_iter().find_map(|c| accept(c))
}

/// True when `haystack` contains any keyword, ignoring case.
pub(crate) fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_stops_at_first_success() {
        let cascade: Cascade<'_, u32> = Cascade::new("test")
            .pass("never", |_| None)
            .pass("first", |_| Some(Candidate::new(1, "a", "first")))
            .pass("second", |_| Some(Candidate::new(2, "b", "second")));

        let candidate = cascade.run(&RawText::new("x")).unwrap();
        assert_eq!(candidate.value, 1);
        assert_eq!(candidate.pass, "first");
    }

    #[test]
    fn test_cascade_without_success() {
        let cascade: Cascade<'_, u32> = Cascade::new("test").pass("never", |_| None);
        assert!(cascade.run(&RawText::new("x")).is_none());
    }

    #[test]
    fn test_first_valid_skips_rejected() {
        let value = first_valid(["x", "12", "7"], |s| s.parse::<u32>().ok().filter(|n| *n < 10));
        assert_eq!(value, Some(7));
    }

    #[test]
    fn test_contains_any_ignores_case() {
        assert!(contains_any("GRAND TOTAL", &["total"]));
        assert!(!contains_any("Coffee", &["total", "tax"]));
    }
}

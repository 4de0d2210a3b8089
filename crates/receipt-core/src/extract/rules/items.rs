//! Item line extraction (simple mode).

use super::patterns::{DATE_ANY_NUMERIC, ITEM_EXCLUDE};
use super::{Candidate, FieldExtractor};
use crate::models::receipt::RawText;

/// Collects every line that is neither a summary line nor a date line.
#[derive(Default)]
pub struct ItemExtractor;

impl ItemExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FieldExtractor for ItemExtractor {
    type Output = Vec<String>;

    fn extract(&self, text: &RawText) -> Option<Candidate<Vec<String>>> {
        let items: Vec<String> = text
            .lines()
            .into_iter()
            .filter(|line| !ITEM_EXCLUDE.is_match(line) && !DATE_ANY_NUMERIC.is_match(line))
            .map(str::to_string)
            .collect();

        if items.is_empty() {
            None
        } else {
            let source = items.join("\n");
            Some(Candidate::new(items, source, "item_lines"))
        }
    }
}

/// Item lines in their original order, possibly none.
pub fn extract_items(text: &str) -> Vec<String> {
    ItemExtractor::new()
        .extract(&RawText::new(text))
        .map(|c| c.value)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_items_skip_summary_and_date_lines() {
        let text = "ACME STORE\nDate: 01/02/2023\nCoffee 3.50\n\n  Muffin 2.25  \nSUBTOTAL 5.75\nTax 0.46\nTotal: 6.21";
        assert_eq!(
            extract_items(text),
            vec!["ACME STORE", "Coffee 3.50", "Muffin 2.25"]
        );
    }

    #[test]
    fn test_items_keyword_match_ignores_case() {
        assert_eq!(extract_items("AMOUNT 3.00\nTaxi ride 12.00"), Vec::<String>::new());
    }

    #[test]
    fn test_dotted_dates_are_skipped() {
        assert_eq!(extract_items("15.03.2024\nBread 1.20"), vec!["Bread 1.20"]);
    }

    #[test]
    fn test_blank_text_has_no_items() {
        assert!(extract_items(" \n\n").is_empty());
    }
}

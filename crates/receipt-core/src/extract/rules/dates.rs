//! Date extraction for receipts.

use chrono::{Datelike, Local, NaiveDate};
use regex::{Captures, Regex};

use super::patterns::{
    DATE_DASH, DATE_DAY_MONTH, DATE_DOT, DATE_KEYWORDS, DATE_MONTH_DAY, DATE_NUMERIC,
    DATE_SLASH, DATE_YMD,
};
use super::{contains_any, first_valid, Candidate, Cascade, FieldExtractor};
use crate::models::receipt::{ExtractionMode, RawText, UNKNOWN_DATE};

/// Date shapes recognised on receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePattern {
    /// `03/15/2024`, `15-03-24` (month first unless that is impossible).
    Numeric,
    /// `2024-03-15`, `2024/3/5`.
    YearFirst,
    /// `15 March 2024`.
    DayMonthName,
    /// `March 15, 2024`.
    MonthNameDay,
    /// `03/15/2024` only.
    Slash,
    /// `03-15-2024` only.
    Dash,
    /// `03.15.2024` only.
    Dot,
}

impl DatePattern {
    /// Order tried by keyword extraction.
    pub const KEYWORD: [DatePattern; 4] = [
        DatePattern::Numeric,
        DatePattern::YearFirst,
        DatePattern::DayMonthName,
        DatePattern::MonthNameDay,
    ];

    /// Order tried by simple extraction.
    pub const SIMPLE: [DatePattern; 3] = [DatePattern::Slash, DatePattern::Dash, DatePattern::Dot];

    pub fn regex(&self) -> &'static Regex {
        match self {
            Self::Numeric => &DATE_NUMERIC,
            Self::YearFirst => &DATE_YMD,
            Self::DayMonthName => &DATE_DAY_MONTH,
            Self::MonthNameDay => &DATE_MONTH_DAY,
            Self::Slash => &DATE_SLASH,
            Self::Dash => &DATE_DASH,
            Self::Dot => &DATE_DOT,
        }
    }

    /// Turn one match of this pattern into a calendar date.
    pub fn parse(&self, caps: &Captures<'_>, reference_year: i32) -> Option<NaiveDate> {
        match self {
            Self::Numeric | Self::Slash | Self::Dash | Self::Dot => {
                let first: u32 = caps[1].parse().ok()?;
                let second: u32 = caps[2].parse().ok()?;
                let year = expand_year(&caps[3], reference_year)?;
                let (month, day) = if first <= 12 {
                    (first, second)
                } else if second <= 12 {
                    (second, first)
                } else {
                    return None;
                };
                NaiveDate::from_ymd_opt(year, month, day)
            }
            Self::YearFirst => {
                let year: i32 = caps[1].parse().ok()?;
                let a: u32 = caps[2].parse().ok()?;
                let b: u32 = caps[3].parse().ok()?;
                let (month, day) = if a > 12 && b <= 12 { (b, a) } else { (a, b) };
                NaiveDate::from_ymd_opt(year, month, day)
            }
            Self::DayMonthName => {
                let day: u32 = caps[1].parse().ok()?;
                let month = month_from_name(&caps[2])?;
                let year = expand_year(&caps[3], reference_year)?;
                NaiveDate::from_ymd_opt(year, month, day)
            }
            Self::MonthNameDay => {
                let month = month_from_name(&caps[1])?;
                let day: u32 = caps[2].parse().ok()?;
                let year = expand_year(&caps[3], reference_year)?;
                NaiveDate::from_ymd_opt(year, month, day)
            }
        }
    }
}

/// Parse a date-looking token with the keyword pattern set.
///
/// Returns `None` instead of failing when nothing in the token is a valid
/// calendar date.
pub fn parse_date_token(token: &str, reference_year: i32) -> Option<NaiveDate> {
    first_valid(DatePattern::KEYWORD, |pattern| {
        pattern
            .regex()
            .captures(token)
            .and_then(|caps| pattern.parse(&caps, reference_year))
    })
}

/// Expand a 2-digit year into the century window around the reference year.
fn expand_year(raw: &str, reference_year: i32) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    if raw.len() > 2 {
        return Some(year);
    }
    let mut full = reference_year - reference_year.rem_euclid(100) + year;
    if full >= reference_year + 50 {
        full -= 100;
    } else if full < reference_year - 50 {
        full += 100;
    }
    Some(full)
}

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    if lower == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .position(|m| *m == lower || (lower.len() == 3 && m.starts_with(&lower)))
        .map(|i| i as u32 + 1)
}

/// Matched date text without the leading non-digit the pattern consumed.
fn date_text<'t>(caps: &Captures<'t>) -> &'t str {
    let Some(whole) = caps.get(0) else {
        return "";
    };
    let start = caps.get(1).map_or(whole.start(), |m| m.start());
    &whole.as_str()[start - whole.start()..]
}

/// Date field extractor.
///
/// Without a pinned reference date, "today" is read on every extraction.
pub struct DateExtractor {
    mode: ExtractionMode,
    reference_date: Option<NaiveDate>,
}

impl DateExtractor {
    /// Extractor whose reference date is the current day.
    pub fn new(mode: ExtractionMode) -> Self {
        Self {
            mode,
            reference_date: None,
        }
    }

    /// Pin the reference date instead of following the clock.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Parse a match, rejecting years after the one following `reference`.
    fn accept(
        pattern: DatePattern,
        caps: &Captures<'_>,
        reference: NaiveDate,
    ) -> Option<NaiveDate> {
        let max_year = reference.year() + 1;
        pattern
            .parse(caps, reference.year())
            .filter(|d| d.year() <= max_year)
    }

    /// Lines with a date keyword; the first match of each pattern is tried.
    fn labelled_date(text: &RawText, reference: NaiveDate) -> Option<Candidate<NaiveDate>> {
        text.lines()
            .into_iter()
            .filter(|line| contains_any(line, DATE_KEYWORDS))
            .find_map(|line| {
                first_valid(DatePattern::KEYWORD, |pattern| {
                    let caps = pattern.regex().captures(line)?;
                    Self::accept(pattern, &caps, reference)
                })
                .map(|date| Candidate::new(date, line, "date_label"))
            })
    }

    /// Every match of every pattern over the whole text, in pattern order.
    fn any_date(text: &RawText, reference: NaiveDate) -> Option<Candidate<NaiveDate>> {
        let joined = text.joined();
        DatePattern::KEYWORD.into_iter().find_map(|pattern| {
            pattern.regex().captures_iter(&joined).find_map(|caps| {
                Self::accept(pattern, &caps, reference)
                    .map(|date| Candidate::new(date, date_text(&caps), "any_date"))
            })
        })
    }

    fn numeric_date(text: &RawText, reference: NaiveDate) -> Option<Candidate<NaiveDate>> {
        let reference_year = reference.year();
        DatePattern::SIMPLE.into_iter().find_map(|pattern| {
            pattern.regex().captures_iter(text.as_str()).find_map(|caps| {
                pattern
                    .parse(&caps, reference_year)
                    .map(|date| Candidate::new(date, date_text(&caps), "numeric_date"))
            })
        })
    }

    /// The extracted date as ISO text, or this mode's default.
    pub fn extract_or_default(&self, text: &RawText) -> String {
        let reference = self.reference_date();
        match self.extract_at(text, reference) {
            Some(candidate) => format_iso(candidate.value),
            None => self.default_at(reference),
        }
    }

    /// Run the cascade against one resolved reference date.
    pub fn extract_at(&self, text: &RawText, reference: NaiveDate) -> Option<Candidate<NaiveDate>> {
        let cascade = match self.mode {
            ExtractionMode::Keyword => Cascade::new("date")
                .pass("date_label", move |t| Self::labelled_date(t, reference))
                .pass("any_date", move |t| Self::any_date(t, reference)),
            ExtractionMode::Simple => Cascade::new("date")
                .pass("numeric_date", move |t| Self::numeric_date(t, reference)),
        };
        cascade.run(text)
    }

    /// `"Unknown"` in keyword mode, the reference date in simple mode.
    pub fn default_at(&self, reference: NaiveDate) -> String {
        match self.mode {
            ExtractionMode::Keyword => UNKNOWN_DATE.to_string(),
            ExtractionMode::Simple => format_iso(reference),
        }
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new(ExtractionMode::Keyword)
    }
}

impl FieldExtractor for DateExtractor {
    type Output = NaiveDate;

    fn extract(&self, text: &RawText) -> Option<Candidate<NaiveDate>> {
        self.extract_at(text, self.reference_date())
    }
}

pub(crate) fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// ISO date using keyword-mode rules relative to today, or `"Unknown"`.
pub fn extract_date(text: &str) -> String {
    DateExtractor::default().extract_or_default(&RawText::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn extractor_at(mode: ExtractionMode, reference: NaiveDate) -> DateExtractor {
        DateExtractor::new(mode).with_reference_date(reference)
    }

    fn keyword_date(text: &str) -> String {
        extractor_at(ExtractionMode::Keyword, ymd(2024, 6, 1)).extract_or_default(&RawText::new(text))
    }

    #[test]
    fn test_invoice_date_month_first() {
        assert_eq!(keyword_date("Invoice Date: 03/15/2024"), "2024-03-15");
        assert_eq!(extract_date("Invoice Date: 03/15/2024"), "2024-03-15");
    }

    #[test]
    fn test_day_first_when_month_impossible() {
        assert_eq!(keyword_date("Date: 25/12/2023"), "2023-12-25");
    }

    #[test]
    fn test_both_parts_over_twelve_is_invalid() {
        assert_eq!(keyword_date("Date: 25/13/2023"), UNKNOWN_DATE);
    }

    #[test]
    fn test_year_first() {
        assert_eq!(keyword_date("Purchase date 2024-03-15"), "2024-03-15");
    }

    #[test]
    fn test_year_first_is_not_split_into_short_date() {
        // "24-03-15" inside "2024-03-15" must not be read as a numeric date.
        assert_eq!(keyword_date("Paid 2024-03-15 thanks"), "2024-03-15");
    }

    #[test]
    fn test_dates_touching_letters() {
        assert_eq!(keyword_date("Date03/15/2024"), "2024-03-15");
        assert_eq!(keyword_date("Date: 03/15/2024PM"), "2024-03-15");
        assert_eq!(keyword_date("Paid2024-03-15ok"), "2024-03-15");
        assert_eq!(keyword_date("Date:5 Mar 2024"), "2024-03-05");
    }

    #[test]
    fn test_glued_date_source_has_no_prefix() {
        let candidate = extractor_at(ExtractionMode::Keyword, ymd(2024, 6, 1))
            .extract(&RawText::new("Printed at noonX03/15/2024"))
            .unwrap();
        assert_eq!(candidate.pass, "any_date");
        assert_eq!(candidate.source, "03/15/2024");
    }

    #[test]
    fn test_simple_mode_glued_date() {
        let extractor = extractor_at(ExtractionMode::Simple, ymd(2024, 6, 1));
        assert_eq!(
            extractor.extract_or_default(&RawText::new("Visit12/24/2023thanks")),
            "2023-12-24"
        );
    }

    #[test]
    fn test_unpinned_extractor_reads_the_clock() {
        let extractor = DateExtractor::new(ExtractionMode::Simple);
        let before = Local::now().date_naive();
        let resolved = extractor.reference_date();
        assert!(resolved >= before);
        assert!(resolved <= Local::now().date_naive());
    }

    #[test]
    fn test_month_names() {
        assert_eq!(keyword_date("Date: 5 Mar 2024"), "2024-03-05");
        assert_eq!(keyword_date("Order date March 15, 2024"), "2024-03-15");
        assert_eq!(keyword_date("Date 1 Sept 23"), "2023-09-01");
    }

    #[test]
    fn test_non_month_word_is_rejected() {
        assert_eq!(keyword_date("Date: Table 4 2023"), UNKNOWN_DATE);
    }

    #[test]
    fn test_future_year_rejected_then_fallback() {
        let text = "Date: 01/02/2030\nCoffee 3.50\nPrinted 05/06/2023";
        assert_eq!(keyword_date(text), "2023-05-06");
    }

    #[test]
    fn test_future_year_alone_is_unknown() {
        assert_eq!(keyword_date("Date: 01/02/2030"), UNKNOWN_DATE);
    }

    #[test]
    fn test_next_year_is_accepted() {
        assert_eq!(keyword_date("Due date 01/02/2025"), "2025-01-02");
    }

    #[test]
    fn test_label_pass_wins_over_earlier_unlabelled_date() {
        let text = "Printed 01/01/2020\nDate: 02/03/2021";
        let candidate = extractor_at(ExtractionMode::Keyword, ymd(2024, 6, 1))
            .extract(&RawText::new(text))
            .unwrap();
        assert_eq!(candidate.value, ymd(2021, 2, 3));
        assert_eq!(candidate.pass, "date_label");
    }

    #[test]
    fn test_two_digit_year_window() {
        assert_eq!(expand_year("24", 2024), Some(2024));
        assert_eq!(expand_year("99", 2024), Some(1999));
        assert_eq!(expand_year("73", 2024), Some(2073));
        assert_eq!(expand_year("74", 2024), Some(1974));
        assert_eq!(expand_year("2019", 2024), Some(2019));
    }

    #[test]
    fn test_parse_date_token() {
        assert_eq!(parse_date_token("12/31/23", 2024), Some(ymd(2023, 12, 31)));
        assert_eq!(parse_date_token("31 Foo 2023", 2024), None);
        assert_eq!(parse_date_token("02/30/2023", 2024), None);
    }

    #[test]
    fn test_month_from_name() {
        assert_eq!(month_from_name("DEC"), Some(12));
        assert_eq!(month_from_name("september"), Some(9));
        assert_eq!(month_from_name("Sept"), Some(9));
        assert_eq!(month_from_name("Ma"), None);
        assert_eq!(month_from_name("Marc"), None);
    }

    #[test]
    fn test_simple_mode_patterns_and_default() {
        let reference = ymd(2024, 6, 1);
        let extractor = extractor_at(ExtractionMode::Simple, reference);
        assert_eq!(
            extractor.extract_or_default(&RawText::new("Paid 12.24.2023")),
            "2023-12-24"
        );
        assert_eq!(
            extractor.extract_or_default(&RawText::new("no date here")),
            "2024-06-01"
        );
    }
}

//! Locating and parsing the date column of an uploaded table.
//!
//! Detection is a two-step policy:
//! 1. name match: the first column whose lowercased name contains one of
//!    [`DATE_NAME_TOKENS`];
//! 2. content match: otherwise the first column is accepted when each of its
//!    first [`DATE_SNIFF_SAMPLE`] values parses as a date.
//!
//! If neither step matches there is no date column.

use super::raw::{RawCell, RawTable};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Lowercase substrings that mark a column name as holding dates. The last
/// entry is the name readers give to an unnamed first column.
pub const DATE_NAME_TOKENS: [&str; 4] = ["дата", "date", "время", "unnamed: 0"];

/// Number of leading values checked by the content fallback.
pub const DATE_SNIFF_SAMPLE: usize = 5;

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y", "%d/%m/%Y"];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
];

/// How the date column was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateColumnMatch {
    /// Column name contains a date token
    ByName(usize),
    /// First column whose leading values parse as dates
    ByContent(usize),
}

impl DateColumnMatch {
    pub fn index(&self) -> usize {
        match self {
            DateColumnMatch::ByName(index) | DateColumnMatch::ByContent(index) => *index,
        }
    }
}

/// Returns true if `name` contains a date token (case-insensitive).
pub fn is_date_like_name(name: &str) -> bool {
    let lowered = name.to_lowercase();
    DATE_NAME_TOKENS.iter().any(|token| lowered.contains(token))
}

/// Applies the name-then-content policy to `raw`.
pub fn find_date_column(raw: &RawTable) -> Option<DateColumnMatch> {
    if let Some(index) = raw.headers().iter().position(|name| is_date_like_name(name)) {
        return Some(DateColumnMatch::ByName(index));
    }

    if raw.column_count() > 0 && leading_values_are_dates(raw, 0) {
        return Some(DateColumnMatch::ByContent(0));
    }

    None
}

/// True when the column has at least one row and each of its first
/// `DATE_SNIFF_SAMPLE` cells parses as a date.
pub fn leading_values_are_dates(raw: &RawTable, index: usize) -> bool {
    let mut sampled = 0;
    for cell in raw.column(index).take(DATE_SNIFF_SAMPLE) {
        if parse_date_cell(cell).is_none() {
            return false;
        }
        sampled += 1;
    }
    sampled > 0
}

/// True when every non-empty cell in the column parses as a date.
pub fn column_parses_as_dates(raw: &RawTable, index: usize) -> bool {
    raw.column(index)
        .filter(|cell| !cell.is_empty())
        .all(|cell| parse_date_cell(cell).is_some())
}

/// Interprets a cell as a calendar day.
///
/// Plain numbers are never dates; only spreadsheet date cells and text in one
/// of the accepted layouts are.
pub fn parse_date_cell(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::DateTime(value) => Some(value.date()),
        RawCell::Text(text) => parse_date_text(text),
        RawCell::Empty | RawCell::Number(_) | RawCell::Bool(_) => None,
    }
}

/// Parses a textual date, with or without a time part.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|value| value.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|value| value.date_naive())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> RawCell {
        RawCell::Text(value.to_string())
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_text_formats() {
        assert_eq!(parse_date_text("2024-03-05"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_text("2024/03/05"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_text("05.03.2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_text("03/05/2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_text("25/03/2024"), Some(ymd(2024, 3, 25)));
        assert_eq!(parse_date_text("2024-03-05 13:45:00"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_text("2024-03-05T00:00:00+03:00"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_text("Продукт"), None);
        assert_eq!(parse_date_text(""), None);
    }

    #[test]
    fn test_numbers_are_not_dates() {
        assert_eq!(parse_date_cell(&RawCell::Number(20240101.0)), None);
        assert_eq!(parse_date_cell(&RawCell::Empty), None);
    }

    #[test]
    fn test_date_name_tokens() {
        assert!(is_date_like_name("Дата"));
        assert!(is_date_like_name("DATE"));
        assert!(is_date_like_name("Дата продажи"));
        assert!(is_date_like_name("Время"));
        assert!(is_date_like_name("Unnamed: 0"));
        assert!(!is_date_like_name("Продукт_1"));
    }

    #[test]
    fn test_find_date_column_by_name_wins() {
        let raw = RawTable::new(
            vec!["Region".into(), "Date".into(), "Sales".into()],
            vec![vec![text("North"), text("2024-01-01"), RawCell::Number(1.0)]],
        );
        assert_eq!(find_date_column(&raw), Some(DateColumnMatch::ByName(1)));
    }

    #[test]
    fn test_find_date_column_by_content_fallback() {
        let raw = RawTable::new(
            vec!["day".into(), "Sales".into()],
            vec![
                vec![text("2024-01-01"), RawCell::Number(1.0)],
                vec![text("2024-01-02"), RawCell::Number(2.0)],
            ],
        );
        assert_eq!(find_date_column(&raw), Some(DateColumnMatch::ByContent(0)));
    }

    #[test]
    fn test_find_date_column_only_samples_leading_values() {
        let mut rows: Vec<Vec<RawCell>> = (1..=5)
            .map(|d| vec![text(&format!("2024-01-0{}", d)), RawCell::Number(1.0)])
            .collect();
        rows.push(vec![text("garbage"), RawCell::Number(1.0)]);
        let raw = RawTable::new(vec!["when".into(), "Sales".into()], rows);
        assert_eq!(find_date_column(&raw), Some(DateColumnMatch::ByContent(0)));
        assert!(!column_parses_as_dates(&raw, 0));
    }

    #[test]
    fn test_find_date_column_none() {
        let raw = RawTable::new(
            vec!["Product".into(), "Sales".into()],
            vec![vec![text("Widget"), RawCell::Number(1.0)]],
        );
        assert_eq!(find_date_column(&raw), None);

        let no_rows = RawTable::new(vec!["Product".into()], vec![]);
        assert_eq!(find_date_column(&no_rows), None);
    }
}

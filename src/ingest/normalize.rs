use super::dates::{find_date_column, parse_date_cell, DateColumnMatch};
use super::error::FormatError;
use super::raw::{RawCell, RawTable};
use crate::sales_table::{Column, SalesTable, TableError, DATE_COLUMN};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Turns a raw table into a date-indexed `SalesTable`.
///
/// Steps: locate the date column, rename it to [`DATE_COLUMN`], parse every
/// date (rows with an empty date cell are dropped), reject repeated dates,
/// keep the numeric columns and require at least one of them.
pub fn normalize(raw: &RawTable) -> Result<SalesTable, FormatError> {
    if raw.is_empty() {
        return Err(FormatError::EmptyTable);
    }

    let date_match = find_date_column(raw).ok_or(FormatError::NoDateColumn)?;
    let date_index = date_match.index();
    let date_name = &raw.headers()[date_index];
    match date_match {
        DateColumnMatch::ByName(_) => debug!("Date column '{}' matched by name", date_name),
        DateColumnMatch::ByContent(_) => {
            debug!("Date column '{}' matched by content", date_name)
        }
    }
    if date_name != DATE_COLUMN {
        debug!("Renaming date column '{}' to '{}'", date_name, DATE_COLUMN);
    }

    let mut kept_rows = Vec::with_capacity(raw.row_count());
    let mut dates = Vec::with_capacity(raw.row_count());
    let mut seen = HashSet::with_capacity(raw.row_count());
    for (row_index, row) in raw.rows().iter().enumerate() {
        let cell = &row[date_index];
        if cell.is_empty() {
            continue;
        }
        let date = parse_date_cell(cell).ok_or_else(|| {
            FormatError::UnparseableDates(format!(
                "row {} has value {}",
                row_index + 1,
                describe_cell(cell)
            ))
        })?;
        if !seen.insert(date) {
            return Err(FormatError::DuplicateDates(date));
        }
        dates.push(date);
        kept_rows.push(row_index);
    }

    let dropped = raw.row_count() - kept_rows.len();
    if dropped > 0 {
        warn!("Dropped {} row(s) without a date", dropped);
    }

    let mut columns = Vec::new();
    for (index, name) in raw.headers().iter().enumerate() {
        if index == date_index {
            continue;
        }
        if !raw.is_numeric_column(index) {
            warn!("Skipping non-numeric column '{}'", name);
            continue;
        }
        let values = kept_rows
            .iter()
            .map(|&row| raw.rows()[row][index].as_number().unwrap_or(f64::NAN))
            .collect();
        columns.push(Column::new(name.clone(), values));
    }

    if columns.is_empty() {
        return Err(FormatError::NoNumericData);
    }

    SalesTable::new(dates, columns).map_err(|err| match err {
        TableError::DuplicateDate(date) => FormatError::DuplicateDates(date),
        other => FormatError::UnparseableDates(other.to_string()),
    })
}

fn describe_cell(cell: &RawCell) -> String {
    match cell {
        RawCell::Text(text) => format!("'{}'", text),
        RawCell::Number(value) => value.to_string(),
        RawCell::Bool(value) => value.to_string(),
        RawCell::DateTime(value) => value.to_string(),
        RawCell::Empty => "<empty>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(value: &str) -> RawCell {
        RawCell::Text(value.to_string())
    }

    fn num(value: f64) -> RawCell {
        RawCell::Number(value)
    }

    #[test]
    fn test_normalize_named_date_column() {
        let raw = RawTable::new(
            vec!["Date".into(), "Продукт_1".into(), "Продукт_2".into()],
            vec![
                vec![text("2024-01-01"), num(100.0), num(80.0)],
                vec![text("2024-01-02"), num(120.0), RawCell::Empty],
            ],
        );
        let table = normalize(&raw).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_names(), vec!["Продукт_1", "Продукт_2"]);
        assert!(!table.has_column("Date"));
        assert!(!table.has_column(DATE_COLUMN));
        assert_eq!(table.dates()[1], NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert!(table.column("Продукт_2").unwrap().values[1].is_nan());
    }

    #[test]
    fn test_normalize_drops_text_columns_and_empty_dates() {
        let raw = RawTable::new(
            vec!["Дата".into(), "Comment".into(), "Sales".into()],
            vec![
                vec![text("2024-01-01"), text("promo"), num(1.0)],
                vec![RawCell::Empty, text("blank"), num(2.0)],
                vec![text("2024-01-03"), RawCell::Empty, num(3.0)],
            ],
        );
        let table = normalize(&raw).unwrap();
        assert_eq!(table.column_names(), vec!["Sales"]);
        assert_eq!(table.column("Sales").unwrap().values, vec![1.0, 3.0]);
    }

    #[test]
    fn test_normalize_no_date_column() {
        let raw = RawTable::new(
            vec!["Product".into(), "Sales".into()],
            vec![vec![text("Widget"), num(1.0)]],
        );
        assert_eq!(normalize(&raw).unwrap_err(), FormatError::NoDateColumn);
    }

    #[test]
    fn test_normalize_unparseable_dates() {
        let raw = RawTable::new(
            vec!["Date".into(), "Sales".into()],
            vec![
                vec![text("2024-01-01"), num(1.0)],
                vec![text("yesterday"), num(2.0)],
            ],
        );
        let err = normalize(&raw).unwrap_err();
        assert!(matches!(err, FormatError::UnparseableDates(ref detail) if detail.contains("yesterday")));
    }

    #[test]
    fn test_normalize_duplicate_dates() {
        let raw = RawTable::new(
            vec!["Date".into(), "Sales".into()],
            vec![
                vec![text("2024-01-01"), num(1.0)],
                vec![text("01.01.2024"), num(2.0)],
            ],
        );
        assert_eq!(
            normalize(&raw).unwrap_err(),
            FormatError::DuplicateDates(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
    }

    #[test]
    fn test_normalize_requires_numeric_data() {
        let raw = RawTable::new(
            vec!["Date".into(), "Note".into()],
            vec![vec![text("2024-01-01"), text("closed")]],
        );
        assert_eq!(normalize(&raw).unwrap_err(), FormatError::NoNumericData);
    }

    #[test]
    fn test_normalize_empty_table() {
        assert_eq!(
            normalize(&RawTable::default()).unwrap_err(),
            FormatError::EmptyTable
        );
    }
}

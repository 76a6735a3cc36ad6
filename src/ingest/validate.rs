//! Advisory checks on a raw table before it is normalized.
//!
//! Nothing here fails: problems are reported in a [`FormatValidation`] so the
//! caller can decide whether to go on with the file.

use super::dates::{column_parses_as_dates, find_date_column, leading_values_are_dates};
use super::error::FormatError;
use super::raw::RawTable;
use serde::{Serialize, Serializer};

/// Non-blocking data-quality issue.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    /// Only one numeric column, so products cannot be compared
    SingleNumericColumn,
    /// The first column does not look like dates
    FirstColumnNotDates(String),
    /// The first column is a date column but some values do not parse
    FirstColumnInvalidDates(String),
    /// Column contains values below zero
    NegativeValues(String),
    /// Columns with at least one missing cell
    MissingValues(Vec<String>),
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationWarning::SingleNumericColumn => write!(
                f,
                "Only one numeric column found. Several products are recommended for comparison"
            ),
            ValidationWarning::FirstColumnNotDates(column) => {
                write!(f, "First column '{}' is not recognised as dates", column)
            }
            ValidationWarning::FirstColumnInvalidDates(column) => {
                write!(f, "First column '{}' may contain invalid dates", column)
            }
            ValidationWarning::NegativeValues(column) => {
                write!(f, "Column '{}' contains negative values", column)
            }
            ValidationWarning::MissingValues(columns) => {
                write!(f, "Missing values in columns: {}", columns.join(", "))
            }
        }
    }
}

impl Serialize for ValidationWarning {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of [`validate_file_format`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatValidation {
    pub is_valid: bool,
    pub errors: Vec<FormatError>,
    pub warnings: Vec<ValidationWarning>,
    pub suggestions: Vec<String>,
}

const SUGGESTIONS: [&str; 3] = [
    "Make sure the first column holds dates in YYYY-MM-DD format",
    "Numeric columns should hold sales or session counts",
    "Use descriptive column names (for example 'Продукт_1', 'Продукт_2')",
];

/// Inspects `raw` and reports blocking errors, warnings and suggestions.
pub fn validate_file_format(raw: &RawTable) -> FormatValidation {
    let mut validation = FormatValidation {
        is_valid: true,
        errors: Vec::new(),
        warnings: Vec::new(),
        suggestions: Vec::new(),
    };

    if raw.is_empty() {
        validation.is_valid = false;
        validation.errors.push(FormatError::EmptyTable);
        return validation;
    }

    let date_match = find_date_column(raw);
    let first_column = &raw.headers()[0];
    match date_match {
        None => {
            validation.is_valid = false;
            validation.errors.push(FormatError::NoDateColumn);
        }
        Some(found) if found.index() == 0 => {
            if !column_parses_as_dates(raw, 0) {
                validation
                    .warnings
                    .push(ValidationWarning::FirstColumnInvalidDates(first_column.clone()));
            }
        }
        Some(_) => {
            if !leading_values_are_dates(raw, 0) {
                validation
                    .warnings
                    .push(ValidationWarning::FirstColumnNotDates(first_column.clone()));
            }
        }
    }

    let date_index = date_match.map(|found| found.index());
    let numeric: Vec<usize> = (0..raw.column_count())
        .filter(|&index| Some(index) != date_index && raw.is_numeric_column(index))
        .collect();

    if numeric.is_empty() {
        validation.is_valid = false;
        validation.errors.push(FormatError::NoNumericData);
    } else if numeric.len() < 2 {
        validation.warnings.push(ValidationWarning::SingleNumericColumn);
    }

    for &index in &numeric {
        let has_negative = raw
            .column(index)
            .filter_map(|cell| cell.as_number())
            .any(|value| value < 0.0);
        if has_negative {
            validation
                .warnings
                .push(ValidationWarning::NegativeValues(raw.headers()[index].clone()));
        }
    }

    let missing: Vec<String> = raw
        .headers()
        .iter()
        .enumerate()
        .filter(|(index, _)| raw.column(*index).any(|cell| cell.is_empty()))
        .map(|(_, name)| name.clone())
        .collect();
    if !missing.is_empty() {
        validation.warnings.push(ValidationWarning::MissingValues(missing));
    }

    validation.suggestions = SUGGESTIONS.iter().map(|s| s.to_string()).collect();
    validation
}

/// What an uploaded file is expected to look like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatRequirements {
    pub file_types: &'static str,
    pub structure: &'static str,
    pub date_format: &'static str,
    pub encoding: &'static str,
    pub required_columns: &'static str,
    pub example_columns: &'static str,
    pub data_requirements: &'static str,
}

pub fn file_format_requirements() -> FormatRequirements {
    FormatRequirements {
        file_types: "Excel (.xlsx, .xls) or CSV (.csv)",
        structure: "First column holds dates, the remaining columns hold numeric data",
        date_format: "YYYY-MM-DD or standard Excel date cells",
        encoding: "UTF-8 (for CSV files)",
        required_columns: "At least 2 columns: dates and numeric data",
        example_columns: "Дата, Продукт_1, Продукт_2, Продукт_3",
        data_requirements: "Non-negative numeric values, no gaps in the dates",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::raw::RawCell;

    fn text(value: &str) -> RawCell {
        RawCell::Text(value.to_string())
    }

    fn num(value: f64) -> RawCell {
        RawCell::Number(value)
    }

    #[test]
    fn test_valid_file_has_no_errors() {
        let raw = RawTable::new(
            vec!["Дата".into(), "A".into(), "B".into()],
            vec![
                vec![text("2024-01-01"), num(1.0), num(2.0)],
                vec![text("2024-01-02"), num(3.0), num(4.0)],
            ],
        );
        let validation = validate_file_format(&raw);
        assert!(validation.is_valid);
        assert!(validation.errors.is_empty());
        assert!(validation.warnings.is_empty());
        assert_eq!(validation.suggestions.len(), 3);
    }

    #[test]
    fn test_empty_table_is_invalid() {
        let validation = validate_file_format(&RawTable::default());
        assert!(!validation.is_valid);
        assert_eq!(validation.errors, vec![FormatError::EmptyTable]);
    }

    #[test]
    fn test_missing_date_and_numeric_columns() {
        let raw = RawTable::new(
            vec!["Product".into(), "Region".into()],
            vec![vec![text("Widget"), text("North")]],
        );
        let validation = validate_file_format(&raw);
        assert!(!validation.is_valid);
        assert_eq!(
            validation.errors,
            vec![FormatError::NoDateColumn, FormatError::NoNumericData]
        );
    }

    #[test]
    fn test_warnings_are_additive() {
        let raw = RawTable::new(
            vec!["Дата".into(), "A".into()],
            vec![
                vec![text("2024-01-01"), num(-5.0)],
                vec![text("not a date"), RawCell::Empty],
            ],
        );
        let validation = validate_file_format(&raw);
        assert!(validation.is_valid);
        assert_eq!(
            validation.warnings,
            vec![
                ValidationWarning::FirstColumnInvalidDates("Дата".into()),
                ValidationWarning::SingleNumericColumn,
                ValidationWarning::NegativeValues("A".into()),
                ValidationWarning::MissingValues(vec!["A".into()]),
            ]
        );
    }

    #[test]
    fn test_first_column_not_dates_when_date_column_elsewhere() {
        let raw = RawTable::new(
            vec!["Region".into(), "Date".into(), "A".into(), "B".into()],
            vec![vec![text("North"), text("2024-01-01"), num(1.0), num(2.0)]],
        );
        let validation = validate_file_format(&raw);
        assert!(validation.is_valid);
        assert_eq!(
            validation.warnings,
            vec![ValidationWarning::FirstColumnNotDates("Region".into())]
        );
    }

    #[test]
    fn test_serializes_messages() {
        let raw = RawTable::new(vec!["Product".into()], vec![vec![text("x")]]);
        let json = serde_json::to_value(validate_file_format(&raw)).unwrap();
        assert_eq!(json["is_valid"], false);
        assert!(json["errors"][0].as_str().unwrap().contains("Date column not found"));
    }
}

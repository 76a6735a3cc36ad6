use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Canonical name of the date column once a file has been normalized.
pub const DATE_COLUMN: &str = "Дата";

/// Date range for filtering sales data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start date (inclusive)
    pub start: NaiveDate,
    /// End date (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new DateRange.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// One tracked numeric series. Missing values are stored as `f64::NAN`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }

    /// Number of non-missing values.
    pub fn count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }
}

/// A date-indexed table of daily sales, one numeric column per product.
///
/// The table is immutable once built: analysis functions take `&SalesTable`
/// and hand back new values.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SalesTable {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl SalesTable {
    /// Builds a table, checking that every column lines up with the index,
    /// that column names are distinct and that the index has no repeats.
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<Column>) -> Result<Self, TableError> {
        let mut seen_dates = HashSet::with_capacity(dates.len());
        for date in &dates {
            if !seen_dates.insert(*date) {
                return Err(TableError::DuplicateDate(*date));
            }
        }

        let mut table = SalesTable {
            dates,
            columns: Vec::with_capacity(columns.len()),
        };
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// The empty table returned when nothing usable could be loaded.
    pub fn empty() -> Self {
        SalesTable::default()
    }

    /// Appends a column to the right of the existing ones.
    pub(crate) fn push_column(&mut self, column: Column) -> Result<(), TableError> {
        if column.values.len() != self.dates.len() {
            return Err(TableError::LengthMismatch {
                column: column.name,
                expected: self.dates.len(),
                actual: column.values.len(),
            });
        }
        if self.has_column(&column.name) {
            return Err(TableError::DuplicateColumn(column.name));
        }
        self.columns.push(column);
        Ok(())
    }

    /// A table is empty when it has no rows or no data columns.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.columns.is_empty()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Row-wise sum across all columns, skipping missing cells.
    ///
    /// A row where every cell is missing sums to `0.0`.
    pub fn daily_totals(&self) -> Vec<f64> {
        (0..self.dates.len())
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| c.values[row])
                    .filter(|v| !v.is_nan())
                    .sum()
            })
            .collect()
    }

    /// Earliest and latest dates in the index, or `None` for an empty index.
    pub fn date_range(&self) -> Option<DateRange> {
        let start = self.dates.iter().min()?;
        let end = self.dates.iter().max()?;
        Some(DateRange::new(*start, *end))
    }

    /// Keeps the rows whose date falls inside `range` (inclusive on both ends).
    ///
    /// # Errors
    /// Returns `TableError::InvalidDateRange` if `range.start > range.end`.
    pub fn filter_by_date_range(&self, range: &DateRange) -> Result<SalesTable, TableError> {
        if range.start > range.end {
            return Err(TableError::InvalidDateRange);
        }
        if self.dates.is_empty() {
            return Ok(self.clone());
        }

        let keep: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, date)| range.contains(**date))
            .map(|(row, _)| row)
            .collect();

        let dates = keep.iter().map(|&row| self.dates[row]).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), keep.iter().map(|&row| c.values[row]).collect()))
            .collect();

        Ok(SalesTable { dates, columns })
    }

    /// Total number of missing cells across all columns.
    pub fn missing_count(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.values.len() - c.count())
            .sum()
    }

    /// Overview shown next to a freshly loaded file.
    pub fn summary(&self) -> DataSummary {
        DataSummary {
            total_rows: self.len(),
            date_range: self.date_range().map(|range| {
                format!(
                    "{} - {}",
                    range.start.format("%Y-%m-%d"),
                    range.end.format("%Y-%m-%d")
                )
            }),
            columns: self.columns.iter().map(|c| c.name.clone()).collect(),
            total_missing_values: self.missing_count(),
        }
    }
}

/// Short description of a loaded table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub total_rows: usize,
    pub date_range: Option<String>,
    pub columns: Vec<String>,
    pub total_missing_values: usize,
}

/// Errors raised while building or slicing a `SalesTable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A column's length differs from the index length
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    /// Two columns share a name
    DuplicateColumn(String),
    /// The same date appears twice in the index
    DuplicateDate(NaiveDate),
    /// Start date is after end date
    InvalidDateRange,
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::LengthMismatch {
                column,
                expected,
                actual,
            } => write!(
                f,
                "Column '{}' has {} values but the index has {} dates",
                column, actual, expected
            ),
            TableError::DuplicateColumn(name) => write!(f, "Duplicate column '{}'", name),
            TableError::DuplicateDate(date) => write!(f, "Duplicate date {}", date),
            TableError::InvalidDateRange => write!(f, "Start date cannot be after end date"),
        }
    }
}

impl std::error::Error for TableError {}

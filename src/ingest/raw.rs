//! Untyped tables as read from disk, before date sniffing and normalization.

use super::error::FormatError;
use calamine::{Data, ExcelDateTime, Reader};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serial of 9999-12-31, the last day a workbook can hold.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Markers a reader treats as a missing value (compared case-insensitively).
const MISSING_MARKERS: [&str; 7] = ["", "na", "n/a", "#n/a", "nan", "null", "none"];

/// A single cell of a raw table.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Number(f64),
    Text(String),
    /// Cell stored as a date by the spreadsheet itself
    DateTime(NaiveDateTime),
    Bool(bool),
}

impl RawCell {
    /// Classifies a text field the way a delimited-text reader would.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if MISSING_MARKERS
            .iter()
            .any(|marker| trimmed.eq_ignore_ascii_case(marker))
        {
            return RawCell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => RawCell::Number(value),
            _ => RawCell::Text(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RawCell::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawCell::Number(value) => Some(*value),
            _ => None,
        }
    }
}

/// Header row plus rows of cells, padded to the header width.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    /// Builds a table. Blank headers become `Unnamed: <position>`, repeated
    /// headers get a `.1`, `.2`, ... suffix and short rows are padded with
    /// empty cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<RawCell>>) -> Self {
        let headers = dedupe_headers(headers);
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, RawCell::Empty);
                row
            })
            .collect();
        RawTable { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no columns or no data rows.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<RawCell>] {
        &self.rows
    }

    /// Iterates over the cells of column `index`, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &RawCell> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// A column is numeric when every non-empty cell holds a number.
    pub fn is_numeric_column(&self, index: usize) -> bool {
        index < self.headers.len()
            && self
                .column(index)
                .all(|cell| cell.is_empty() || cell.as_number().is_some())
    }
}

fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(position, header)| {
            let trimmed = header.trim();
            let base = if trimmed.is_empty() {
                format!("Unnamed: {}", position)
            } else {
                trimmed.to_string()
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while !seen.insert(name.clone()) {
                name = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            name
        })
        .collect()
}

/// Reader selected from a file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Spreadsheet,
    Csv,
}

impl FileKind {
    /// Dispatches on the (case-insensitive) extension of `filename`.
    ///
    /// # Errors
    /// `FormatError::UnsupportedFormat` for anything other than .xlsx, .xls or .csv.
    pub fn from_filename(filename: &str) -> Result<Self, FormatError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "xlsx" | "xls" => Ok(FileKind::Spreadsheet),
            "csv" => Ok(FileKind::Csv),
            _ => Err(FormatError::UnsupportedFormat(format!(".{}", extension))),
        }
    }
}

/// Reads `bytes` with the reader chosen by `filename`'s extension.
pub fn read_raw(filename: &str, bytes: &[u8]) -> Result<RawTable, FormatError> {
    match FileKind::from_filename(filename)? {
        FileKind::Csv => read_csv(bytes),
        FileKind::Spreadsheet => read_spreadsheet(bytes),
    }
}

/// Parses UTF-8 delimited text with a header row.
pub fn read_csv(bytes: &[u8]) -> Result<RawTable, FormatError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(FormatError::EmptyTable);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(RawCell::from_text).collect());
    }

    Ok(RawTable::new(headers, rows))
}

/// Reads the first worksheet of an Excel workbook; the first row is the header.
pub fn read_spreadsheet(bytes: &[u8]) -> Result<RawTable, FormatError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(FormatError::EmptyTable)??;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(header_text).collect(),
        None => return Err(FormatError::EmptyTable),
    };

    let rows = rows
        .map(|row| row.iter().map(spreadsheet_cell).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(RawCell::is_empty))
        .collect();

    Ok(RawTable::new(headers, rows))
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

pub(crate) fn spreadsheet_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::Int(value) => RawCell::Number(*value as f64),
        Data::Float(value) => RawCell::Number(*value),
        Data::Bool(value) => RawCell::Bool(*value),
        Data::String(text) if text.trim().is_empty() => RawCell::Empty,
        Data::String(text) => RawCell::Text(text.trim().to_string()),
        Data::DateTime(value) if value.is_duration() => RawCell::Number(value.as_f64()),
        Data::DateTime(value) => excel_datetime(value),
        Data::DateTimeIso(text) | Data::DurationIso(text) => RawCell::Text(text.clone()),
    }
}

/// Date-formatted cell to a timestamp, honouring the workbook's 1900/1904
/// date system. Serials outside the calendar Excel supports are kept as text
/// so that the date column fails to parse instead of silently losing rows.
fn excel_datetime(value: &ExcelDateTime) -> RawCell {
    let serial = value.as_f64();
    if !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return RawCell::Text(serial.to_string());
    }
    match value.as_datetime() {
        Some(timestamp) => RawCell::DateTime(timestamp),
        None => RawCell::Text(serial.to_string()),
    }
}

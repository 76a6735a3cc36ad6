use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Broad class of an ingestion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// The requested file does not exist or could not be read
    NotFound,
    /// The file exists but its contents cannot be turned into a sales table
    FormatError,
}

/// Errors that can occur while loading a sales file.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    /// Explicit path that does not exist
    NotFound(String),
    /// No file was supplied and the bundled default is absent
    NoDataSupplied,
    /// Reading the file failed
    Io(String),
    /// The file contents are not a usable sales table
    Format(FormatError),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::NotFound(_) | IngestError::NoDataSupplied | IngestError::Io(_) => {
                ErrorKind::NotFound
            }
            IngestError::Format(_) => ErrorKind::FormatError,
        }
    }
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::NotFound(path) => write!(f, "File {} not found", path),
            IngestError::NoDataSupplied => {
                write!(f, "Data file not found. Please upload a file.")
            }
            IngestError::Io(msg) => write!(f, "Failed to read file: {}", msg),
            IngestError::Format(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::Format(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FormatError> for IngestError {
    fn from(err: FormatError) -> Self {
        IngestError::Format(err)
    }
}

/// Problems with the shape or content of an input file.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// Extension is not one of .xlsx, .xls, .csv
    UnsupportedFormat(String),
    /// The file has no header or no cells at all
    EmptyTable,
    /// Neither the column names nor the first column look like dates
    NoDateColumn,
    /// The date column holds a value that is not a date
    UnparseableDates(String),
    /// The same date appears on more than one row
    DuplicateDates(NaiveDate),
    /// No column holds numeric data
    NoNumericData,
    /// The CSV reader rejected the file
    Csv(String),
    /// The spreadsheet reader rejected the file
    Spreadsheet(String),
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::UnsupportedFormat(ext) => write!(
                f,
                "Unsupported file format: '{}'. Supported: .xlsx, .xls, .csv",
                ext
            ),
            FormatError::EmptyTable => write!(f, "File is empty or contains no data"),
            FormatError::NoDateColumn => write!(
                f,
                "Date column not found. Expected a column named 'Дата' or 'Date', or dates in the first column"
            ),
            FormatError::UnparseableDates(detail) => {
                write!(f, "Cannot convert column to dates: {}", detail)
            }
            FormatError::DuplicateDates(date) => {
                write!(f, "Date {} appears on more than one row", date)
            }
            FormatError::NoNumericData => write!(f, "No numeric sales columns found"),
            FormatError::Csv(msg) => write!(f, "CSV error: {}", msg),
            FormatError::Spreadsheet(msg) => write!(f, "Spreadsheet error: {}", msg),
        }
    }
}

impl std::error::Error for FormatError {}

impl Serialize for FormatError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<csv::Error> for FormatError {
    fn from(err: csv::Error) -> Self {
        FormatError::Csv(err.to_string())
    }
}

impl From<calamine::Error> for FormatError {
    fn from(err: calamine::Error) -> Self {
        FormatError::Spreadsheet(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(IngestError::NotFound("x.csv".into()).kind(), ErrorKind::NotFound);
        assert_eq!(IngestError::NoDataSupplied.kind(), ErrorKind::NotFound);
        assert_eq!(
            IngestError::Format(FormatError::NoDateColumn).kind(),
            ErrorKind::FormatError
        );
    }

    #[test]
    fn test_display_carries_detail() {
        let err = IngestError::from(FormatError::UnsupportedFormat(".txt".into()));
        assert!(err.to_string().contains(".txt"));
        assert!(IngestError::NotFound("data.xlsx".into())
            .to_string()
            .contains("data.xlsx"));
    }

    #[test]
    fn test_format_error_serializes_as_message() {
        let json = serde_json::to_string(&FormatError::NoNumericData).unwrap();
        assert_eq!(json, "\"No numeric sales columns found\"");
    }
}

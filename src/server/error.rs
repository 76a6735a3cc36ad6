//! Error types for the REST API server

use crate::analytics::AnalysisError;
use crate::ingest::{FormatValidation, IngestError};
use crate::sales_table::TableError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// No dataset registered under this id
    DatasetNotFound(Uuid),
    /// Requested file does not exist, or no default file is available
    FileNotFound(String),
    /// The file was read but its contents cannot be used
    InvalidFormat(String),
    /// The file was read but rejected; carries the full validation report
    RejectedFile(String, FormatValidation),
    /// Invalid parameter in request
    InvalidParameter(String),
    /// Invalid date range
    InvalidDateRange(String),
    /// Internal server error
    InternalError(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::DatasetNotFound(id) => write!(f, "Dataset not found: {}", id),
            ApiError::FileNotFound(msg) => write!(f, "File not found: {}", msg),
            ApiError::InvalidFormat(msg) | ApiError::RejectedFile(msg, _) => {
                write!(f, "Invalid format: {}", msg)
            }
            ApiError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            ApiError::InvalidDateRange(msg) => write!(f, "Invalid date range: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::DatasetNotFound(_) | ApiError::FileNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidFormat(_) | ApiError::RejectedFile(..) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::InvalidParameter(_) | ApiError::InvalidDateRange(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::DatasetNotFound(_) => "DatasetNotFound",
            ApiError::FileNotFound(_) => "FileNotFound",
            ApiError::InvalidFormat(_) | ApiError::RejectedFile(..) => "InvalidFormat",
            ApiError::InvalidParameter(_) => "InvalidParameter",
            ApiError::InvalidDateRange(_) => "InvalidDateRange",
            ApiError::InternalError(_) => "InternalError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::DatasetNotFound(id) => format!("Dataset '{}' not found", id),
            ApiError::FileNotFound(msg)
            | ApiError::InvalidFormat(msg)
            | ApiError::RejectedFile(msg, _)
            | ApiError::InvalidParameter(msg)
            | ApiError::InvalidDateRange(msg)
            | ApiError::InternalError(msg) => msg.clone(),
        };

        if self.status().is_server_error() {
            tracing::error!("{}", self);
        }

        let mut body = json!({
            "error": self.error_type(),
            "message": message,
        });
        if let ApiError::RejectedFile(_, validation) = &self {
            body["validation"] = json!(validation);
        }

        (self.status(), Json(body)).into_response()
    }
}

// Conversions from other error types

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::NotFound(_) | IngestError::NoDataSupplied => {
                ApiError::FileNotFound(err.to_string())
            }
            IngestError::Format(_) => ApiError::InvalidFormat(err.to_string()),
            IngestError::Io(_) => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Table(table_err) => table_err.into(),
            _ => ApiError::InvalidParameter(err.to_string()),
        }
    }
}

impl From<TableError> for ApiError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::InvalidDateRange => ApiError::InvalidDateRange(err.to_string()),
            _ => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        ApiError::InternalError(format!("CSV export failed: {}", err))
    }
}

impl From<chrono::ParseError> for ApiError {
    fn from(err: chrono::ParseError) -> Self {
        ApiError::InvalidDateRange(format!("Date parse error: {}", err))
    }
}

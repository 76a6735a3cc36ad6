//! Analytics Functions
//!
//! Pure functions over a normalized [`SalesTable`](crate::SalesTable):
//! per-column statistics, KPIs, rolling averages, anomaly detection,
//! correlation, seasonal decomposition and generated insights. None of them
//! mutate their input; every result is a fresh value.

pub mod anomalies;
pub mod correlation;
pub mod insights;
pub mod kpi;
pub mod primitives;
pub mod rolling;
pub mod seasonal;
pub mod statistics;
pub mod windows;

pub use anomalies::{detect_anomalies, Anomaly, AnomalyList, AnomalyMethod};
pub use correlation::{correlation_matrix, CorrelationMatrix};
pub use insights::{generate_insights, Insight};
pub use kpi::{growth_rate, kpi_metrics, KpiSet};
pub use rolling::moving_average;
pub use seasonal::{seasonal_decomposition, SeasonalDecomposition};
pub use statistics::{basic_statistics, ColumnStatistics, ColumnSummary};

use crate::sales_table::TableError;

/// Default rolling-average window, in rows.
pub const DEFAULT_MA_WINDOW: usize = 7;
/// Default anomaly threshold (z-score units or IQR multiples).
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.0;
/// Default seasonal period, in rows.
pub const DEFAULT_SEASONAL_PERIOD: usize = 12;

/// Errors raised by analysis functions on invalid parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Rolling window of zero rows
    InvalidWindow,
    /// Named column is not in the table
    UnknownColumn(String),
    /// Seasonal period shorter than two rows
    InvalidPeriod(usize),
    /// Not enough observations for the requested analysis
    InsufficientData { required: usize, available: usize },
    /// A derived table could not be assembled
    Table(TableError),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::InvalidWindow => write!(f, "Window size must be greater than 0"),
            AnalysisError::UnknownColumn(name) => write!(f, "Column '{}' not found", name),
            AnalysisError::InvalidPeriod(period) => {
                write!(f, "Seasonal period must be at least 2, got {}", period)
            }
            AnalysisError::InsufficientData {
                required,
                available,
            } => write!(
                f,
                "Not enough data: {} values required, {} available",
                required, available
            ),
            AnalysisError::Table(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<TableError> for AnalysisError {
    fn from(err: TableError) -> Self {
        AnalysisError::Table(err)
    }
}

pub mod sales_table;
pub mod ingest;
pub mod analytics;
pub mod export;
pub mod server;


pub use sales_table::{Column, DataSummary, DateRange, SalesTable, TableError, DATE_COLUMN};
pub use ingest::{
    file_format_requirements, load_sales_data, validate_file_format, ErrorKind, FormatError,
    FormatValidation, IngestCache, IngestError, Ingestor, RawTable, SalesSource,
    ValidationWarning,
};
pub use analytics::{
    basic_statistics, correlation_matrix, detect_anomalies, generate_insights, kpi_metrics,
    moving_average, seasonal_decomposition, AnalysisError, AnomalyMethod, ColumnStatistics,
    CorrelationMatrix, KpiSet,
};
pub use export::{export_csv, export_filename};
pub use server::{run_server, ServerConfig, AppState, ApiError};

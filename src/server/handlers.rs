//! HTTP request handlers for API endpoints

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use super::error::ApiError;
use super::state::{AppState, Dataset};
use crate::analytics::{
    basic_statistics, correlation_matrix, detect_anomalies, generate_insights, kpi_metrics,
    moving_average, seasonal_decomposition, AnomalyList, AnomalyMethod, ColumnStatistics,
    CorrelationMatrix, KpiSet, SeasonalDecomposition, DEFAULT_ANOMALY_THRESHOLD,
    DEFAULT_MA_WINDOW, DEFAULT_SEASONAL_PERIOD,
};
use crate::export::{export_csv, export_filename};
use crate::ingest::{file_format_requirements, FormatRequirements, FormatValidation, SalesSource};
use crate::sales_table::{DataSummary, DateRange, SalesTable};

/// Health check endpoint
///
/// Returns a simple status response to verify the server is running
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}

/// GET /requirements - What an uploaded file should look like
pub async fn get_requirements() -> Json<FormatRequirements> {
    Json(file_format_requirements())
}

// Dataset management

/// Response for a newly registered dataset
#[derive(Debug, Serialize)]
pub struct DatasetResponse {
    pub dataset_id: String,
    pub source: String,
    pub summary: DataSummary,
    pub validation: FormatValidation,
}

/// Body of POST /datasets/load
#[derive(Debug, Default, Deserialize)]
pub struct LoadRequest {
    /// Local file to load; the default dataset when absent
    #[serde(default)]
    pub path: Option<String>,
}

/// Validates, loads and registers `source` under a fresh id.
async fn register_dataset(
    state: &AppState,
    source: SalesSource,
    label: String,
) -> Result<DatasetResponse, ApiError> {
    let loaded = state.ingestor.lock().await.load_validated(&source)?;
    let validation = loaded.validation;
    let table = match loaded.table {
        Ok(table) => table,
        Err(err) => {
            tracing::warn!("Rejected {}: {}", label, err);
            return Err(ApiError::RejectedFile(err.to_string(), validation));
        }
    };

    let id = Uuid::new_v4();
    let summary = table.summary();
    tracing::info!(
        "Registered dataset {} from {} ({} rows, {} warnings)",
        id,
        label,
        summary.total_rows,
        validation.warnings.len()
    );

    let dataset = Dataset {
        id,
        source: label.clone(),
        table,
        cache_key: loaded.key,
        loaded_at: Utc::now(),
    };
    state.datasets.write().await.insert(id, dataset);

    Ok(DatasetResponse {
        dataset_id: id.to_string(),
        source: label,
        summary,
        validation,
    })
}

/// POST /datasets/upload/{filename} - Register an uploaded file (raw body)
pub async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    body: Bytes,
) -> Result<Json<DatasetResponse>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::InvalidParameter("Uploaded file is empty".to_string()));
    }
    let source = SalesSource::upload(filename.clone(), body.to_vec());
    Ok(Json(register_dataset(&state, source, filename).await?))
}

/// POST /datasets/load - Register a local file, or the default dataset
pub async fn load_dataset(
    State(state): State<Arc<AppState>>,
    request: Option<Json<LoadRequest>>,
) -> Result<Json<DatasetResponse>, ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let (source, label) = match request.path {
        Some(path) => (SalesSource::Path(PathBuf::from(&path)), path),
        None => {
            let default_path = state.ingestor.lock().await.default_path().display().to_string();
            (SalesSource::Default, default_path)
        }
    };
    Ok(Json(register_dataset(&state, source, label).await?))
}

/// Entry of GET /datasets
#[derive(Debug, Serialize)]
pub struct DatasetInfo {
    pub dataset_id: String,
    pub source: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub loaded_at: String,
}

/// GET /datasets - List registered datasets, oldest first
pub async fn list_datasets(State(state): State<Arc<AppState>>) -> Json<Vec<DatasetInfo>> {
    let datasets = state.datasets.read().await;
    let mut entries: Vec<&Dataset> = datasets.values().collect();
    entries.sort_by_key(|d| d.loaded_at);

    Json(
        entries
            .into_iter()
            .map(|d| DatasetInfo {
                dataset_id: d.id.to_string(),
                source: d.source.clone(),
                rows: d.table.len(),
                columns: d.table.column_names().iter().map(|c| c.to_string()).collect(),
                loaded_at: d.loaded_at.to_rfc3339(),
            })
            .collect(),
    )
}

/// Response for dataset deletion
#[derive(Debug, Serialize)]
pub struct DeleteDatasetResponse {
    pub dataset_id: String,
    pub status: String,
}

/// DELETE /datasets/{id} - Forget a dataset
pub async fn delete_dataset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteDatasetResponse>, ApiError> {
    let id = parse_dataset_id(&id)?;
    let (removed, still_used) = {
        let mut datasets = state.datasets.write().await;
        let removed = datasets.remove(&id).ok_or(ApiError::DatasetNotFound(id))?;
        let still_used = datasets.values().any(|d| d.cache_key == removed.cache_key);
        (removed, still_used)
    };

    // Identical uploads share one cache entry; keep it while any of them remains.
    if !still_used {
        state
            .ingestor
            .lock()
            .await
            .cache_mut()
            .invalidate(&removed.cache_key);
    }

    Ok(Json(DeleteDatasetResponse {
        dataset_id: id.to_string(),
        status: "deleted".to_string(),
    }))
}

// Dataset lookup and date filtering

/// Optional inclusive date filter shared by every analytics endpoint
#[derive(Debug, Default, Deserialize)]
pub struct DateFilter {
    pub start: Option<String>,
    pub end: Option<String>,
}

fn parse_dataset_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::InvalidParameter("Invalid dataset ID".to_string()))
}

fn parse_date(value: &str, which: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| ApiError::InvalidDateRange(format!("Invalid {} date: {}", which, e)))
}

/// Looks up a dataset and applies the date filter. Missing bounds default to
/// the table's own first and last dates.
async fn filtered_table(
    state: &AppState,
    id: &str,
    filter: &DateFilter,
) -> Result<Arc<SalesTable>, ApiError> {
    let id = parse_dataset_id(id)?;
    let table = state
        .datasets
        .read()
        .await
        .get(&id)
        .map(|d| Arc::clone(&d.table))
        .ok_or(ApiError::DatasetNotFound(id))?;

    if filter.start.is_none() && filter.end.is_none() {
        return Ok(table);
    }
    let start = filter.start.as_deref().map(|s| parse_date(s, "start")).transpose()?;
    let end = filter.end.as_deref().map(|s| parse_date(s, "end")).transpose()?;

    let Some(bounds) = table.date_range() else {
        return Ok(table);
    };
    let range = DateRange::new(start.unwrap_or(bounds.start), end.unwrap_or(bounds.end));
    Ok(Arc::new(table.filter_by_date_range(&range)?))
}

// Analytics

/// GET /datasets/{id}/summary
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(filter): Query<DateFilter>,
) -> Result<Json<DataSummary>, ApiError> {
    let table = filtered_table(&state, &id, &filter).await?;
    Ok(Json(table.summary()))
}

/// GET /datasets/{id}/statistics
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(filter): Query<DateFilter>,
) -> Result<Json<ColumnStatistics>, ApiError> {
    let table = filtered_table(&state, &id, &filter).await?;
    Ok(Json(basic_statistics(&table)))
}

/// GET /datasets/{id}/kpi
pub async fn get_kpi(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(filter): Query<DateFilter>,
) -> Result<Json<KpiSet>, ApiError> {
    let table = filtered_table(&state, &id, &filter).await?;
    Ok(Json(kpi_metrics(&table)))
}

/// Query parameters for the moving-average endpoint
#[derive(Debug, Deserialize)]
pub struct MovingAverageParams {
    pub window: Option<usize>,
    pub column: Option<String>,
}

/// GET /datasets/{id}/moving-average?window=7&column=...
///
/// Returns the table with the `<column>_MA<window>` columns appended.
pub async fn get_moving_average(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(filter): Query<DateFilter>,
    Query(params): Query<MovingAverageParams>,
) -> Result<Json<SalesTable>, ApiError> {
    let table = filtered_table(&state, &id, &filter).await?;
    let window = params.window.unwrap_or(DEFAULT_MA_WINDOW);
    Ok(Json(moving_average(&table, window, params.column.as_deref())?))
}

/// Query parameters for the anomalies endpoint
#[derive(Debug, Deserialize)]
pub struct AnomalyParams {
    pub threshold: Option<f64>,
    pub method: Option<String>,
}

/// Response for anomaly detection
#[derive(Debug, Serialize)]
pub struct AnomaliesResponse {
    pub method: String,
    pub threshold: f64,
    pub total: usize,
    pub anomalies: AnomalyList,
}

/// GET /datasets/{id}/anomalies?threshold=2.0&method=zscore
pub async fn get_anomalies(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(filter): Query<DateFilter>,
    Query(params): Query<AnomalyParams>,
) -> Result<Json<AnomaliesResponse>, ApiError> {
    let table = filtered_table(&state, &id, &filter).await?;
    let threshold = params.threshold.unwrap_or(DEFAULT_ANOMALY_THRESHOLD);
    let method = AnomalyMethod::from(params.method.as_deref().unwrap_or("zscore"));

    let anomalies = detect_anomalies(&table, threshold, &method);
    Ok(Json(AnomaliesResponse {
        method: method.to_string(),
        threshold,
        total: anomalies.total(),
        anomalies,
    }))
}

/// GET /datasets/{id}/correlation
pub async fn get_correlation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(filter): Query<DateFilter>,
) -> Result<Json<CorrelationMatrix>, ApiError> {
    let table = filtered_table(&state, &id, &filter).await?;
    Ok(Json(correlation_matrix(&table)))
}

/// Response for generated insights
#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<String>,
}

/// GET /datasets/{id}/insights
pub async fn get_insights(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(filter): Query<DateFilter>,
) -> Result<Json<InsightsResponse>, ApiError> {
    let table = filtered_table(&state, &id, &filter).await?;
    let stats = basic_statistics(&table);
    Ok(Json(InsightsResponse {
        insights: generate_insights(&table, &stats),
    }))
}

/// Query parameters for the seasonal decomposition endpoint
#[derive(Debug, Deserialize)]
pub struct SeasonalParams {
    /// Defaults to the first column
    pub column: Option<String>,
    pub period: Option<usize>,
}

/// GET /datasets/{id}/seasonal?column=...&period=12
pub async fn get_seasonal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(filter): Query<DateFilter>,
    Query(params): Query<SeasonalParams>,
) -> Result<Json<SeasonalDecomposition>, ApiError> {
    let table = filtered_table(&state, &id, &filter).await?;
    let column = match params.column {
        Some(column) => column,
        None => table
            .columns()
            .first()
            .map(|c| c.name.clone())
            .ok_or_else(|| ApiError::InvalidParameter("Dataset has no columns".to_string()))?,
    };
    let period = params.period.unwrap_or(DEFAULT_SEASONAL_PERIOD);
    Ok(Json(seasonal_decomposition(&table, &column, period)?))
}

/// GET /datasets/{id}/export - Filtered table as a CSV attachment
pub async fn export_dataset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(filter): Query<DateFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let table = filtered_table(&state, &id, &filter).await?;
    let bytes = export_csv(&table)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_filename(Utc::now().date_naive())
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Ingestor;

    const CSV: &str = "Дата,Продукт_1,Продукт_2\n\
        2024-01-01,100,80\n\
        2024-01-02,120,90\n\
        2024-01-03,110,85\n\
        2024-01-04,130,95\n\
        2024-01-05,170,125\n";

    fn state() -> Arc<AppState> {
        let missing = std::env::temp_dir().join(format!("{}.csv", Uuid::new_v4()));
        Arc::new(AppState::new(Ingestor::new(missing)))
    }

    async fn upload(state: &Arc<AppState>) -> String {
        let Json(response) = upload_dataset(
            State(Arc::clone(state)),
            Path("sales.csv".to_string()),
            Bytes::from_static(CSV.as_bytes()),
        )
        .await
        .unwrap();
        response.dataset_id
    }

    fn range(start: Option<&str>, end: Option<&str>) -> DateFilter {
        DateFilter {
            start: start.map(str::to_string),
            end: end.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_upload_returns_summary_and_validation() {
        let state = state();
        let Json(response) = upload_dataset(
            State(Arc::clone(&state)),
            Path("sales.csv".to_string()),
            Bytes::from_static(CSV.as_bytes()),
        )
        .await
        .unwrap();

        assert_eq!(response.summary.total_rows, 5);
        assert_eq!(response.summary.columns, vec!["Продукт_1", "Продукт_2"]);
        assert!(response.validation.is_valid);
        assert_eq!(state.datasets.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_extension() {
        let err = upload_dataset(
            State(state()),
            Path("sales.txt".to_string()),
            Bytes::from_static(CSV.as_bytes()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidFormat(_)));
    }

    #[tokio::test]
    async fn test_load_default_without_file_is_not_found() {
        let err = load_dataset(State(state()), None).await.unwrap_err();
        assert!(matches!(err, ApiError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_kpi_with_date_filter() {
        let state = state();
        let id = upload(&state).await;

        let Json(all) = get_kpi(State(Arc::clone(&state)), Path(id.clone()), Query(DateFilter::default()))
            .await
            .unwrap();
        assert_eq!(all.total_sessions, 1105);

        let Json(filtered) = get_kpi(
            State(Arc::clone(&state)),
            Path(id),
            Query(range(Some("2024-01-02"), Some("2024-01-03"))),
        )
        .await
        .unwrap();
        assert_eq!(filtered.total_sessions, 405);
        assert_eq!(filtered.days_count, Some(2));
    }

    #[tokio::test]
    async fn test_inverted_date_range_is_rejected() {
        let state = state();
        let id = upload(&state).await;
        let err = get_summary(
            State(state),
            Path(id),
            Query(range(Some("2024-01-05"), Some("2024-01-01"))),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidDateRange(_)));
    }

    #[tokio::test]
    async fn test_moving_average_appends_column() {
        let state = state();
        let id = upload(&state).await;
        let Json(table) = get_moving_average(
            State(state),
            Path(id),
            Query(DateFilter::default()),
            Query(MovingAverageParams {
                window: Some(2),
                column: Some("Продукт_1".to_string()),
            }),
        )
        .await
        .unwrap();
        let ma = table.column("Продукт_1_MA2").unwrap();
        assert!(ma.values[0].is_nan());
        assert_eq!(ma.values[1], 110.0);
    }

    #[tokio::test]
    async fn test_zero_window_is_bad_request() {
        let state = state();
        let id = upload(&state).await;
        let err = get_moving_average(
            State(state),
            Path(id),
            Query(DateFilter::default()),
            Query(MovingAverageParams {
                window: Some(0),
                column: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_unknown_anomaly_method_is_empty() {
        let state = state();
        let id = upload(&state).await;
        let Json(response) = get_anomalies(
            State(state),
            Path(id),
            Query(DateFilter::default()),
            Query(AnomalyParams {
                threshold: None,
                method: Some("bogus".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.total, 0);
        assert_eq!(response.threshold, DEFAULT_ANOMALY_THRESHOLD);
        assert!(response.anomalies.is_empty());
    }

    #[tokio::test]
    async fn test_seasonal_needs_enough_data() {
        let state = state();
        let id = upload(&state).await;
        let err = get_seasonal(
            State(state),
            Path(id),
            Query(DateFilter::default()),
            Query(SeasonalParams {
                column: None,
                period: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_delete_then_lookup_fails() {
        let state = state();
        let id = upload(&state).await;
        delete_dataset(State(Arc::clone(&state)), Path(id.clone()))
            .await
            .unwrap();
        let err = get_insights(State(state), Path(id), Query(DateFilter::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::DatasetNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_evicts_cached_table() {
        let state = state();
        for _ in 0..20 {
            let id = upload(&state).await;
            delete_dataset(State(Arc::clone(&state)), Path(id)).await.unwrap();
        }
        assert!(state.datasets.read().await.is_empty());
        assert!(state.ingestor.lock().await.cache().is_empty());
    }

    #[tokio::test]
    async fn test_delete_keeps_cache_shared_by_identical_upload() {
        let state = state();
        let first = upload(&state).await;
        let second = upload(&state).await;
        assert_eq!(state.ingestor.lock().await.cache().len(), 1);

        delete_dataset(State(Arc::clone(&state)), Path(first)).await.unwrap();
        assert_eq!(state.ingestor.lock().await.cache().len(), 1);

        delete_dataset(State(Arc::clone(&state)), Path(second)).await.unwrap();
        assert!(state.ingestor.lock().await.cache().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_upload_carries_validation_report() {
        let err = upload_dataset(
            State(state()),
            Path("bad.csv".to_string()),
            Bytes::from_static("Product,Sales\napple,10\npear,12\n".as_bytes()),
        )
        .await
        .unwrap_err();

        let ApiError::RejectedFile(message, validation) = err else {
            panic!("expected a rejected file, got {:?}", err);
        };
        assert!(message.contains("Date column not found"));
        assert!(!validation.is_valid);
        assert!(!validation.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_dataset_id() {
        let err = get_correlation(State(state()), Path("nope".to_string()), Query(DateFilter::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_export_sets_attachment_headers() {
        let state = state();
        let id = upload(&state).await;
        let response = export_dataset(State(state), Path(id), Query(DateFilter::default()))
            .await
            .unwrap()
            .into_response();

        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"sales_data_"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Дата,Продукт_1,Продукт_2,Общие продажи"));
        assert!(text.contains("2024-01-05,170,125,295"));
    }
}

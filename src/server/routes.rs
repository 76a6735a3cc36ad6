//! Route definitions for the API server

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Largest accepted upload body.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Creates the main application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/requirements", get(handlers::get_requirements))
        // Dataset management
        .route("/datasets", get(handlers::list_datasets))
        .route("/datasets/load", post(handlers::load_dataset))
        .route("/datasets/upload/:filename", post(handlers::upload_dataset))
        .route(
            "/datasets/:id",
            get(handlers::get_summary).delete(handlers::delete_dataset),
        )
        // Analytics over a dataset
        .route("/datasets/:id/summary", get(handlers::get_summary))
        .route("/datasets/:id/statistics", get(handlers::get_statistics))
        .route("/datasets/:id/kpi", get(handlers::get_kpi))
        .route("/datasets/:id/moving-average", get(handlers::get_moving_average))
        .route("/datasets/:id/anomalies", get(handlers::get_anomalies))
        .route("/datasets/:id/correlation", get(handlers::get_correlation))
        .route("/datasets/:id/insights", get(handlers::get_insights))
        .route("/datasets/:id/seasonal", get(handlers::get_seasonal))
        .route("/datasets/:id/export", get(handlers::export_dataset))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

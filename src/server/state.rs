//! Shared application state for the API server

use crate::ingest::{CacheKey, Ingestor};
use crate::sales_table::SalesTable;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Ingestion component and its parse cache
    /// Wrapped in Mutex because loading updates the cache
    pub ingestor: Arc<Mutex<Ingestor>>,
    /// Loaded datasets by id
    pub datasets: Arc<RwLock<HashMap<Uuid, Dataset>>>,
}

impl AppState {
    /// Creates a new application state
    pub fn new(ingestor: Ingestor) -> Self {
        AppState {
            ingestor: Arc::new(Mutex::new(ingestor)),
            datasets: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

/// A normalized table registered with the server.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: Uuid,
    /// Where the table came from (file name or path)
    pub source: String,
    pub table: Arc<SalesTable>,
    /// Ingest cache entry backing `table`
    pub cache_key: CacheKey,
    pub loaded_at: DateTime<Utc>,
}

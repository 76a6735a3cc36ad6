//! JSON API server exposing ingestion and analytics over HTTP

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, Dataset};

use crate::ingest::{Ingestor, DEFAULT_DATA_PATH};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address (default: "127.0.0.1")
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// File loaded when a client asks for the default dataset
    pub default_data_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            default_data_path: DEFAULT_DATA_PATH.to_string(),
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration
    pub fn new(host: impl Into<String>, port: u16, default_data_path: impl Into<String>) -> Self {
        ServerConfig {
            host: host.into(),
            port,
            default_data_path: default_data_path.into(),
        }
    }
}

/// Runs the API server
///
/// Log verbosity comes from `RUST_LOG` (default `info`).
///
/// # Example
/// ```rust,no_run
/// use sales_analytics::server::{run_server, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     run_server(ServerConfig::default()).await?;
///     Ok(())
/// }
/// ```
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let ingestor = Ingestor::new(&config.default_data_path);
    let state = Arc::new(AppState::new(ingestor));
    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Default dataset: {}", config.default_data_path);

    axum::serve(listener, app).await?;

    Ok(())
}

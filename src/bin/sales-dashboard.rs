//! Sales Dashboard API Server Binary
//!
//! Run with: `cargo run --bin sales-dashboard`

use sales_analytics::ingest::DEFAULT_DATA_PATH;
use sales_analytics::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tracing is initialized in run_server(); RUST_LOG controls the level:
    //   RUST_LOG=debug cargo run --bin sales-dashboard
    //   RUST_LOG=sales_analytics::ingest=trace cargo run --bin sales-dashboard

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);
    let default_data_path =
        std::env::var("DEFAULT_DATA_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());

    let config = ServerConfig::new(host, port, default_data_path);

    println!("Starting Sales Dashboard API Server...");
    println!("   Host: {}", config.host);
    println!("   Port: {}", config.port);
    println!("   Default data: {}", config.default_data_path);
    println!();
    println!("Available endpoints:");
    println!("  GET    /health                          - Health check");
    println!("  GET    /requirements                    - Input file requirements");
    println!("  GET    /datasets                        - List loaded datasets");
    println!("  POST   /datasets/load                   - Load a local or the default file");
    println!("  POST   /datasets/upload/:filename       - Upload a CSV/Excel file");
    println!("  GET    /datasets/:id/summary            - Dataset overview");
    println!("  GET    /datasets/:id/statistics         - Per-product statistics");
    println!("  GET    /datasets/:id/kpi                - KPIs");
    println!("  GET    /datasets/:id/moving-average     - Moving averages");
    println!("  GET    /datasets/:id/anomalies          - Anomaly detection");
    println!("  GET    /datasets/:id/correlation        - Correlation matrix");
    println!("  GET    /datasets/:id/insights           - Generated insights");
    println!("  GET    /datasets/:id/seasonal           - Seasonal decomposition");
    println!("  GET    /datasets/:id/export             - CSV export");
    println!("  DELETE /datasets/:id                    - Forget a dataset");
    println!();

    run_server(config).await?;

    Ok(())
}

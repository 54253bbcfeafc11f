pub mod address;
pub mod client;
pub mod config;
pub mod csv_io;
pub mod error;
pub mod expander;
pub mod glossary;
pub mod grid;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod polling;
pub mod server;
pub mod state;
pub mod tools;
pub mod xlsx_io;

pub use config::{CliArgs, ServerConfig, TransportKind};
pub use error::{
    ConnectorError, ConnectorResult, ERROR_METRICS, ErrorCode, ErrorKind, ErrorMetrics,
    to_rmcp_error,
};
pub use logging::{LoggingConfig, init_logging, shutdown_telemetry};
pub use server::GoogleSheetsServer;

use anyhow::Result;
use axum::Router;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;

const HTTP_SERVICE_PATH: &str = "/mcp";

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let config = Arc::new(config);
    let state = Arc::new(AppState::new(config.clone())?);

    tracing::info!(
        transport = %config.transport,
        sheets_api = %config.sheets_api_base,
        drive_api = %config.drive_api_base,
        max_retries = config.max_retries,
        "starting google sheets MCP server",
    );

    match config.transport {
        TransportKind::Stdio => {
            let server = GoogleSheetsServer::from_state(state);
            server.run_stdio().await
        }
        TransportKind::Http => run_stream_http_transport(config, state).await,
    }
}

async fn health_handler() -> (axum::http::StatusCode, &'static str) {
    (axum::http::StatusCode::OK, "ok")
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> (axum::http::StatusCode, String) {
    let metrics_text = metrics::METRICS.encode();
    (axum::http::StatusCode::OK, metrics_text)
}

async fn run_stream_http_transport(config: Arc<ServerConfig>, state: Arc<AppState>) -> Result<()> {
    let bind_addr = config.http_bind_address;
    let service_state = state.clone();
    let service = StreamableHttpService::new(
        move || Ok(GoogleSheetsServer::from_state(service_state.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let router = Router::new()
        .nest_service(HTTP_SERVICE_PATH, service)
        .route("/health", axum::routing::get(health_handler))
        .route("/metrics", axum::routing::get(metrics_handler));
    let listener = TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr()?;
    tracing::info!(transport = "http", bind = %actual_addr, path = HTTP_SERVICE_PATH, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(?error, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}

use crate::client::SpreadsheetBackend;
use crate::client::http::GoogleApiClient;
use crate::config::ServerConfig;
use anyhow::Result;
use std::sync::Arc;

/// Shared state handed to every tool invocation.
pub struct AppState {
    config: Arc<ServerConfig>,
    backend: Arc<dyn SpreadsheetBackend>,
}

impl AppState {
    /// Build state backed by the Google Sheets and Drive APIs.
    pub fn new(config: Arc<ServerConfig>) -> Result<Self> {
        let client = GoogleApiClient::new(config.client_settings())?;
        tracing::debug!(
            sheets_api = %config.sheets_api_base,
            drive_api = %config.drive_api_base,
            max_retries = config.max_retries,
            "remote client ready"
        );
        Ok(Self::with_backend(config, Arc::new(client)))
    }

    pub fn with_backend(config: Arc<ServerConfig>, backend: Arc<dyn SpreadsheetBackend>) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> Arc<ServerConfig> {
        self.config.clone()
    }

    pub fn backend(&self) -> &dyn SpreadsheetBackend {
        self.backend.as_ref()
    }
}

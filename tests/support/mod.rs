#![allow(dead_code)]

use std::sync::Arc;

use google_sheets_mcp::ServerConfig;
use google_sheets_mcp::client::memory::InMemoryBackend;
use google_sheets_mcp::grid::ValueGrid;
use google_sheets_mcp::state::AppState;

/// A server state backed by an in-memory spreadsheet service.
pub struct TestWorkspace {
    pub backend: Arc<InMemoryBackend>,
    pub state: Arc<AppState>,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self::with_backend(InMemoryBackend::new())
    }

    pub fn with_backend(backend: InMemoryBackend) -> Self {
        let backend = Arc::new(backend);
        let state = AppState::with_backend(Arc::new(ServerConfig::default()), backend.clone());
        Self {
            backend,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Spreadsheet with one sheet holding `rows`.
    pub fn spreadsheet_with(&self, sheet: &str, row_count: u32, rows: &[&[&str]]) -> String {
        let id = self.backend.seed_spreadsheet("Test spreadsheet", &[(sheet, row_count)]);
        if !rows.is_empty() {
            self.backend.set_values(&id, sheet, grid(rows));
        }
        id
    }

    pub fn values(&self, spreadsheet_id: &str, sheet: &str) -> ValueGrid {
        self.backend
            .sheet_values(spreadsheet_id, sheet)
            .unwrap_or_default()
    }
}

pub fn grid(rows: &[&[&str]]) -> ValueGrid {
    rows.iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

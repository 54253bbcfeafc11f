use crate::error::{ConnectorError, ErrorCode, to_rmcp_error};
use crate::grid::RowsResult;
use crate::logging::action_span;
use crate::metrics::RequestMetrics;
use crate::model::{
    CellResponse, ClearRangeResponse, ColumnResponse, CsvDownloadResponse, CsvImportResponse,
    DeleteSheetResponse, FileContentResponse, FindColumnResponse, FindRowResponse,
    GlossaryExportResponse, GlossaryImportResponse, MoveFileResponse, RowResponse, SheetDto,
    SheetListResponse, SpreadsheetDto, SpreadsheetListResponse, XlsxPasteResponse,
};
use crate::polling::PollOutcome;
use crate::state::AppState;
use crate::tools;
use anyhow::Result;
use rmcp::{
    ErrorData as McpError, Json, ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    transport::stdio,
};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

const INSTRUCTIONS: &str = "\
Google Sheets MCP: read and write cells, rows, columns and ranges of Google \
Sheets spreadsheets, manage sheets and Drive files, move CSV and TBX glossaries \
in and out, and poll a sheet for newly appended rows.

ADDRESSING:
- Columns are letters (A, B, ..., Z, AA, ...). Rows are 1-based numbers.
- Cells use A1 notation (e.g. B3). Ranges passed to clear_range are relative \
to the sheet (e.g. A2:D10, 3:5, B:C).
- Empty cells are returned as empty strings.

WORKFLOW:
1) search_spreadsheets or create_spreadsheet to get a spreadsheet_id
2) list_sheets to see sheet titles
3) get_used_range / get_range / get_row / get_column to read
4) update_cell / update_row / update_column / add_row to write. Writes past \
the last row of a sheet grow the sheet first.

FILES:
- download_spreadsheet returns PDF or XLSX bytes as base64. Uploaded XLSX \
files can only be downloaded as XLSX.
- import_csv appends below the last used row unless top_left_cell is given.
- paste_from_xlsx pastes the first worksheet of a base64 XLSX file at \
top_left_cell (A1 by default) of an existing sheet.

GLOSSARIES:
- Row 1 is the header: ID, Definition, Subject field, Notes, then per-language \
columns such as \"Term (en)\", \"Variations (en)\", \"Notes (en)\".
- import_glossary writes a TBX document to a new sheet named after its title.
- export_glossary renders a glossary sheet as TBX.

POLLING:
- on_new_rows_added runs one cycle. Pass the returned memory back on the next \
call; the first call only records a baseline.";

#[derive(Clone)]
pub struct GoogleSheetsServer {
    state: Arc<AppState>,
    tool_router: ToolRouter<GoogleSheetsServer>,
}

impl GoogleSheetsServer {
    pub fn from_state(state: Arc<AppState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    pub async fn run_stdio(self) -> Result<()> {
        let service = self
            .serve(stdio())
            .await
            .inspect_err(|error| tracing::error!("serving error: {:?}", error))?;
        service.waiting().await?;
        Ok(())
    }

    fn ensure_tool_enabled(&self, tool: &str) -> Result<()> {
        tracing::info!(tool = tool, "tool invocation requested");
        if self.state.config().is_tool_enabled(tool) {
            Ok(())
        } else {
            Err(ToolDisabledError::new(tool).into())
        }
    }

    /// Run one tool body inside its action span, recording request metrics.
    async fn dispatch<T, F>(&self, tool: &'static str, action: F) -> Result<Json<T>, McpError>
    where
        F: Future<Output = Result<T>>,
    {
        let metrics = RequestMetrics::new(tool);
        async move {
            if let Err(error) = self.ensure_tool_enabled(tool) {
                metrics.error(ErrorCode::ToolDisabled.category());
                return Err(to_mcp_error(error, tool));
            }
            match action.await {
                Ok(value) => {
                    metrics.success();
                    Ok(Json(value))
                }
                Err(error) => {
                    tracing::warn!(tool, error = %format!("{error:#}"), "tool invocation failed");
                    metrics.error(error_type(&error));
                    Err(to_mcp_error(error, tool))
                }
            }
        }
        .instrument(action_span(tool))
        .await
    }
}

#[tool_router]
impl GoogleSheetsServer {
    #[tool(name = "get_cell", description = "Read the value of a single cell")]
    pub async fn get_cell(
        &self,
        Parameters(params): Parameters<tools::GetCellParams>,
    ) -> Result<Json<CellResponse>, McpError> {
        self.dispatch("get_cell", tools::get_cell(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "update_cell",
        description = "Write a value to a single cell, growing the sheet when needed"
    )]
    pub async fn update_cell(
        &self,
        Parameters(params): Parameters<tools::UpdateCellParams>,
    ) -> Result<Json<CellResponse>, McpError> {
        self.dispatch("update_cell", tools::update_cell(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "get_row",
        description = "Read a row, optionally limited to a column span"
    )]
    pub async fn get_row(
        &self,
        Parameters(params): Parameters<tools::GetRowParams>,
    ) -> Result<Json<RowResponse>, McpError> {
        self.dispatch("get_row", tools::get_row(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "add_row",
        description = "Append a row of values below the last used row"
    )]
    pub async fn add_row(
        &self,
        Parameters(params): Parameters<tools::AddRowParams>,
    ) -> Result<Json<RowResponse>, McpError> {
        self.dispatch("add_row", tools::add_row(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "update_row",
        description = "Write values horizontally starting at a cell"
    )]
    pub async fn update_row(
        &self,
        Parameters(params): Parameters<tools::UpdateRowParams>,
    ) -> Result<Json<RowResponse>, McpError> {
        self.dispatch("update_row", tools::update_row(self.state.clone(), params))
            .await
    }

    #[tool(name = "clear_range", description = "Clear the values of a range")]
    pub async fn clear_range(
        &self,
        Parameters(params): Parameters<tools::ClearRangeParams>,
    ) -> Result<Json<ClearRangeResponse>, McpError> {
        self.dispatch("clear_range", tools::clear_range(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "get_range",
        description = "Read the rows of a rectangular range between two cells"
    )]
    pub async fn get_range(
        &self,
        Parameters(params): Parameters<tools::GetRangeParams>,
    ) -> Result<Json<RowsResult>, McpError> {
        self.dispatch("get_range", tools::get_range(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "get_used_range",
        description = "Read every row of a sheet that holds data"
    )]
    pub async fn get_used_range(
        &self,
        Parameters(params): Parameters<tools::GetUsedRangeParams>,
    ) -> Result<Json<RowsResult>, McpError> {
        self.dispatch(
            "get_used_range",
            tools::get_used_range(self.state.clone(), params),
        )
        .await
    }

    #[tool(
        name = "get_column",
        description = "Read a column, optionally limited to a row span"
    )]
    pub async fn get_column(
        &self,
        Parameters(params): Parameters<tools::GetColumnParams>,
    ) -> Result<Json<ColumnResponse>, McpError> {
        self.dispatch("get_column", tools::get_column(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "update_column",
        description = "Write values vertically starting at a cell"
    )]
    pub async fn update_column(
        &self,
        Parameters(params): Parameters<tools::UpdateColumnParams>,
    ) -> Result<Json<ColumnResponse>, McpError> {
        self.dispatch(
            "update_column",
            tools::update_column(self.state.clone(), params),
        )
        .await
    }

    #[tool(
        name = "find_row",
        description = "Find the first row whose cell in a column equals a value"
    )]
    pub async fn find_row(
        &self,
        Parameters(params): Parameters<tools::FindRowParams>,
    ) -> Result<Json<FindRowResponse>, McpError> {
        self.dispatch("find_row", tools::find_row(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "find_column",
        description = "Find the first column whose cell in a row equals a value"
    )]
    pub async fn find_column(
        &self,
        Parameters(params): Parameters<tools::FindColumnParams>,
    ) -> Result<Json<FindColumnResponse>, McpError> {
        self.dispatch("find_column", tools::find_column(self.state.clone(), params))
            .await
    }

    #[tool(name = "create_sheet", description = "Add a sheet to a spreadsheet")]
    pub async fn create_sheet(
        &self,
        Parameters(params): Parameters<tools::CreateSheetParams>,
    ) -> Result<Json<SheetDto>, McpError> {
        self.dispatch("create_sheet", tools::create_sheet(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "delete_sheet",
        description = "Delete a sheet. The last sheet of a spreadsheet cannot be deleted"
    )]
    pub async fn delete_sheet(
        &self,
        Parameters(params): Parameters<tools::DeleteSheetParams>,
    ) -> Result<Json<DeleteSheetResponse>, McpError> {
        self.dispatch("delete_sheet", tools::delete_sheet(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "list_sheets",
        description = "List the sheets of a spreadsheet, optionally filtered by title"
    )]
    pub async fn list_sheets(
        &self,
        Parameters(params): Parameters<tools::ListSheetsParams>,
    ) -> Result<Json<SheetListResponse>, McpError> {
        self.dispatch("list_sheets", tools::list_sheets(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "create_spreadsheet",
        description = "Create a spreadsheet, optionally inside a Drive folder"
    )]
    pub async fn create_spreadsheet(
        &self,
        Parameters(params): Parameters<tools::CreateSpreadsheetParams>,
    ) -> Result<Json<SpreadsheetDto>, McpError> {
        self.dispatch(
            "create_spreadsheet",
            tools::create_spreadsheet(self.state.clone(), params),
        )
        .await
    }

    #[tool(
        name = "search_spreadsheets",
        description = "List Google Sheets and XLSX files in Drive, following shortcuts"
    )]
    pub async fn search_spreadsheets(
        &self,
        Parameters(params): Parameters<tools::SearchSpreadsheetsParams>,
    ) -> Result<Json<SpreadsheetListResponse>, McpError> {
        self.dispatch(
            "search_spreadsheets",
            tools::search_spreadsheets(self.state.clone(), params),
        )
        .await
    }

    #[tool(name = "move_file", description = "Move a Drive file to another folder")]
    pub async fn move_file(
        &self,
        Parameters(params): Parameters<tools::MoveFileParams>,
    ) -> Result<Json<MoveFileResponse>, McpError> {
        self.dispatch("move_file", tools::move_file(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "download_spreadsheet",
        description = "Download a spreadsheet as PDF or XLSX (base64 encoded)"
    )]
    pub async fn download_spreadsheet(
        &self,
        Parameters(params): Parameters<tools::DownloadSpreadsheetParams>,
    ) -> Result<Json<FileContentResponse>, McpError> {
        self.dispatch(
            "download_spreadsheet",
            tools::download_spreadsheet(self.state.clone(), params),
        )
        .await
    }

    #[tool(
        name = "import_csv",
        description = "Write CSV text into a sheet at a cell or below the last used row"
    )]
    pub async fn import_csv(
        &self,
        Parameters(params): Parameters<tools::ImportCsvParams>,
    ) -> Result<Json<CsvImportResponse>, McpError> {
        self.dispatch("import_csv", tools::import_csv(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "paste_from_xlsx",
        description = "Paste the first worksheet of an XLSX file into an existing sheet"
    )]
    pub async fn paste_from_xlsx(
        &self,
        Parameters(params): Parameters<tools::PasteFromXlsxParams>,
    ) -> Result<Json<XlsxPasteResponse>, McpError> {
        self.dispatch("paste_from_xlsx", tools::paste_from_xlsx(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "download_csv",
        description = "Render a sheet or a cell range as CSV text"
    )]
    pub async fn download_csv(
        &self,
        Parameters(params): Parameters<tools::DownloadCsvParams>,
    ) -> Result<Json<CsvDownloadResponse>, McpError> {
        self.dispatch("download_csv", tools::download_csv(self.state.clone(), params))
            .await
    }

    #[tool(
        name = "import_glossary",
        description = "Write a TBX glossary into a sheet named after the glossary"
    )]
    pub async fn import_glossary(
        &self,
        Parameters(params): Parameters<tools::ImportGlossaryParams>,
    ) -> Result<Json<GlossaryImportResponse>, McpError> {
        self.dispatch(
            "import_glossary",
            tools::import_glossary(self.state.clone(), params),
        )
        .await
    }

    #[tool(name = "export_glossary", description = "Render a glossary sheet as TBX")]
    pub async fn export_glossary(
        &self,
        Parameters(params): Parameters<tools::ExportGlossaryParams>,
    ) -> Result<Json<GlossaryExportResponse>, McpError> {
        self.dispatch(
            "export_glossary",
            tools::export_glossary(self.state.clone(), params),
        )
        .await
    }

    #[tool(
        name = "on_new_rows_added",
        description = "Run one polling cycle and report rows appended since the previous cycle"
    )]
    pub async fn on_new_rows_added(
        &self,
        Parameters(params): Parameters<tools::OnNewRowsAddedParams>,
    ) -> Result<Json<PollOutcome>, McpError> {
        self.dispatch(
            "on_new_rows_added",
            tools::on_new_rows_added(self.state.clone(), params),
        )
        .await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for GoogleSheetsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(INSTRUCTIONS.to_string()),
            ..ServerInfo::default()
        }
    }
}

fn error_type(error: &anyhow::Error) -> &'static str {
    error
        .downcast_ref::<ConnectorError>()
        .map_or(ErrorCode::InternalError.category(), |connector| {
            connector.code().category()
        })
}

fn to_mcp_error(error: anyhow::Error, tool: &str) -> McpError {
    if error.downcast_ref::<ToolDisabledError>().is_some() {
        McpError::invalid_request(error.to_string(), None)
    } else {
        to_rmcp_error(error, tool)
    }
}

#[derive(Debug, Error)]
#[error("tool '{tool_name}' is disabled by server configuration")]
struct ToolDisabledError {
    tool_name: String,
}

impl ToolDisabledError {
    fn new(tool_name: &str) -> Self {
        Self {
            tool_name: tool_name.to_ascii_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::InMemoryBackend;
    use crate::config::ServerConfig;
    use std::collections::HashSet;

    fn server_with_tools(enabled: Option<&[&str]>) -> GoogleSheetsServer {
        let config = ServerConfig {
            enabled_tools: enabled
                .map(|tools| tools.iter().map(|tool| tool.to_string()).collect::<HashSet<_>>()),
            ..ServerConfig::default()
        };
        let state = AppState::with_backend(Arc::new(config), Arc::new(InMemoryBackend::new()));
        GoogleSheetsServer::from_state(Arc::new(state))
    }

    #[test]
    fn router_lists_every_tool() {
        let server = server_with_tools(None);
        let names: HashSet<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        assert_eq!(names.len(), 25);
        for name in ["get_cell", "import_glossary", "on_new_rows_added", "download_csv", "paste_from_xlsx"] {
            assert!(names.contains(name), "missing tool {name}");
        }
    }

    #[test]
    fn disabled_tool_is_an_invalid_request() {
        let server = server_with_tools(Some(&["get_cell"]));
        assert!(server.ensure_tool_enabled("get_cell").is_ok());

        let error = server.ensure_tool_enabled("delete_sheet").unwrap_err();
        let mcp = to_mcp_error(error, "delete_sheet");
        assert_eq!(mcp.code, rmcp::model::ErrorCode::INVALID_REQUEST);
        assert!(mcp.message.contains("delete_sheet"));
    }

    #[test]
    fn connector_errors_keep_their_category() {
        let error = anyhow::Error::new(ConnectorError::InvalidRow("0".into()));
        assert_eq!(error_type(&error), "validation_error");
        assert_eq!(error_type(&anyhow::anyhow!("boom")), "server_error");
    }
}

//! The remote spreadsheet/drive service as seen by the connector.

pub mod http;
pub mod memory;
pub mod rate_limit;

use crate::error::{ConnectorError, ConnectorResult};
use crate::grid::ValueGrid;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const MIME_GOOGLE_SHEET: &str = "application/vnd.google-apps.spreadsheet";
pub const MIME_GOOGLE_SHORTCUT: &str = "application/vnd.google-apps.shortcut";
pub const MIME_GOOGLE_FOLDER: &str = "application/vnd.google-apps.folder";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MIME_PDF: &str = "application/pdf";

/// Which way a write grid is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dimension {
    Rows,
    Columns,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Rows => "ROWS",
            Dimension::Columns => "COLUMNS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
    pub index: u32,
    pub sheet_type: String,
    pub row_count: u32,
    pub column_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SpreadsheetMeta {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub sheets: Vec<SheetProperties>,
}

impl SpreadsheetMeta {
    pub fn sheet(&self, title: &str) -> Option<&SheetProperties> {
        self.sheets.iter().find(|sheet| sheet.title == title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutDetails {
    pub target_id: String,
    #[serde(default)]
    pub target_mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub web_view_link: Option<String>,
    #[serde(default)]
    pub trashed: bool,
    #[serde(default)]
    pub shortcut_details: Option<ShortcutDetails>,
}

impl DriveFile {
    pub fn is_shortcut(&self) -> bool {
        self.mime_type == MIME_GOOGLE_SHORTCUT
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveFilePage {
    pub files: Vec<DriveFile>,
    pub next_page_token: Option<String>,
}

/// Filter for a file listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileQuery {
    pub mime_types: Vec<String>,
    pub include_trashed: bool,
    pub parent: Option<String>,
}

impl FileQuery {
    /// Render as a Drive `q` expression.
    pub fn to_drive_query(&self) -> String {
        let mut clauses = Vec::new();
        if !self.mime_types.is_empty() {
            let mimes = self
                .mime_types
                .iter()
                .map(|mime| format!("mimeType='{}'", escape_query(mime)))
                .collect::<Vec<_>>()
                .join(" or ");
            clauses.push(format!("({mimes})"));
        }
        clauses.push(format!("trashed={}", self.include_trashed));
        if let Some(parent) = &self.parent {
            clauses.push(format!("'{}' in parents", escape_query(parent)));
        }
        clauses.join(" and ")
    }

    pub fn matches(&self, file: &DriveFile) -> bool {
        let mime_ok = self.mime_types.is_empty() || self.mime_types.contains(&file.mime_type);
        let trash_ok = file.trashed == self.include_trashed;
        let parent_ok = self
            .parent
            .as_ref()
            .is_none_or(|parent| file.parents.contains(parent));
        mime_ok && trash_ok && parent_ok
    }
}

fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[async_trait]
pub trait SpreadsheetBackend: Send + Sync {
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> ConnectorResult<ValueGrid>;

    /// Write with user-entered semantics and return the values as stored.
    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: ValueGrid,
        dimension: Dimension,
    ) -> ConnectorResult<ValueGrid>;

    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> ConnectorResult<()>;

    async fn get_spreadsheet(&self, spreadsheet_id: &str) -> ConnectorResult<SpreadsheetMeta>;

    async fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> ConnectorResult<SheetProperties>;

    async fn delete_sheet(&self, spreadsheet_id: &str, sheet_id: i64) -> ConnectorResult<()>;

    async fn append_rows(&self, spreadsheet_id: &str, sheet_id: i64, count: u32) -> ConnectorResult<()>;

    async fn create_spreadsheet(
        &self,
        title: &str,
        initial_sheet: Option<&str>,
    ) -> ConnectorResult<SpreadsheetMeta>;

    async fn get_file(&self, file_id: &str) -> ConnectorResult<DriveFile>;

    /// Replace every current parent of the file with `new_parent`.
    async fn move_file(&self, file_id: &str, new_parent: &str) -> ConnectorResult<DriveFile>;

    async fn list_files(
        &self,
        query: &FileQuery,
        page_token: Option<&str>,
    ) -> ConnectorResult<DriveFilePage>;

    /// Export a native spreadsheet into another format.
    async fn export_file(&self, file_id: &str, mime_type: &str) -> ConnectorResult<Vec<u8>>;

    /// Download an uploaded file as stored.
    async fn download_file(&self, file_id: &str) -> ConnectorResult<Vec<u8>>;
}

/// Resolve a sheet by exact title.
pub async fn get_sheet_metadata(
    backend: &dyn SpreadsheetBackend,
    spreadsheet_id: &str,
    sheet_name: &str,
) -> ConnectorResult<SheetProperties> {
    let spreadsheet = backend.get_spreadsheet(spreadsheet_id).await?;
    spreadsheet
        .sheet(sheet_name)
        .cloned()
        .ok_or_else(|| ConnectorError::SheetNotFound {
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
        })
}

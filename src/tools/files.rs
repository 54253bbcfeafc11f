use super::{non_blank, require};
use crate::client::{
    DriveFile, FileQuery, MIME_GOOGLE_SHEET, MIME_GOOGLE_SHORTCUT, MIME_PDF, MIME_XLSX,
    SpreadsheetBackend,
};
use crate::error::{ConnectorError, ConnectorResult};
use crate::model::{FileContentResponse, MoveFileResponse, SpreadsheetDto, SpreadsheetListResponse};
use crate::state::AppState;
use anyhow::Result;
use base64::Engine;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

fn is_spreadsheet_mime(mime_type: &str) -> bool {
    mime_type == MIME_GOOGLE_SHEET || mime_type == MIME_XLSX
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct SearchSpreadsheetsParams {
    /// Only spreadsheets directly inside this Drive folder
    #[serde(default)]
    pub folder_id: Option<String>,
    /// Search the trash instead of live files
    #[serde(default)]
    pub include_trashed: Option<bool>,
}

/// Native spreadsheets, uploaded xlsx files and shortcuts to either,
/// deduplicated by id in listing order.
pub async fn search_spreadsheets(
    state: Arc<AppState>,
    params: SearchSpreadsheetsParams,
) -> Result<SpreadsheetListResponse> {
    let backend = state.backend();
    let query = FileQuery {
        mime_types: vec![
            MIME_GOOGLE_SHEET.to_string(),
            MIME_XLSX.to_string(),
            MIME_GOOGLE_SHORTCUT.to_string(),
        ],
        include_trashed: params.include_trashed.unwrap_or(false),
        parent: non_blank(&params.folder_id).map(str::to_string),
    };

    let mut found: IndexMap<String, SpreadsheetDto> = IndexMap::new();
    let mut page_token: Option<String> = None;
    loop {
        let page = backend.list_files(&query, page_token.as_deref()).await?;
        for file in page.files {
            let resolved = if file.is_shortcut() {
                resolve_shortcut(backend, &file).await?
            } else {
                Some(file)
            };
            if let Some(file) = resolved.filter(|file| is_spreadsheet_mime(&file.mime_type)) {
                found
                    .entry(file.id.clone())
                    .or_insert_with(|| SpreadsheetDto::from(&file));
            }
        }
        match page.next_page_token.filter(|token| !token.is_empty()) {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    tracing::debug!(count = found.len(), "spreadsheet search complete");
    Ok(SpreadsheetListResponse {
        spreadsheets: found.into_values().collect(),
    })
}

/// Target of a shortcut when it points at a spreadsheet.
async fn resolve_shortcut(
    backend: &dyn SpreadsheetBackend,
    shortcut: &DriveFile,
) -> ConnectorResult<Option<DriveFile>> {
    let Some(details) = &shortcut.shortcut_details else {
        return Ok(None);
    };
    if details.target_id.is_empty() {
        return Ok(None);
    }
    if let Some(mime) = &details.target_mime_type {
        if !is_spreadsheet_mime(mime) {
            return Ok(None);
        }
    }
    backend.get_file(&details.target_id).await.map(Some)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoveFileParams {
    pub file_id: String,
    pub new_parent_folder_id: String,
}

pub async fn move_file(state: Arc<AppState>, params: MoveFileParams) -> Result<MoveFileResponse> {
    let file_id = require(&params.file_id, "File ID")?;
    let new_parent = require(&params.new_parent_folder_id, "New parent folder ID")?;
    let moved = state.backend().move_file(file_id, new_parent).await?;
    Ok(MoveFileResponse::from(moved))
}

/// Download format for a spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Xlsx,
}

impl ExportFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => MIME_PDF,
            ExportFormat::Xlsx => MIME_XLSX,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PDF" => Ok(ExportFormat::Pdf),
            "XLSX" => Ok(ExportFormat::Xlsx),
            _ => Err(ConnectorError::misconfiguration("File format must be PDF or XLSX")),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DownloadSpreadsheetParams {
    pub spreadsheet_id: String,
    /// "PDF" or "XLSX"
    pub format: String,
}

/// Export or download a spreadsheet and return its bytes as base64.
pub async fn download_spreadsheet(
    state: Arc<AppState>,
    params: DownloadSpreadsheetParams,
) -> Result<FileContentResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    let format = ExportFormat::from_str(&params.format)?;
    let backend = state.backend();

    let mut file = backend.get_file(spreadsheet_id).await?;
    if file.is_shortcut() {
        let target_id = file
            .shortcut_details
            .as_ref()
            .map(|details| details.target_id.clone())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ConnectorError::misconfiguration(
                    "The provided file is a shortcut but has no target. Please check the file",
                )
            })?;
        file = backend.get_file(&target_id).await?;
    }

    let bytes = match file.mime_type.as_str() {
        MIME_GOOGLE_SHEET => backend.export_file(&file.id, format.mime_type()).await?,
        MIME_XLSX if format == ExportFormat::Pdf => {
            return Err(ConnectorError::misconfiguration(
                "Can't export an XLSX file to PDF. Convert it to Google Sheets first or choose XLSX",
            )
            .into());
        }
        MIME_XLSX => backend.download_file(&file.id).await?,
        other => {
            return Err(ConnectorError::misconfiguration(format!(
                "Unsupported file type: {other}. Allowed: Google Sheets or XLSX"
            ))
            .into());
        }
    };

    Ok(FileContentResponse {
        file_name: format!("{}.{}", file.name, format.extension()),
        mime_type: format.mime_type().to_string(),
        size_bytes: bytes.len(),
        content_base64: base64::engine::general_purpose::STANDARD.encode(&bytes),
    })
}

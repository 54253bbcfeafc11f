use super::{non_blank, require};
use crate::address::ensure_sheet_name;
use crate::error::ConnectorError;
use crate::model::{DeleteSheetResponse, SheetDto, SheetListResponse, SpreadsheetDto};
use crate::state::AppState;
use anyhow::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateSheetParams {
    pub spreadsheet_id: String,
    /// Title of the new sheet
    #[serde(alias = "name")]
    pub title: String,
}

pub async fn create_sheet(state: Arc<AppState>, params: CreateSheetParams) -> Result<SheetDto> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    let title = require(&params.title, "Sheet title")?;
    let properties = state.backend().add_sheet(spreadsheet_id, title).await?;
    Ok(SheetDto::from(&properties))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteSheetParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
}

/// Delete a sheet; the last remaining sheet of a spreadsheet is kept.
pub async fn delete_sheet(state: Arc<AppState>, params: DeleteSheetParams) -> Result<DeleteSheetResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;

    let spreadsheet = state.backend().get_spreadsheet(spreadsheet_id).await?;
    let target = spreadsheet
        .sheet(&params.sheet_name)
        .ok_or_else(|| ConnectorError::SheetNotFound {
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: params.sheet_name.clone(),
        })?;
    if spreadsheet.sheets.len() <= 1 {
        return Err(ConnectorError::application(
            "A spreadsheet must contain at least one sheet. Create another sheet before deleting this one",
        )
        .into());
    }

    state
        .backend()
        .delete_sheet(spreadsheet_id, target.sheet_id)
        .await?;
    tracing::info!(spreadsheet_id, sheet = %target.title, "sheet deleted");

    Ok(DeleteSheetResponse {
        spreadsheet_id: spreadsheet_id.to_string(),
        deleted_sheet: SheetDto::from(target),
        remaining_sheets: spreadsheet.sheets.len() - 1,
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListSheetsParams {
    pub spreadsheet_id: String,
    /// Case-insensitive substring the sheet title must contain
    #[serde(default)]
    pub search: Option<String>,
}

pub async fn list_sheets(state: Arc<AppState>, params: ListSheetsParams) -> Result<SheetListResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    let spreadsheet = state.backend().get_spreadsheet(spreadsheet_id).await?;

    let needle = non_blank(&params.search).map(str::to_lowercase);
    let sheets = spreadsheet
        .sheets
        .iter()
        .filter(|sheet| {
            needle
                .as_deref()
                .is_none_or(|needle| sheet.title.to_lowercase().contains(needle))
        })
        .map(SheetDto::from)
        .collect();

    Ok(SheetListResponse {
        spreadsheet_id: spreadsheet.id,
        spreadsheet_title: spreadsheet.title,
        sheets,
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateSpreadsheetParams {
    pub title: String,
    /// Title of the first sheet (the service default when omitted)
    #[serde(default)]
    pub initial_sheet_name: Option<String>,
    /// Drive folder to place the spreadsheet in
    #[serde(default)]
    pub folder_id: Option<String>,
}

pub async fn create_spreadsheet(
    state: Arc<AppState>,
    params: CreateSpreadsheetParams,
) -> Result<SpreadsheetDto> {
    let title = params.title.trim();
    if title.is_empty() {
        return Err(ConnectorError::misconfiguration(
            "Title cannot be empty. Please provide a spreadsheet title and try again",
        )
        .into());
    }

    let created = state
        .backend()
        .create_spreadsheet(title, non_blank(&params.initial_sheet_name))
        .await?;
    if let Some(folder_id) = non_blank(&params.folder_id) {
        state.backend().move_file(&created.id, folder_id).await?;
    }

    Ok(SpreadsheetDto::from(&created))
}

use super::{non_blank, require, row_text, sheet_values, write_block};
use crate::address::{
    CellAddress, SheetRange, column_letters_to_index, ensure_sheet_name, index_to_column_letters,
    parse_positive_row,
};
use crate::client::{Dimension, SpreadsheetBackend};
use crate::error::{ConnectorError, ConnectorResult};
use crate::grid::is_blank_row;
use crate::model::{FindColumnResponse, RowResponse};
use crate::state::AppState;
use anyhow::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetRowParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    #[serde(deserialize_with = "row_text")]
    #[schemars(with = "String")]
    pub row: String,
    /// First column of the span, e.g. "A"
    pub start_column: String,
    /// Last column of the span, e.g. "F"
    pub end_column: String,
}

pub async fn get_row(state: Arc<AppState>, params: GetRowParams) -> Result<RowResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;
    let start = CellAddress::from_parts(&params.start_column, &params.row)?;
    let end = CellAddress::from_parts(&params.end_column, &params.row)?;

    let range = SheetRange::cells(&params.sheet_name, start, end).to_string();
    let grid = state.backend().get_values(spreadsheet_id, &range).await?;

    Ok(RowResponse {
        row_id: start.row,
        values: grid.into_iter().next().unwrap_or_default(),
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddRowParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub values: Vec<String>,
    /// Column the row starts at (default "A")
    #[serde(default)]
    pub column: Option<String>,
}

/// Append a row below the last used row of the sheet.
pub async fn add_row(state: Arc<AppState>, params: AddRowParams) -> Result<RowResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;
    if params.values.is_empty() {
        return Err(ConnectorError::misconfiguration(
            "The row cannot be null or empty. Please check your input and try again",
        )
        .into());
    }
    if is_blank_row(&params.values) {
        return Err(ConnectorError::misconfiguration(
            "The row cannot contain only empty values. Please check your input and try again",
        )
        .into());
    }
    let column = match non_blank(&params.column) {
        Some(letters) => column_letters_to_index(letters)?,
        None => 1,
    };

    let used = sheet_values(state.backend(), spreadsheet_id, &params.sheet_name).await?;
    let start = CellAddress::new(column, used.len() as u32 + 1)?;
    write_row(state.backend(), spreadsheet_id, &params.sheet_name, start, params.values)
        .await
        .map_err(Into::into)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateRowParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Cell the row starts at, e.g. "B4"
    pub cell_address: String,
    pub values: Vec<String>,
}

pub async fn update_row(state: Arc<AppState>, params: UpdateRowParams) -> Result<RowResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;
    let start = CellAddress::parse(&params.cell_address)?;
    write_row(state.backend(), spreadsheet_id, &params.sheet_name, start, params.values)
        .await
        .map_err(Into::into)
}

async fn write_row(
    backend: &dyn SpreadsheetBackend,
    spreadsheet_id: &str,
    sheet_name: &str,
    start: CellAddress,
    values: Vec<String>,
) -> ConnectorResult<RowResponse> {
    let (_, stored) = write_block(
        backend,
        spreadsheet_id,
        sheet_name,
        start,
        vec![values],
        Dimension::Rows,
    )
    .await?;
    Ok(RowResponse {
        row_id: start.row,
        values: stored.into_iter().next().unwrap_or_default(),
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FindColumnParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Row to search
    #[serde(deserialize_with = "row_text")]
    #[schemars(with = "String")]
    pub row: String,
    /// Exact, case-sensitive cell value to look for
    pub value: String,
}

pub async fn find_column(state: Arc<AppState>, params: FindColumnParams) -> Result<FindColumnResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;
    let row = parse_positive_row(&params.row)?;

    let range = SheetRange::rows(&params.sheet_name, row, row).to_string();
    let grid = state.backend().get_values(spreadsheet_id, &range).await?;
    let position = grid
        .first()
        .and_then(|values| values.iter().position(|value| *value == params.value));

    let column = position
        .map(|idx| index_to_column_letters(idx as u32 + 1))
        .transpose()?;
    Ok(FindColumnResponse { column })
}

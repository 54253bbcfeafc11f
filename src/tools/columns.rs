use super::{require, row_text, sheet_values, write_block};
use crate::address::{CellAddress, SheetRange, column_letters_to_index, ensure_sheet_name};
use crate::client::Dimension;
use crate::error::ConnectorError;
use crate::grid::first_column;
use crate::model::{ColumnResponse, FindRowResponse};
use crate::state::AppState;
use anyhow::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetColumnParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Column letters, e.g. "C"
    pub column: String,
    #[serde(deserialize_with = "row_text")]
    #[schemars(with = "String")]
    pub start_row: String,
    #[serde(deserialize_with = "row_text")]
    #[schemars(with = "String")]
    pub end_row: String,
}

pub async fn get_column(state: Arc<AppState>, params: GetColumnParams) -> Result<ColumnResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;
    let start = CellAddress::from_parts(&params.column, &params.start_row)?;
    let end = CellAddress::from_parts(&params.column, &params.end_row)?;

    let range = SheetRange::cells(&params.sheet_name, start, end).to_string();
    let grid = state.backend().get_values(spreadsheet_id, &range).await?;

    Ok(ColumnResponse {
        column: start.column_letters(),
        values: first_column(&grid),
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateColumnParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Cell the column starts at, e.g. "C2"
    pub cell_address: String,
    pub values: Vec<String>,
}

/// Write values downwards from a start cell.
pub async fn update_column(state: Arc<AppState>, params: UpdateColumnParams) -> Result<ColumnResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;
    if params.values.is_empty() {
        return Err(ConnectorError::misconfiguration(
            "Column data cannot be null or empty. Please check your input and try again",
        )
        .into());
    }
    let start = CellAddress::parse(&params.cell_address)?;

    let (_, stored) = write_block(
        state.backend(),
        spreadsheet_id,
        &params.sheet_name,
        start,
        vec![params.values],
        Dimension::Columns,
    )
    .await?;

    Ok(ColumnResponse {
        column: start.column_letters(),
        values: stored.into_iter().next().unwrap_or_default(),
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FindRowParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Column to search, e.g. "A"
    pub column: String,
    /// Exact, case-sensitive cell value to look for
    pub value: String,
}

pub async fn find_row(state: Arc<AppState>, params: FindRowParams) -> Result<FindRowResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;
    let column = column_letters_to_index(&params.column)?;

    let used_rows = sheet_values(state.backend(), spreadsheet_id, &params.sheet_name)
        .await?
        .len() as u32;
    if used_rows == 0 {
        return Ok(FindRowResponse { row: None });
    }

    let range = SheetRange::cells(
        &params.sheet_name,
        CellAddress::new(column, 1)?,
        CellAddress::new(column, used_rows)?,
    )
    .to_string();
    let grid = state.backend().get_values(spreadsheet_id, &range).await?;
    let row = first_column(&grid)
        .iter()
        .position(|value| *value == params.value)
        .map(|idx| idx as u32 + 1);

    Ok(FindRowResponse { row })
}

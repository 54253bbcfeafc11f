use super::{require, row_text, write_block};
use crate::address::{CellAddress, SheetRange, ensure_sheet_name};
use crate::client::Dimension;
use crate::error::ConnectorError;
use crate::model::CellResponse;
use crate::state::AppState;
use anyhow::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetCellParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Column letters, e.g. "A" or "AB"
    pub column: String,
    /// 1-based row number
    #[serde(deserialize_with = "row_text")]
    #[schemars(with = "String")]
    pub row: String,
}

pub async fn get_cell(state: Arc<AppState>, params: GetCellParams) -> Result<CellResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;
    let cell = CellAddress::from_parts(&params.column, &params.row)?;

    let range = SheetRange::cell(&params.sheet_name, cell).to_string();
    let grid = state.backend().get_values(spreadsheet_id, &range).await?;
    let value = grid
        .first()
        .and_then(|row| row.first())
        .cloned()
        .unwrap_or_default();

    Ok(CellResponse {
        address: cell.to_string(),
        value,
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateCellParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub column: String,
    #[serde(deserialize_with = "row_text")]
    #[schemars(with = "String")]
    pub row: String,
    /// Value as typed into the sheet; formulas start with "="
    pub value: String,
}

pub async fn update_cell(state: Arc<AppState>, params: UpdateCellParams) -> Result<CellResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;
    let cell = CellAddress::from_parts(&params.column, &params.row)?;

    let (_, stored) = write_block(
        state.backend(),
        spreadsheet_id,
        &params.sheet_name,
        cell,
        vec![vec![params.value]],
        Dimension::Rows,
    )
    .await?;

    let value = stored
        .first()
        .and_then(|row| row.first())
        .cloned()
        .ok_or_else(|| {
            ConnectorError::application(
                "No updated data was returned from the API. Please check your input and try again",
            )
        })?;

    Ok(CellResponse {
        address: cell.to_string(),
        value,
    })
}

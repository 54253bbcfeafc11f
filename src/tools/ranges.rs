use super::{require, sheet_values};
use crate::address::{CellAddress, RangeAddress, SheetRange, ensure_sheet_name, quote_sheet_name};
use crate::grid::{RowsResult, shape_grid};
use crate::model::ClearRangeResponse;
use crate::state::AppState;
use anyhow::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClearRangeParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// A1 range within the sheet, e.g. "A2:D10", "3:5" or "B:C"
    pub range: String,
}

pub async fn clear_range(state: Arc<AppState>, params: ClearRangeParams) -> Result<ClearRangeResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;
    let range = require(&params.range, "Range")?;

    let target = SheetRange::parse(&format!("{}!{range}", quote_sheet_name(&params.sheet_name)))?;
    let cleared_range = target.to_string();
    state
        .backend()
        .clear_values(spreadsheet_id, &cleared_range)
        .await?;

    Ok(ClearRangeResponse { cleared_range })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetRangeParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Top-left cell, e.g. "A1"
    pub start_cell: String,
    /// Bottom-right cell, e.g. "D20"
    pub end_cell: String,
}

/// Rows of a rectangular range, numbered from the range's first row.
pub async fn get_range(state: Arc<AppState>, params: GetRangeParams) -> Result<RowsResult> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    let start = CellAddress::parse(require(&params.start_cell, "Start cell")?)?;
    let end = CellAddress::parse(require(&params.end_cell, "End cell")?)?;
    let range = RangeAddress::new(params.sheet_name, start, end)?;

    let grid = state
        .backend()
        .get_values(spreadsheet_id, &range.to_a1())
        .await?;
    Ok(shape_grid(grid, range.first_row()))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetUsedRangeParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
}

/// Every row holding data, numbered from 1.
pub async fn get_used_range(state: Arc<AppState>, params: GetUsedRangeParams) -> Result<RowsResult> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;

    let grid = sheet_values(state.backend(), spreadsheet_id, &params.sheet_name).await?;
    Ok(shape_grid(grid, 1))
}

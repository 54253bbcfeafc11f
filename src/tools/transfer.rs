use super::{non_blank, require, sheet_values, write_block};
use crate::address::{CellAddress, SheetRange, ensure_sheet_name};
use crate::client::{Dimension, get_sheet_metadata};
use crate::csv_io::{CsvOptions, read_csv, write_csv};
use crate::error::ConnectorError;
use crate::grid::{max_width, pad_rows};
use crate::model::{CsvDownloadResponse, CsvImportResponse, SheetDto, XlsxPasteResponse};
use crate::state::AppState;
use crate::xlsx_io::read_first_sheet;
use anyhow::Result;
use base64::Engine;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImportCsvParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// CSV document text
    pub csv: String,
    #[serde(default)]
    pub options: CsvOptions,
    /// Cell to write the first value to, e.g. "B3". Rows are appended
    /// below the last used row when omitted.
    #[serde(default)]
    pub top_left_cell: Option<String>,
}

pub async fn import_csv(state: Arc<AppState>, params: ImportCsvParams) -> Result<CsvImportResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;
    let rows = read_csv(&params.csv, &params.options)?;
    if rows.is_empty() {
        return Err(ConnectorError::EmptyData("the CSV content has no rows to import".to_string()).into());
    }
    let backend = state.backend();

    let start = match non_blank(&params.top_left_cell) {
        Some(cell) => CellAddress::parse(cell)?,
        None => {
            let used = sheet_values(backend, spreadsheet_id, &params.sheet_name).await?;
            CellAddress::new(1, used.len() as u32 + 1)?
        }
    };

    let rows_written = rows.len();
    let columns_written = max_width(&rows);
    let (range, _) = write_block(
        backend,
        spreadsheet_id,
        &params.sheet_name,
        start,
        rows,
        Dimension::Rows,
    )
    .await?;

    let sheet = get_sheet_metadata(backend, spreadsheet_id, &params.sheet_name).await?;
    tracing::info!(
        spreadsheet_id,
        range = %range,
        rows = rows_written,
        columns = columns_written,
        "csv imported"
    );

    Ok(CsvImportResponse {
        sheet: SheetDto::from(&sheet),
        range: range.to_string(),
        rows_written,
        columns_written,
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DownloadCsvParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Top-left cell; the used range is exported unless both cells are given
    #[serde(default)]
    pub start_cell: Option<String>,
    #[serde(default)]
    pub end_cell: Option<String>,
    #[serde(default)]
    pub options: CsvOptions,
}

pub async fn download_csv(state: Arc<AppState>, params: DownloadCsvParams) -> Result<CsvDownloadResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;

    let mut rows = match (non_blank(&params.start_cell), non_blank(&params.end_cell)) {
        (Some(start), Some(end)) => {
            let range =
                SheetRange::cells(&params.sheet_name, CellAddress::parse(start)?, CellAddress::parse(end)?);
            state
                .backend()
                .get_values(spreadsheet_id, &range.to_string())
                .await?
        }
        _ => sheet_values(state.backend(), spreadsheet_id, &params.sheet_name).await?,
    };
    pad_rows(&mut rows);

    let row_count = rows.len();
    let columns = max_width(&rows);
    let csv = write_csv(rows, &params.options)?;

    Ok(CsvDownloadResponse {
        file_name: format!("{}.csv", params.sheet_name),
        rows: row_count,
        columns,
        csv,
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PasteFromXlsxParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Base64-encoded XLSX workbook; its first worksheet is pasted
    pub xlsx_base64: String,
    /// Cell the workbook's A1 lands on, "A1" when omitted
    #[serde(default)]
    pub top_left_cell: Option<String>,
}

/// Paste the first worksheet of an XLSX workbook into an existing sheet.
pub async fn paste_from_xlsx(state: Arc<AppState>, params: PasteFromXlsxParams) -> Result<XlsxPasteResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;
    let encoded = require(&params.xlsx_base64, "XLSX file")?;
    let start = match non_blank(&params.top_left_cell) {
        Some(cell) => CellAddress::parse(cell)?,
        None => CellAddress::new(1, 1)?,
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| ConnectorError::misconfiguration(format!("the XLSX file is not valid base64: {e}")))?;

    let backend = state.backend();
    let sheet = get_sheet_metadata(backend, spreadsheet_id, &params.sheet_name).await?;

    let source = read_first_sheet(&bytes)?;
    let mut rows = source.rows;
    if rows.is_empty() {
        return Err(ConnectorError::EmptyData(format!(
            "worksheet '{}' of the XLSX file has no values to paste",
            source.title
        ))
        .into());
    }
    pad_rows(&mut rows);

    let rows_written = rows.len();
    let columns_written = max_width(&rows);
    let (range, _) = write_block(
        backend,
        spreadsheet_id,
        &params.sheet_name,
        start,
        rows,
        Dimension::Rows,
    )
    .await?;
    tracing::info!(
        spreadsheet_id,
        source_sheet = %source.title,
        range = %range,
        rows = rows_written,
        "xlsx pasted"
    );

    Ok(XlsxPasteResponse {
        sheet: SheetDto::from(&sheet),
        source_sheet: source.title,
        range: range.to_string(),
        rows_written,
        columns_written,
    })
}

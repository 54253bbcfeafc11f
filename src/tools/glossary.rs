use super::{non_blank, require, sheet_values, write_block};
use crate::address::{CellAddress, SheetRange, ensure_sheet_name};
use crate::client::Dimension;
use crate::glossary::{Glossary, codec, read_tbx, write_tbx};
use crate::model::{GlossaryExportResponse, GlossaryImportResponse, SheetDto};
use crate::state::AppState;
use anyhow::Result;
use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

const FALLBACK_GLOSSARY_TITLE: &str = "Glossary";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImportGlossaryParams {
    pub spreadsheet_id: String,
    /// TBX document text
    pub tbx: String,
    /// Name of the uploaded file; its stem titles the sheet when the TBX has no title
    #[serde(default)]
    pub file_name: Option<String>,
    /// Overwrite an existing sheet that has the same title as the glossary
    #[serde(default)]
    pub overwrite_sheet: Option<bool>,
}

/// Write a TBX glossary into a sheet titled after it.
pub async fn import_glossary(
    state: Arc<AppState>,
    params: ImportGlossaryParams,
) -> Result<GlossaryImportResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    let glossary = read_tbx(&params.tbx)?;
    let grid = codec::import_glossary(&glossary.entries)?;
    let languages = codec::languages_present(&glossary.entries);
    let backend = state.backend();

    let mut title = glossary_title(&glossary, params.file_name.as_deref());
    let overwrite = params.overwrite_sheet.unwrap_or(false);
    let spreadsheet = backend.get_spreadsheet(spreadsheet_id).await?;
    let existing = spreadsheet.sheet(&title).cloned();

    let (sheet, overwritten) = match existing {
        Some(sheet) if overwrite => {
            backend
                .clear_values(spreadsheet_id, &SheetRange::whole_sheet(&sheet.title).to_string())
                .await?;
            (sheet, true)
        }
        Some(_) => {
            title = format!("{title} {}", Utc::now().format("%Y-%m-%d %H:%M"));
            (backend.add_sheet(spreadsheet_id, &title).await?, false)
        }
        None => (backend.add_sheet(spreadsheet_id, &title).await?, false),
    };

    let entries = grid.len() - 1;
    write_block(
        backend,
        spreadsheet_id,
        &sheet.title,
        CellAddress { column: 1, row: 1 },
        grid,
        Dimension::Rows,
    )
    .await?;
    tracing::info!(
        spreadsheet_id,
        sheet = %sheet.title,
        entries,
        overwritten,
        "glossary imported"
    );

    Ok(GlossaryImportResponse {
        sheet: SheetDto::from(&sheet),
        entries,
        languages,
        overwritten,
    })
}

fn glossary_title(glossary: &Glossary, file_name: Option<&str>) -> String {
    if let Some(title) = glossary.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }
    file_name
        .map(Path::new)
        .and_then(Path::file_stem)
        .and_then(|stem| stem.to_str())
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(FALLBACK_GLOSSARY_TITLE)
        .to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExportGlossaryParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Glossary title (defaults to the sheet name)
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source_description: Option<String>,
}

/// Read a glossary laid out as header + entry rows and render it as TBX.
pub async fn export_glossary(
    state: Arc<AppState>,
    params: ExportGlossaryParams,
) -> Result<GlossaryExportResponse> {
    let spreadsheet_id = require(&params.spreadsheet_id, "Spreadsheet ID")?;
    ensure_sheet_name(&params.sheet_name)?;

    let grid = sheet_values(state.backend(), spreadsheet_id, &params.sheet_name).await?;
    let entries = codec::export_glossary(&grid)?;

    let title = non_blank(&params.title)
        .unwrap_or(&params.sheet_name)
        .to_string();
    let source_description = non_blank(&params.source_description)
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "Glossary export from Google Sheets on {}",
                Utc::now().format("%A, %d %B %Y %H:%M:%S UTC")
            )
        });

    let glossary = Glossary {
        title: Some(title.clone()),
        source_description: Some(source_description),
        entries,
    };
    let tbx = write_tbx(&glossary)?;

    Ok(GlossaryExportResponse {
        file_name: format!("{title}.tbx"),
        title,
        entries: glossary.entries.len(),
        tbx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_falls_back_to_file_stem() {
        let mut glossary = Glossary::new(Vec::new());
        assert_eq!(glossary_title(&glossary, Some("uploads/terms.tbx")), "terms");
        assert_eq!(glossary_title(&glossary, None), "Glossary");

        glossary.title = Some("  Medical terms ".to_string());
        assert_eq!(glossary_title(&glossary, Some("terms.tbx")), "Medical terms");
    }
}

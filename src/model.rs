use crate::client::{DriveFile, SheetProperties, SpreadsheetMeta};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CellResponse {
    /// A1 address of the cell, e.g. "B7"
    pub address: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RowResponse {
    pub row_id: u32,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnResponse {
    /// Column letters, e.g. "C"
    pub column: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClearRangeResponse {
    pub cleared_range: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FindRowResponse {
    /// 1-based row number of the first exact match
    pub row: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FindColumnResponse {
    /// Column letters of the first exact match
    pub column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SheetDto {
    pub sheet_id: String,
    pub title: String,
    pub index: u32,
    pub sheet_type: String,
}

impl From<&SheetProperties> for SheetDto {
    fn from(properties: &SheetProperties) -> Self {
        Self {
            sheet_id: properties.sheet_id.to_string(),
            title: properties.title.clone(),
            index: properties.index,
            sheet_type: properties.sheet_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SheetListResponse {
    pub spreadsheet_id: String,
    pub spreadsheet_title: String,
    pub sheets: Vec<SheetDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeleteSheetResponse {
    pub spreadsheet_id: String,
    pub deleted_sheet: SheetDto,
    pub remaining_sheets: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SpreadsheetDto {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
}

impl From<&SpreadsheetMeta> for SpreadsheetDto {
    fn from(meta: &SpreadsheetMeta) -> Self {
        Self {
            id: meta.id.clone(),
            title: meta.title.clone(),
            url: meta.url.clone(),
        }
    }
}

impl From<&DriveFile> for SpreadsheetDto {
    fn from(file: &DriveFile) -> Self {
        Self {
            id: file.id.clone(),
            title: file.name.clone(),
            url: file.web_view_link.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SpreadsheetListResponse {
    pub spreadsheets: Vec<SpreadsheetDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MoveFileResponse {
    pub id: String,
    pub name: String,
    pub parents: Vec<String>,
    pub url: Option<String>,
}

impl From<DriveFile> for MoveFileResponse {
    fn from(file: DriveFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            parents: file.parents,
            url: file.web_view_link,
        }
    }
}

/// Binary file content returned inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FileContentResponse {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub content_base64: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CsvImportResponse {
    pub sheet: SheetDto,
    /// Range the rows were written to
    pub range: String,
    pub rows_written: usize,
    pub columns_written: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct XlsxPasteResponse {
    pub sheet: SheetDto,
    /// Worksheet of the uploaded workbook the values came from
    pub source_sheet: String,
    pub range: String,
    pub rows_written: usize,
    pub columns_written: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CsvDownloadResponse {
    pub file_name: String,
    pub rows: usize,
    pub columns: usize,
    pub csv: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GlossaryImportResponse {
    pub sheet: SheetDto,
    pub entries: usize,
    pub languages: Vec<String>,
    /// True when an existing sheet was cleared and rewritten
    pub overwritten: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GlossaryExportResponse {
    pub file_name: String,
    pub title: String,
    pub entries: usize,
    /// TBX document
    pub tbx: String,
}

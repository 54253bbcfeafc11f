//! In-process spreadsheet service used by tests and local experiments.
//!
//! Mirrors the remote behaviour the connector depends on: reads omit
//! trailing empty cells and rows, writes past the last row of a sheet fail
//! until rows are appended, and unknown ids answer 404.

use super::{
    DriveFile, DriveFilePage, Dimension, FileQuery, MIME_GOOGLE_SHEET, MIME_PDF, MIME_XLSX,
    SheetProperties, SpreadsheetBackend, SpreadsheetMeta,
};
use crate::address::{CellAddress, SheetRange, Span};
use crate::error::{ConnectorError, ConnectorResult};
use crate::grid::ValueGrid;
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

const DEFAULT_ROWS: u32 = 1000;
const DEFAULT_COLUMNS: u32 = 26;
const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
struct MemorySheet {
    properties: SheetProperties,
    cells: ValueGrid,
}

impl MemorySheet {
    fn new(sheet_id: i64, title: &str, index: u32, rows: u32) -> Self {
        Self {
            properties: SheetProperties {
                sheet_id,
                title: title.to_string(),
                index,
                sheet_type: "GRID".to_string(),
                row_count: rows,
                column_count: DEFAULT_COLUMNS,
            },
            cells: Vec::new(),
        }
    }

    fn get(&self, row: u32, column: u32) -> &str {
        self.cells
            .get(row as usize - 1)
            .and_then(|r| r.get(column as usize - 1))
            .map(String::as_str)
            .unwrap_or("")
    }

    fn set(&mut self, row: u32, column: u32, value: String) {
        let (r, c) = (row as usize - 1, column as usize - 1);
        if self.cells.len() <= r {
            self.cells.resize(r + 1, Vec::new());
        }
        let cells = &mut self.cells[r];
        if cells.len() <= c {
            cells.resize(c + 1, String::new());
        }
        cells[c] = value;
    }

    fn used_rows(&self) -> u32 {
        self.cells.len() as u32
    }

    fn used_columns(&self) -> u32 {
        self.cells.iter().map(Vec::len).max().unwrap_or(0) as u32
    }

    /// Inclusive bounds of a span, clamped to what holds data. Corners may
    /// come in any order.
    fn bounds(&self, span: Span) -> (CellAddress, CellAddress) {
        let last = CellAddress {
            column: self.used_columns().max(1),
            row: self.used_rows().max(1),
        };
        let (a, b) = match span {
            Span::Sheet => (CellAddress { column: 1, row: 1 }, last),
            Span::Cells(start, end) => (start, end),
            Span::Rows(first, end) => (
                CellAddress { column: 1, row: first },
                CellAddress { column: last.column, row: end },
            ),
            Span::Columns(first, end) => (
                CellAddress { column: first, row: 1 },
                CellAddress { column: end, row: last.row },
            ),
        };
        (
            CellAddress {
                column: a.column.min(b.column),
                row: a.row.min(b.row),
            },
            CellAddress {
                column: a.column.max(b.column),
                row: a.row.max(b.row),
            },
        )
    }

    fn read(&self, span: Span) -> ValueGrid {
        let (start, end) = self.bounds(span);
        let mut grid: ValueGrid = (start.row..=end.row)
            .map(|row| {
                let mut values: Vec<String> = (start.column..=end.column)
                    .map(|column| self.get(row, column).to_string())
                    .collect();
                while values.last().is_some_and(String::is_empty) {
                    values.pop();
                }
                values
            })
            .collect();
        while grid.last().is_some_and(Vec::is_empty) {
            grid.pop();
        }
        grid
    }
}

#[derive(Debug, Clone)]
struct MemorySpreadsheet {
    id: String,
    title: String,
    sheets: Vec<MemorySheet>,
}

impl MemorySpreadsheet {
    fn meta(&self) -> SpreadsheetMeta {
        SpreadsheetMeta {
            id: self.id.clone(),
            title: self.title.clone(),
            url: Some(format!("https://docs.google.com/spreadsheets/d/{}/edit", self.id)),
            sheets: self.sheets.iter().map(|s| s.properties.clone()).collect(),
        }
    }

    fn sheet_mut(&mut self, title: &str) -> ConnectorResult<&mut MemorySheet> {
        self.sheets
            .iter_mut()
            .find(|sheet| sheet.properties.title == title)
            .ok_or_else(|| bad_request(format!("Unable to parse range: {title}")))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    spreadsheets: IndexMap<String, MemorySpreadsheet>,
    files: IndexMap<String, DriveFile>,
    contents: IndexMap<String, Vec<u8>>,
    next_id: u64,
    next_sheet_id: i64,
}

impl MemoryState {
    fn allocate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:04}", self.next_id)
    }

    fn allocate_sheet_id(&mut self) -> i64 {
        let id = self.next_sheet_id;
        self.next_sheet_id += 1;
        id
    }

    fn spreadsheet_mut(&mut self, id: &str) -> ConnectorResult<&mut MemorySpreadsheet> {
        self.spreadsheets.get_mut(id).ok_or_else(not_found)
    }
}

/// Spreadsheet and drive state held in memory.
#[derive(Debug)]
pub struct InMemoryBackend {
    state: RwLock<MemoryState>,
    calls: Mutex<Vec<String>>,
    fail_next: Mutex<Option<ConnectorError>>,
    page_size: usize,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            calls: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            page_size: page_size.max(1),
        }
    }

    /// Create a spreadsheet with the given sheets and row counts; returns its id.
    pub fn seed_spreadsheet(&self, title: &str, sheets: &[(&str, u32)]) -> String {
        let mut state = self.state.write();
        let id = state.allocate_id("sheet");
        let sheets = sheets
            .iter()
            .enumerate()
            .map(|(index, (name, rows))| {
                let sheet_id = state.allocate_sheet_id();
                MemorySheet::new(sheet_id, name, index as u32, *rows)
            })
            .collect();
        state.spreadsheets.insert(
            id.clone(),
            MemorySpreadsheet {
                id: id.clone(),
                title: title.to_string(),
                sheets,
            },
        );
        state.files.insert(
            id.clone(),
            DriveFile {
                id: id.clone(),
                name: title.to_string(),
                mime_type: MIME_GOOGLE_SHEET.to_string(),
                parents: vec!["root".to_string()],
                web_view_link: None,
                trashed: false,
                shortcut_details: None,
            },
        );
        id
    }

    /// Replace a sheet's contents, growing it when the grid is taller.
    pub fn set_values(&self, spreadsheet_id: &str, sheet: &str, grid: ValueGrid) {
        let mut state = self.state.write();
        if let Some(sheet) = state
            .spreadsheets
            .get_mut(spreadsheet_id)
            .and_then(|s| s.sheets.iter_mut().find(|s| s.properties.title == sheet))
        {
            sheet.properties.row_count = sheet.properties.row_count.max(grid.len() as u32);
            sheet.cells = grid;
        }
    }

    /// Contents of a sheet as a remote read of the whole sheet would return them.
    pub fn sheet_values(&self, spreadsheet_id: &str, sheet: &str) -> Option<ValueGrid> {
        let state = self.state.read();
        state
            .spreadsheets
            .get(spreadsheet_id)?
            .sheets
            .iter()
            .find(|s| s.properties.title == sheet)
            .map(|s| s.read(Span::Sheet))
    }

    /// Register a drive file, optionally with downloadable content.
    pub fn add_file(&self, file: DriveFile, content: Option<Vec<u8>>) {
        let mut state = self.state.write();
        if let Some(content) = content {
            state.contents.insert(file.id.clone(), content);
        }
        state.files.insert(file.id.clone(), file);
    }

    pub fn file(&self, file_id: &str) -> Option<DriveFile> {
        self.state.read().files.get(file_id).cloned()
    }

    /// Make the next backend call fail with `error`.
    pub fn fail_next(&self, error: ConnectorError) {
        *self.fail_next.lock() = Some(error);
    }

    /// Names of the backend operations invoked so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn enter(&self, call: String) -> ConnectorResult<()> {
        self.calls.lock().push(call);
        match self.fail_next.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SpreadsheetBackend for InMemoryBackend {
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> ConnectorResult<ValueGrid> {
        self.enter(format!("get_values {range}"))?;
        let range = SheetRange::parse(range).map_err(|e| bad_request(e.to_string()))?;
        let mut state = self.state.write();
        let spreadsheet = state.spreadsheet_mut(spreadsheet_id)?;
        let sheet = spreadsheet.sheet_mut(&range.sheet)?;
        Ok(sheet.read(range.span))
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: ValueGrid,
        dimension: Dimension,
    ) -> ConnectorResult<ValueGrid> {
        self.enter(format!("update_values {range} {}", dimension.as_str()))?;
        let range = SheetRange::parse(range).map_err(|e| bad_request(e.to_string()))?;
        let start = range
            .start_cell()
            .unwrap_or(CellAddress { column: 1, row: 1 });

        let mut state = self.state.write();
        let spreadsheet = state.spreadsheet_mut(spreadsheet_id)?;
        let sheet = spreadsheet.sheet_mut(&range.sheet)?;

        let mut writes = Vec::new();
        for (outer, line) in values.iter().enumerate() {
            for (inner, value) in line.iter().enumerate() {
                let (row_offset, column_offset) = match dimension {
                    Dimension::Rows => (outer, inner),
                    Dimension::Columns => (inner, outer),
                };
                writes.push((start.offset(column_offset as u32, row_offset as u32), value));
            }
        }

        let max_row = writes.iter().map(|(cell, _)| cell.row).max().unwrap_or(0);
        if max_row > sheet.properties.row_count {
            return Err(bad_request(format!(
                "Range ('{}'!{start}) exceeds grid limits. Max rows: {}",
                range.sheet, sheet.properties.row_count
            )));
        }
        for (cell, value) in writes {
            sheet.properties.column_count = sheet.properties.column_count.max(cell.column);
            sheet.set(cell.row, cell.column, value.clone());
        }
        Ok(values)
    }

    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> ConnectorResult<()> {
        self.enter(format!("clear_values {range}"))?;
        let range = SheetRange::parse(range).map_err(|e| bad_request(e.to_string()))?;
        let mut state = self.state.write();
        let spreadsheet = state.spreadsheet_mut(spreadsheet_id)?;
        let sheet = spreadsheet.sheet_mut(&range.sheet)?;
        let (start, end) = sheet.bounds(range.span);
        for row in start.row..=end.row.min(sheet.used_rows()) {
            for column in start.column..=end.column.min(sheet.used_columns()) {
                sheet.set(row, column, String::new());
            }
        }
        while sheet.cells.last().is_some_and(|r| r.iter().all(String::is_empty)) {
            sheet.cells.pop();
        }
        Ok(())
    }

    async fn get_spreadsheet(&self, spreadsheet_id: &str) -> ConnectorResult<SpreadsheetMeta> {
        self.enter(format!("get_spreadsheet {spreadsheet_id}"))?;
        let state = self.state.read();
        state
            .spreadsheets
            .get(spreadsheet_id)
            .map(MemorySpreadsheet::meta)
            .ok_or_else(not_found)
    }

    async fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> ConnectorResult<SheetProperties> {
        self.enter(format!("add_sheet {title}"))?;
        let mut state = self.state.write();
        let sheet_id = state.allocate_sheet_id();
        let spreadsheet = state.spreadsheet_mut(spreadsheet_id)?;
        if spreadsheet.sheets.iter().any(|s| s.properties.title == title) {
            return Err(bad_request(format!(
                "Invalid requests[0].addSheet: A sheet with the name \"{title}\" already exists. Please enter another name."
            )));
        }
        let sheet = MemorySheet::new(sheet_id, title, spreadsheet.sheets.len() as u32, DEFAULT_ROWS);
        let properties = sheet.properties.clone();
        spreadsheet.sheets.push(sheet);
        Ok(properties)
    }

    async fn delete_sheet(&self, spreadsheet_id: &str, sheet_id: i64) -> ConnectorResult<()> {
        self.enter(format!("delete_sheet {sheet_id}"))?;
        let mut state = self.state.write();
        let spreadsheet = state.spreadsheet_mut(spreadsheet_id)?;
        let before = spreadsheet.sheets.len();
        spreadsheet.sheets.retain(|s| s.properties.sheet_id != sheet_id);
        if spreadsheet.sheets.len() == before {
            return Err(bad_request(format!("No grid with id: {sheet_id}")));
        }
        for (index, sheet) in spreadsheet.sheets.iter_mut().enumerate() {
            sheet.properties.index = index as u32;
        }
        Ok(())
    }

    async fn append_rows(&self, spreadsheet_id: &str, sheet_id: i64, count: u32) -> ConnectorResult<()> {
        self.enter(format!("append_rows {sheet_id} {count}"))?;
        let mut state = self.state.write();
        let spreadsheet = state.spreadsheet_mut(spreadsheet_id)?;
        let sheet = spreadsheet
            .sheets
            .iter_mut()
            .find(|s| s.properties.sheet_id == sheet_id)
            .ok_or_else(|| bad_request(format!("No grid with id: {sheet_id}")))?;
        sheet.properties.row_count = sheet.properties.row_count.saturating_add(count);
        Ok(())
    }

    async fn create_spreadsheet(
        &self,
        title: &str,
        initial_sheet: Option<&str>,
    ) -> ConnectorResult<SpreadsheetMeta> {
        self.enter(format!("create_spreadsheet {title}"))?;
        let id = self.seed_spreadsheet(title, &[(initial_sheet.unwrap_or("Sheet1"), DEFAULT_ROWS)]);
        let state = self.state.read();
        state
            .spreadsheets
            .get(&id)
            .map(MemorySpreadsheet::meta)
            .ok_or_else(not_found)
    }

    async fn get_file(&self, file_id: &str) -> ConnectorResult<DriveFile> {
        self.enter(format!("get_file {file_id}"))?;
        self.state.read().files.get(file_id).cloned().ok_or_else(not_found)
    }

    async fn move_file(&self, file_id: &str, new_parent: &str) -> ConnectorResult<DriveFile> {
        self.enter(format!("move_file {file_id} {new_parent}"))?;
        let mut state = self.state.write();
        let file = state.files.get_mut(file_id).ok_or_else(not_found)?;
        file.parents = vec![new_parent.to_string()];
        Ok(file.clone())
    }

    async fn list_files(
        &self,
        query: &FileQuery,
        page_token: Option<&str>,
    ) -> ConnectorResult<DriveFilePage> {
        self.enter(format!("list_files {}", query.to_drive_query()))?;
        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| bad_request(format!("Invalid page token: {token}")))?,
            None => 0,
        };
        let state = self.state.read();
        let matching: Vec<DriveFile> = state
            .files
            .values()
            .filter(|file| query.matches(file))
            .cloned()
            .collect();
        let end = (offset + self.page_size).min(matching.len());
        let files = matching.get(offset..end).map(<[DriveFile]>::to_vec).unwrap_or_default();
        let next_page_token = (end < matching.len()).then(|| end.to_string());
        Ok(DriveFilePage {
            files,
            next_page_token,
        })
    }

    async fn export_file(&self, file_id: &str, mime_type: &str) -> ConnectorResult<Vec<u8>> {
        self.enter(format!("export_file {file_id} {mime_type}"))?;
        let state = self.state.read();
        let file = state.files.get(file_id).ok_or_else(not_found)?;
        if file.mime_type != MIME_GOOGLE_SHEET {
            return Err(ConnectorError::Remote {
                status: 403,
                message: "Export only supports Docs Editors files.".to_string(),
            });
        }
        let prefix: &[u8] = match mime_type {
            MIME_PDF => b"%PDF-1.4\n",
            MIME_XLSX => b"PK\x03\x04",
            _ => return Err(bad_request(format!("Unsupported export format: {mime_type}"))),
        };
        let mut bytes = prefix.to_vec();
        bytes.extend_from_slice(file.name.as_bytes());
        Ok(bytes)
    }

    async fn download_file(&self, file_id: &str) -> ConnectorResult<Vec<u8>> {
        self.enter(format!("download_file {file_id}"))?;
        let state = self.state.read();
        if !state.files.contains_key(file_id) {
            return Err(not_found());
        }
        state.contents.get(file_id).cloned().ok_or_else(|| ConnectorError::Remote {
            status: 403,
            message: "Only files with binary content can be downloaded.".to_string(),
        })
    }
}

fn bad_request(message: impl Into<String>) -> ConnectorError {
    ConnectorError::Remote {
        status: 400,
        message: message.into(),
    }
}

fn not_found() -> ConnectorError {
    ConnectorError::Remote {
        status: 404,
        message: "Requested entity was not found.".to_string(),
    }
}

//! Reading the cell grid out of an uploaded XLSX workbook.

use crate::address::CellAddress;
use crate::error::{ConnectorError, ConnectorResult};
use crate::grid::ValueGrid;
use std::io::Cursor;

/// Cell values of one worksheet, with its title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetGrid {
    pub title: String,
    pub rows: ValueGrid,
}

/// Read the first worksheet of an XLSX workbook.
///
/// Rows keep interior blanks as empty strings; trailing blank cells and rows
/// are dropped, the way the Sheets API reports values.
pub fn read_first_sheet(bytes: &[u8]) -> ConnectorResult<WorksheetGrid> {
    let book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true)
        .map_err(|e| ConnectorError::misconfiguration(format!("the file is not a readable XLSX workbook: {e}")))?;
    let sheet = book
        .get_sheet(&0)
        .ok_or_else(|| ConnectorError::EmptyData("the XLSX workbook has no worksheets".to_string()))?;

    let (max_column, max_row) = sheet.get_highest_column_and_row();
    let mut rows: ValueGrid = Vec::with_capacity(max_row as usize);
    for row in 1..=max_row {
        let mut values = Vec::with_capacity(max_column as usize);
        for column in 1..=max_column {
            let address = CellAddress { column, row }.to_string();
            let value = sheet
                .get_cell(address.as_str())
                .map(|cell| cell.get_value().to_string())
                .unwrap_or_default();
            values.push(value);
        }
        while values.last().is_some_and(String::is_empty) {
            values.pop();
        }
        rows.push(values);
    }
    while rows.last().is_some_and(Vec::is_empty) {
        rows.pop();
    }

    Ok(WorksheetGrid {
        title: sheet.get_name().to_string(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn workbook(cells: &[(&str, &str)]) -> Vec<u8> {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        for (address, value) in cells {
            sheet.get_cell_mut(*address).set_value(*value);
        }
        let mut buffer = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buffer).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn reads_first_sheet_with_interior_blanks() {
        let bytes = workbook(&[("A1", "item"), ("C1", "qty"), ("A3", "pad")]);
        let sheet = read_first_sheet(&bytes).unwrap();
        assert_eq!(sheet.title, "Sheet1");
        assert_eq!(
            sheet.rows,
            vec![
                vec!["item".to_string(), String::new(), "qty".to_string()],
                Vec::new(),
                vec!["pad".to_string()],
            ]
        );
    }

    #[test]
    fn rejects_non_xlsx_bytes() {
        assert_matches!(
            read_first_sheet(b"id,name\n1,pen\n"),
            Err(ConnectorError::Misconfiguration(_))
        );
    }
}

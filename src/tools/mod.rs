pub mod cells;
pub mod columns;
pub mod files;
pub mod glossary;
pub mod ranges;
pub mod rows;
pub mod sheets;
pub mod transfer;
pub mod triggers;

pub use cells::*;
pub use columns::*;
pub use files::*;
pub use glossary::*;
pub use ranges::*;
pub use rows::*;
pub use sheets::*;
pub use transfer::*;
pub use triggers::*;

use crate::address::{CellAddress, SheetRange};
use crate::client::{Dimension, SpreadsheetBackend};
use crate::error::{ConnectorError, ConnectorResult};
use crate::expander::expand_row_limits;
use crate::grid::ValueGrid;
use serde::{Deserialize, Deserializer};

/// Trimmed value of a required text parameter.
pub(crate) fn require<'a>(value: &'a str, what: &str) -> ConnectorResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConnectorError::misconfiguration(format!(
            "{what} cannot be empty. Please check your input and try again"
        )));
    }
    Ok(trimmed)
}

/// Present and non-blank optional text.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|text| !text.is_empty())
}

/// Row parameters arrive as text or as a JSON number; both end up as text
/// so row parsing reports the same error either way.
pub(crate) fn row_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RowText {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match RowText::deserialize(deserializer)? {
        RowText::Text(text) => text,
        RowText::Integer(value) => value.to_string(),
        RowText::Float(value) => value.to_string(),
    })
}

pub(crate) async fn sheet_values(
    backend: &dyn SpreadsheetBackend,
    spreadsheet_id: &str,
    sheet_name: &str,
) -> ConnectorResult<ValueGrid> {
    let range = SheetRange::whole_sheet(sheet_name).to_string();
    backend.get_values(spreadsheet_id, &range).await
}

/// Write `values` starting at `start`, growing the sheet first so the last
/// written row exists. Returns the stored grid.
pub(crate) async fn write_block(
    backend: &dyn SpreadsheetBackend,
    spreadsheet_id: &str,
    sheet_name: &str,
    start: CellAddress,
    values: ValueGrid,
    dimension: Dimension,
) -> ConnectorResult<(SheetRange, ValueGrid)> {
    let (rows, columns) = block_size(&values, dimension);
    if rows == 0 || columns == 0 {
        return Err(ConnectorError::misconfiguration(
            "there are no values to write. Please check your input and try again",
        ));
    }
    let end = start.offset(columns - 1, rows - 1);
    expand_row_limits(backend, spreadsheet_id, sheet_name, end.row).await?;

    let range = SheetRange::cells(sheet_name, start, end);
    let stored = backend
        .update_values(spreadsheet_id, &range.to_string(), values, dimension)
        .await?;
    Ok((range, stored))
}

/// (rows, columns) the grid covers on the sheet.
fn block_size(values: &ValueGrid, dimension: Dimension) -> (u32, u32) {
    let outer = values.len() as u32;
    let inner = values.iter().map(Vec::len).max().unwrap_or(0) as u32;
    match dimension {
        Dimension::Rows => (outer, inner),
        Dimension::Columns => (inner, outer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "row_text")]
        row: String,
    }

    #[test]
    fn row_accepts_text_and_numbers() {
        let text: Probe = serde_json::from_str(r#"{"row": "12"}"#).unwrap();
        assert_eq!(text.row, "12");
        let number: Probe = serde_json::from_str(r#"{"row": 7}"#).unwrap();
        assert_eq!(number.row, "7");
    }

    #[test]
    fn require_rejects_blank_values() {
        assert_eq!(require("  abc ", "Spreadsheet ID").unwrap(), "abc");
        assert_matches!(
            require("   ", "Spreadsheet ID"),
            Err(ConnectorError::Misconfiguration(message)) if message.starts_with("Spreadsheet ID cannot be empty")
        );
    }

    #[test]
    fn block_size_follows_dimension() {
        let values = vec![vec!["a".to_string(), "b".to_string(), "c".to_string()]];
        assert_eq!(block_size(&values, Dimension::Rows), (1, 3));
        assert_eq!(block_size(&values, Dimension::Columns), (3, 1));
        assert_eq!(block_size(&Vec::new(), Dimension::Rows), (0, 0));
    }
}

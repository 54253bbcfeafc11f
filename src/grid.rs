//! Value grids and the row-numbered shapes returned to callers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rows of cell text as retrieved; rows may differ in length.
pub type ValueGrid = Vec<Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RowEntry {
    pub row_id: u32,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RowsResult {
    pub rows: Vec<RowEntry>,
    pub rows_count: usize,
}

/// Text form of a JSON cell value, empty for null.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        other => other.to_string(),
    }
}

pub fn grid_from_json(rows: &[Vec<Value>]) -> ValueGrid {
    rows.iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect()
}

/// Number each row starting at `start_row`.
pub fn shape_grid(grid: ValueGrid, start_row: u32) -> RowsResult {
    let rows_count = grid.len();
    let rows = grid
        .into_iter()
        .enumerate()
        .map(|(idx, values)| RowEntry {
            row_id: start_row.saturating_add(idx as u32),
            values,
        })
        .collect();
    RowsResult { rows, rows_count }
}

pub fn max_width(grid: &[Vec<String>]) -> usize {
    grid.iter().map(Vec::len).max().unwrap_or(0)
}

/// Pad every row with empty strings to the widest row.
pub fn pad_rows(grid: &mut ValueGrid) {
    let width = max_width(grid);
    for row in grid.iter_mut() {
        row.resize(width, String::new());
    }
}

/// First value of every row, empty for empty rows.
pub fn first_column(grid: &[Vec<String>]) -> Vec<String> {
    grid.iter()
        .map(|row| row.first().cloned().unwrap_or_default())
        .collect()
}

pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grid(rows: &[&[&str]]) -> ValueGrid {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn numbers_rows_from_start() {
        let shaped = shape_grid(grid(&[&["a", "b"], &["c", "d"], &["e", "f"]]), 5);
        let ids: Vec<u32> = shaped.rows.iter().map(|r| r.row_id).collect();
        assert_eq!(ids, vec![5, 6, 7]);
        assert_eq!(shaped.rows_count, 3);
        assert_eq!(shaped.rows[1].values, vec!["c", "d"]);
    }

    #[test]
    fn empty_grid_shapes_to_nothing() {
        let shaped = shape_grid(Vec::new(), 1);
        assert!(shaped.rows.is_empty());
        assert_eq!(shaped.rows_count, 0);
    }

    #[test]
    fn pads_uneven_rows() {
        let mut rows = grid(&[&["a"], &["b", "c", "d"], &[]]);
        pad_rows(&mut rows);
        assert!(rows.iter().all(|r| r.len() == 3));
        assert_eq!(rows[0], vec!["a", "", ""]);
    }

    #[test]
    fn converts_json_cells() {
        let rows = vec![vec![json!("x"), Value::Null, json!(3), json!(true)]];
        assert_eq!(grid_from_json(&rows), grid(&[&["x", "", "3", "TRUE"]]));
    }

    #[test]
    fn first_column_handles_short_rows() {
        assert_eq!(first_column(&grid(&[&["a", "b"], &[]])), vec!["a", ""]);
    }
}

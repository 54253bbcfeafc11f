//! CSV text to value grids and back.

use crate::error::{ConnectorError, ConnectorResult};
use crate::grid::{ValueGrid, is_blank_row, pad_rows};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Dialect options; every character option must be a single ASCII byte.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CsvOptions {
    /// Field delimiter (default `,`)
    #[serde(default)]
    pub delimiter: Option<String>,
    /// Quote character (default `"`)
    #[serde(default)]
    pub quote: Option<String>,
    /// Escape character inside quoted fields; doubled quotes are used when unset
    #[serde(default)]
    pub escape: Option<String>,
    /// Lines starting with this character are skipped when reading
    #[serde(default)]
    pub comment: Option<String>,
    /// Skip lines whose fields are all blank (default true)
    #[serde(default)]
    pub ignore_blank_lines: Option<bool>,
    /// Record terminator for written CSV, `\n` or `\r\n` (default `\r\n`)
    #[serde(default)]
    pub newline: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct Dialect {
    delimiter: u8,
    quote: u8,
    escape: Option<u8>,
    comment: Option<u8>,
    ignore_blank_lines: bool,
    terminator: csv::Terminator,
}

impl CsvOptions {
    fn dialect(&self) -> ConnectorResult<Dialect> {
        let terminator = match self.newline.as_deref() {
            None | Some("\r\n") => csv::Terminator::CRLF,
            Some(other) => csv::Terminator::Any(single_byte("newline", other)?),
        };
        Ok(Dialect {
            delimiter: optional_byte("delimiter", self.delimiter.as_deref())?.unwrap_or(b','),
            quote: optional_byte("quote", self.quote.as_deref())?.unwrap_or(b'"'),
            escape: optional_byte("escape", self.escape.as_deref())?,
            comment: optional_byte("comment", self.comment.as_deref())?,
            ignore_blank_lines: self.ignore_blank_lines.unwrap_or(true),
            terminator,
        })
    }
}

fn optional_byte(name: &str, value: Option<&str>) -> ConnectorResult<Option<u8>> {
    match value {
        None | Some("") => Ok(None),
        Some(text) => single_byte(name, text).map(Some),
    }
}

fn single_byte(name: &str, value: &str) -> ConnectorResult<u8> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(ConnectorError::misconfiguration(format!(
            "CSV {name} must be a single ASCII character, got '{value}'"
        ))),
    }
}

/// Parse CSV text into rows padded to a common width. No header row is assumed.
pub fn read_csv(text: &str, options: &CsvOptions) -> ConnectorResult<ValueGrid> {
    let dialect = options.dialect()?;
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(dialect.delimiter)
        .quote(dialect.quote)
        .comment(dialect.comment)
        .has_headers(false)
        .flexible(true);
    if let Some(escape) = dialect.escape {
        builder.escape(Some(escape)).double_quote(false);
    }
    let mut reader = builder.from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| ConnectorError::misconfiguration(format!("invalid CSV content: {e}")))?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        if dialect.ignore_blank_lines && is_blank_row(&row) {
            continue;
        }
        rows.push(row);
    }
    pad_rows(&mut rows);
    Ok(rows)
}

/// Write rows as CSV, padded to a common width, without a trailing terminator.
pub fn write_csv(mut rows: ValueGrid, options: &CsvOptions) -> ConnectorResult<String> {
    let dialect = options.dialect()?;
    pad_rows(&mut rows);

    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(dialect.delimiter)
        .quote(dialect.quote)
        .terminator(dialect.terminator)
        .flexible(true);
    if let Some(escape) = dialect.escape {
        builder.escape(escape).double_quote(false);
    }
    let mut writer = builder.from_writer(Vec::new());
    for row in &rows {
        writer
            .write_record(row)
            .map_err(|e| ConnectorError::application(format!("failed to write CSV: {e}")))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ConnectorError::application(format!("failed to flush CSV: {e}")))?;
    let mut text = String::from_utf8(bytes)
        .map_err(|e| ConnectorError::application(format!("CSV output is not UTF-8: {e}")))?;

    let terminator = match dialect.terminator {
        csv::Terminator::CRLF => "\r\n".to_string(),
        csv::Terminator::Any(byte) => (byte as char).to_string(),
        _ => String::new(),
    };
    if !terminator.is_empty() && text.ends_with(&terminator) {
        text.truncate(text.len() - terminator.len());
    }
    Ok(text)
}

//! A1 notation: column letters, cell addresses and sheet-qualified ranges.

use crate::error::{ConnectorError, ConnectorResult};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static COLUMN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+$").expect("valid regex"));
static CELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+)(\d+)$").expect("valid regex"));

/// Decode bijective base-26 column letters, `A` = 1.
pub fn column_letters_to_index(letters: &str) -> ConnectorResult<u32> {
    let letters = letters.trim();
    if !COLUMN_RE.is_match(letters) {
        return Err(ConnectorError::InvalidAddress(format!(
            "column '{letters}' must contain only letters, e.g. A or AB"
        )));
    }

    letters.bytes().try_fold(0u32, |acc, byte| {
        let digit = u32::from(byte.to_ascii_uppercase() - b'A' + 1);
        acc.checked_mul(26)
            .and_then(|value| value.checked_add(digit))
            .ok_or_else(|| ConnectorError::InvalidAddress(format!("column '{letters}' is too large")))
    })
}

pub fn index_to_column_letters(index: u32) -> ConnectorResult<String> {
    if index < 1 {
        return Err(ConnectorError::InvalidAddress(
            "column index must be 1 or greater".to_string(),
        ));
    }
    let mut remaining = index;
    let mut out = Vec::new();
    while remaining > 0 {
        let rem = ((remaining - 1) % 26) as u8;
        out.push(b'A' + rem);
        remaining = (remaining - 1) / 26;
    }
    out.reverse();
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Parse row text as a decimal integer. Sign and range are left to callers.
pub fn parse_row(text: &str) -> ConnectorResult<i64> {
    text.trim().parse::<i64>().map_err(|_| {
        ConnectorError::InvalidRow(format!(
            "the row value should be a number, e.g. 1 (got '{}')",
            text.trim()
        ))
    })
}

/// Parse row text and reject anything below 1.
pub fn parse_positive_row(text: &str) -> ConnectorResult<u32> {
    let row = parse_row(text)?;
    if row < 1 {
        return Err(ConnectorError::InvalidRow(format!(
            "row must be 1 or greater (got {row})"
        )));
    }
    u32::try_from(row).map_err(|_| ConnectorError::InvalidRow(format!("row {row} is too large")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct CellAddress {
    pub column: u32,
    pub row: u32,
}

impl CellAddress {
    pub fn new(column: u32, row: u32) -> ConnectorResult<Self> {
        if column < 1 {
            return Err(ConnectorError::InvalidAddress(
                "column index must be 1 or greater".to_string(),
            ));
        }
        if row < 1 {
            return Err(ConnectorError::InvalidRow(
                "row must be 1 or greater".to_string(),
            ));
        }
        Ok(Self { column, row })
    }

    /// Build from column letters and row text as entered by a user.
    pub fn from_parts(column: &str, row: &str) -> ConnectorResult<Self> {
        let column = column_letters_to_index(column)?;
        let row = parse_positive_row(row)?;
        Self::new(column, row)
    }

    pub fn parse(text: &str) -> ConnectorResult<Self> {
        let text = text.trim();
        let captures = CELL_RE.captures(text).ok_or_else(|| {
            ConnectorError::InvalidAddress(format!(
                "'{text}' is not a cell address, expected letters followed by a row number, e.g. B7"
            ))
        })?;
        let column = column_letters_to_index(&captures[1])?;
        let row = parse_positive_row(&captures[2])?;
        Self::new(column, row)
    }

    pub fn column_letters(&self) -> String {
        index_to_column_letters(self.column).unwrap_or_default()
    }

    /// Cell shifted by a zero-based offset, used to locate the end of a write.
    pub fn offset(&self, columns: u32, rows: u32) -> Self {
        Self {
            column: self.column.saturating_add(columns),
            row: self.row.saturating_add(rows),
        }
    }
}

impl FromStr for CellAddress {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column_letters(), self.row)
    }
}

/// A rectangular block of cells within a named sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeAddress {
    pub sheet: String,
    pub start: CellAddress,
    pub end: CellAddress,
}

impl RangeAddress {
    pub fn new(sheet: impl Into<String>, start: CellAddress, end: CellAddress) -> ConnectorResult<Self> {
        let sheet = sheet.into();
        ensure_sheet_name(&sheet)?;
        Ok(Self { sheet, start, end })
    }

    /// Topmost row, whichever corner it was given in.
    pub fn first_row(&self) -> u32 {
        self.start.row.min(self.end.row)
    }

    pub fn to_a1(&self) -> String {
        SheetRange::cells(&self.sheet, self.start, self.end).to_string()
    }
}

impl fmt::Display for RangeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// The part of a sheet a range string refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    Sheet,
    Cells(CellAddress, CellAddress),
    Rows(u32, u32),
    Columns(u32, u32),
}

/// Sheet-qualified A1 range as sent to the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRange {
    pub sheet: String,
    pub span: Span,
}

impl SheetRange {
    pub fn whole_sheet(sheet: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            span: Span::Sheet,
        }
    }

    pub fn cells(sheet: &str, start: CellAddress, end: CellAddress) -> Self {
        Self {
            sheet: sheet.to_string(),
            span: Span::Cells(start, end),
        }
    }

    pub fn cell(sheet: &str, cell: CellAddress) -> Self {
        Self::cells(sheet, cell, cell)
    }

    pub fn rows(sheet: &str, first: u32, last: u32) -> Self {
        Self {
            sheet: sheet.to_string(),
            span: Span::Rows(first, last),
        }
    }

    pub fn columns(sheet: &str, first: u32, last: u32) -> Self {
        Self {
            sheet: sheet.to_string(),
            span: Span::Columns(first, last),
        }
    }

    /// Parse `Sheet!A1:B2`, `'My sheet'!A:C`, `Sheet!3:3` or a bare sheet name.
    pub fn parse(text: &str) -> ConnectorResult<Self> {
        let text = text.trim();
        let (sheet, rest) = split_sheet(text)?;
        ensure_sheet_name(&sheet)?;
        let Some(rest) = rest else {
            return Ok(Self {
                sheet,
                span: Span::Sheet,
            });
        };

        let (left, right) = rest.split_once(':').unwrap_or((rest, rest));
        let span = if let (Ok(start), Ok(end)) = (CellAddress::parse(left), CellAddress::parse(right)) {
            Span::Cells(start, end)
        } else if let (Ok(first), Ok(last)) = (parse_positive_row(left), parse_positive_row(right)) {
            Span::Rows(first, last)
        } else if let (Ok(first), Ok(last)) =
            (column_letters_to_index(left), column_letters_to_index(right))
        {
            Span::Columns(first, last)
        } else {
            return Err(ConnectorError::InvalidAddress(format!(
                "'{rest}' is not a valid A1 range"
            )));
        };
        Ok(Self { sheet, span })
    }

    /// Top-left cell of the span, when it has one.
    pub fn start_cell(&self) -> Option<CellAddress> {
        match self.span {
            Span::Cells(start, _) => Some(start),
            Span::Rows(first, _) => Some(CellAddress { column: 1, row: first }),
            Span::Columns(first, _) => Some(CellAddress { column: first, row: 1 }),
            Span::Sheet => Some(CellAddress { column: 1, row: 1 }),
        }
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sheet = quote_sheet_name(&self.sheet);
        match self.span {
            Span::Sheet => f.write_str(&sheet),
            Span::Cells(start, end) if start == end => write!(f, "{sheet}!{start}"),
            Span::Cells(start, end) => write!(f, "{sheet}!{start}:{end}"),
            Span::Rows(first, last) => write!(f, "{sheet}!{first}:{last}"),
            Span::Columns(first, last) => write!(
                f,
                "{sheet}!{}:{}",
                index_to_column_letters(first).unwrap_or_default(),
                index_to_column_letters(last).unwrap_or_default()
            ),
        }
    }
}

pub fn ensure_sheet_name(sheet: &str) -> ConnectorResult<()> {
    if sheet.trim().is_empty() {
        return Err(ConnectorError::misconfiguration("sheet name must not be empty"));
    }
    Ok(())
}

/// Quote a sheet name for use in a range string when it needs it.
pub fn quote_sheet_name(sheet: &str) -> String {
    if !sheet.is_empty() && sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

fn split_sheet(text: &str) -> ConnectorResult<(String, Option<&str>)> {
    if let Some(quoted) = text.strip_prefix('\'') {
        let mut name = String::new();
        let mut chars = quoted.char_indices().peekable();
        while let Some((idx, ch)) = chars.next() {
            if ch != '\'' {
                name.push(ch);
                continue;
            }
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                name.push('\'');
                continue;
            }
            let rest = &quoted[idx + 1..];
            return match rest.strip_prefix('!') {
                Some(span) => Ok((name, Some(span))),
                None if rest.is_empty() => Ok((name, None)),
                None => Err(ConnectorError::InvalidAddress(format!(
                    "unexpected text after sheet name in '{text}'"
                ))),
            };
        }
        return Err(ConnectorError::InvalidAddress(format!(
            "unterminated sheet name in '{text}'"
        )));
    }

    Ok(match text.rsplit_once('!') {
        Some((sheet, span)) => (sheet.to_string(), Some(span)),
        None => (text.to_string(), None),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn decodes_and_encodes_columns() {
        assert_eq!(column_letters_to_index("A").unwrap(), 1);
        assert_eq!(column_letters_to_index("z").unwrap(), 26);
        assert_eq!(column_letters_to_index("AA").unwrap(), 27);
        assert_eq!(column_letters_to_index("AZ").unwrap(), 52);
        assert_eq!(column_letters_to_index("BA").unwrap(), 53);
        assert_eq!(column_letters_to_index("ZZZ").unwrap(), 18278);
        assert_eq!(index_to_column_letters(28).unwrap(), "AB");
        assert_eq!(index_to_column_letters(702).unwrap(), "ZZ");
        assert_eq!(index_to_column_letters(703).unwrap(), "AAA");
    }

    #[test]
    fn rejects_bad_columns() {
        assert_matches!(column_letters_to_index(""), Err(ConnectorError::InvalidAddress(_)));
        assert_matches!(column_letters_to_index("A1"), Err(ConnectorError::InvalidAddress(_)));
        assert_matches!(column_letters_to_index("Ä"), Err(ConnectorError::InvalidAddress(_)));
        assert_matches!(
            column_letters_to_index("ZZZZZZZZZZ"),
            Err(ConnectorError::InvalidAddress(_))
        );
        assert_matches!(index_to_column_letters(0), Err(ConnectorError::InvalidAddress(_)));
    }

    #[test]
    fn parses_cell_addresses() {
        assert_eq!(CellAddress::parse("AA1").unwrap(), CellAddress { column: 27, row: 1 });
        assert_eq!(CellAddress::parse("z99").unwrap(), CellAddress { column: 26, row: 99 });
        assert_eq!(CellAddress::parse("B7").unwrap().to_string(), "B7");
        assert_matches!(CellAddress::parse("7B"), Err(ConnectorError::InvalidAddress(_)));
        assert_matches!(CellAddress::parse("A1B"), Err(ConnectorError::InvalidAddress(_)));
        assert_matches!(CellAddress::parse("A0"), Err(ConnectorError::InvalidRow(_)));
    }

    #[test]
    fn row_parsing_only_checks_format() {
        assert_eq!(parse_row("0").unwrap(), 0);
        assert_eq!(parse_row(" -3 ").unwrap(), -3);
        assert_matches!(parse_row("three"), Err(ConnectorError::InvalidRow(_)));
        assert_matches!(parse_positive_row("0"), Err(ConnectorError::InvalidRow(_)));
        assert_matches!(parse_positive_row("-1"), Err(ConnectorError::InvalidRow(_)));
        assert_eq!(parse_positive_row("12").unwrap(), 12);
    }

    #[test]
    fn formats_sheet_ranges() {
        let start = CellAddress::new(1, 2).unwrap();
        let end = CellAddress::new(3, 4).unwrap();
        assert_eq!(SheetRange::cells("Data", start, end).to_string(), "Data!A2:C4");
        assert_eq!(SheetRange::cell("Data", start).to_string(), "Data!A2");
        assert_eq!(SheetRange::rows("My sheet", 3, 3).to_string(), "'My sheet'!3:3");
        assert_eq!(SheetRange::columns("Data", 2, 2).to_string(), "Data!B:B");
        assert_eq!(SheetRange::whole_sheet("Bob's").to_string(), "'Bob''s'");
    }

    #[test]
    fn parses_sheet_ranges() {
        let range = SheetRange::parse("'Bob''s data'!B2:D5").unwrap();
        assert_eq!(range.sheet, "Bob's data");
        assert_eq!(
            range.span,
            Span::Cells(CellAddress { column: 2, row: 2 }, CellAddress { column: 4, row: 5 })
        );
        assert_eq!(SheetRange::parse("Data!3:5").unwrap().span, Span::Rows(3, 5));
        assert_eq!(SheetRange::parse("Data!A:C").unwrap().span, Span::Columns(1, 3));
        assert_eq!(SheetRange::parse("Data").unwrap().span, Span::Sheet);
        assert_matches!(SheetRange::parse("!A1"), Err(ConnectorError::Misconfiguration(_)));
        assert_matches!(SheetRange::parse("Data!A1:?"), Err(ConnectorError::InvalidAddress(_)));
    }

    #[test]
    fn range_address_requires_sheet() {
        let cell = CellAddress::new(1, 1).unwrap();
        assert_matches!(
            RangeAddress::new("  ", cell, cell),
            Err(ConnectorError::Misconfiguration(_))
        );
        let range = RangeAddress::new("Data", cell.offset(2, 4), cell).unwrap();
        assert_eq!(range.first_row(), 1);
        assert_eq!(range.to_a1(), "Data!C5:A1");
    }
}

//! Mapping between a header-plus-rows sheet grid and glossary entries.
//!
//! Sheet layout: `ID | Definition | Subject field | Notes` followed by
//! `Term (<code>) | Variations (<code>) | Notes (<code>)` for every language.

use super::model::{GlossaryEntry, LanguageSection, TermSection};
use crate::error::{ConnectorError, ConnectorResult};
use crate::grid::ValueGrid;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

pub const ID_COLUMN: &str = "ID";
pub const DEFINITION_COLUMN: &str = "Definition";
pub const SUBJECT_FIELD_COLUMN: &str = "Subject field";
pub const NOTES_COLUMN: &str = "Notes";

/// Separates the `term: notes` groups of one language notes cell.
pub const TERM_NOTES_SEPARATOR: &str = "; ";
/// Separates list items inside a cell.
pub const LIST_SEPARATOR: char = ';';
const TERM_NOTE_DELIMITER: &str = ": ";

static LANGUAGE_COLUMN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Term|Variations|Notes) \((.*?)\)$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageField {
    Term,
    Variations,
    Notes,
}

impl LanguageField {
    fn label(&self) -> &'static str {
        match self {
            LanguageField::Term => "Term",
            LanguageField::Variations => "Variations",
            LanguageField::Notes => "Notes",
        }
    }

    pub fn column_name(&self, language_code: &str) -> String {
        format!("{} ({language_code})", self.label())
    }
}

/// What a header cell means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    Id,
    Definition,
    SubjectField,
    Notes,
    Language(LanguageField, String),
    Ignored,
}

impl ColumnKind {
    /// Header names are matched exactly, without trimming or case folding.
    pub fn classify(header: &str) -> Self {
        match header {
            ID_COLUMN => ColumnKind::Id,
            DEFINITION_COLUMN => ColumnKind::Definition,
            SUBJECT_FIELD_COLUMN => ColumnKind::SubjectField,
            NOTES_COLUMN => ColumnKind::Notes,
            _ => match LANGUAGE_COLUMN_RE.captures(header) {
                Some(captures) => {
                    let field = match &captures[1] {
                        "Term" => LanguageField::Term,
                        "Variations" => LanguageField::Variations,
                        _ => LanguageField::Notes,
                    };
                    ColumnKind::Language(field, captures[2].to_string())
                }
                None => ColumnKind::Ignored,
            },
        }
    }
}

pub fn generate_entry_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Read glossary entries from a grid whose first row is the header.
pub fn export_glossary(grid: &ValueGrid) -> ConnectorResult<Vec<GlossaryEntry>> {
    let Some((header, rows)) = grid.split_first() else {
        return Err(ConnectorError::EmptyData(
            "the sheet rows are empty, a header row is required to export a glossary".to_string(),
        ));
    };
    let columns: Vec<ColumnKind> = header.iter().map(|cell| ColumnKind::classify(cell)).collect();

    Ok(rows.iter().map(|row| entry_from_row(&columns, row)).collect())
}

#[derive(Default)]
struct SectionBuilder {
    primary: Option<String>,
    variations: Vec<String>,
}

fn entry_from_row(columns: &[ColumnKind], row: &[String]) -> GlossaryEntry {
    let mut id = None;
    let mut definition = None;
    let mut subject_field = None;
    let mut notes = None;
    let mut builders: IndexMap<&str, SectionBuilder> = IndexMap::new();
    let mut language_notes: Vec<(&str, &str)> = Vec::new();

    for (idx, kind) in columns.iter().enumerate() {
        let cell = row.get(idx).map(String::as_str).unwrap_or("");
        match kind {
            ColumnKind::Id => id = non_blank(cell),
            ColumnKind::Definition => definition = non_blank(cell),
            ColumnKind::SubjectField => subject_field = non_blank(cell),
            ColumnKind::Notes => notes = split_list(cell),
            ColumnKind::Language(LanguageField::Term, code) => {
                if let Some(term) = non_blank(cell) {
                    builders.entry(code.as_str()).or_default().primary = Some(term);
                }
            }
            ColumnKind::Language(LanguageField::Variations, code) => {
                if let Some(variations) = split_list(cell) {
                    builders
                        .entry(code.as_str())
                        .or_default()
                        .variations
                        .extend(variations);
                }
            }
            ColumnKind::Language(LanguageField::Notes, code) => {
                if !cell.trim().is_empty() {
                    language_notes.push((code.as_str(), cell));
                }
            }
            ColumnKind::Ignored => {}
        }
    }

    let mut language_sections: Vec<LanguageSection> = builders
        .into_iter()
        .map(|(code, builder)| {
            let terms = builder
                .primary
                .into_iter()
                .chain(builder.variations)
                .map(TermSection::new)
                .collect();
            LanguageSection::new(code, terms)
        })
        .collect();

    for (code, cell) in language_notes {
        let Some(section) = language_sections
            .iter_mut()
            .find(|section| section.language_code == code)
        else {
            continue;
        };
        apply_term_notes(section, cell);
    }

    GlossaryEntry {
        id: id.unwrap_or_else(generate_entry_id),
        definition,
        subject_field,
        notes,
        language_sections,
    }
}

/// Attach `term: note;note` groups to matching terms, skipping groups that
/// do not parse or name an unknown term.
fn apply_term_notes(section: &mut LanguageSection, cell: &str) {
    for group in cell.split(TERM_NOTES_SEPARATOR) {
        let Some((term, notes)) = group.split_once(TERM_NOTE_DELIMITER) else {
            continue;
        };
        let term = term.trim();
        if let Some(target) = section.terms.iter_mut().find(|t| t.term == term) {
            target.notes = split_list(notes);
        }
    }
}

fn non_blank(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Split a `;` list, trimming every piece and keeping blank ones in place.
/// A cell whose pieces are all blank holds no list.
fn split_list(cell: &str) -> Option<Vec<String>> {
    let items: Vec<String> = cell
        .split(LIST_SEPARATOR)
        .map(|item| item.trim().to_string())
        .collect();
    (!items.iter().all(String::is_empty)).then_some(items)
}

/// Language codes in the order they first appear.
pub fn languages_present(entries: &[GlossaryEntry]) -> Vec<String> {
    let mut seen: IndexMap<&str, ()> = IndexMap::new();
    for section in entries.iter().flat_map(|e| &e.language_sections) {
        seen.entry(section.language_code.as_str()).or_insert(());
    }
    seen.into_keys().map(str::to_string).collect()
}

pub fn header_row(languages: &[String]) -> Vec<String> {
    let mut header: Vec<String> = [ID_COLUMN, DEFINITION_COLUMN, SUBJECT_FIELD_COLUMN, NOTES_COLUMN]
        .iter()
        .map(|c| c.to_string())
        .collect();
    for code in languages {
        for field in [LanguageField::Term, LanguageField::Variations, LanguageField::Notes] {
            header.push(field.column_name(code));
        }
    }
    header
}

/// Format a section's notes cell: `term: n1;n2` groups for terms that have notes.
pub fn format_term_notes(section: &LanguageSection) -> String {
    section
        .terms
        .iter()
        .filter_map(|term| {
            term.notes.as_ref().map(|notes| {
                format!(
                    "{}{TERM_NOTE_DELIMITER}{}",
                    term.term,
                    notes.join(&LIST_SEPARATOR.to_string())
                )
            })
        })
        .collect::<Vec<_>>()
        .join(TERM_NOTES_SEPARATOR)
}

/// Lay entries out as a grid, header first.
pub fn import_glossary(entries: &[GlossaryEntry]) -> ConnectorResult<ValueGrid> {
    if entries.is_empty() {
        return Err(ConnectorError::EmptyData(
            "the glossary has no entries to import".to_string(),
        ));
    }
    let languages = languages_present(entries);
    let separator = LIST_SEPARATOR.to_string();

    let mut grid = Vec::with_capacity(entries.len() + 1);
    grid.push(header_row(&languages));

    for entry in entries {
        let id = if entry.id.trim().is_empty() {
            generate_entry_id()
        } else {
            entry.id.clone()
        };
        let mut row = vec![
            id,
            entry.definition.clone().unwrap_or_default(),
            entry.subject_field.clone().unwrap_or_default(),
            entry.notes.as_ref().map(|n| n.join(&separator)).unwrap_or_default(),
        ];
        for code in &languages {
            match entry.section(code) {
                Some(section) => {
                    row.push(section.primary().map(|t| t.term.clone()).unwrap_or_default());
                    row.push(
                        section
                            .variations()
                            .iter()
                            .map(|t| t.term.as_str())
                            .collect::<Vec<_>>()
                            .join(&separator),
                    );
                    row.push(format_term_notes(section));
                }
                None => row.extend([String::new(), String::new(), String::new()]),
            }
        }
        grid.push(row);
    }
    Ok(grid)
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TermSection {
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<String>>,
}

impl TermSection {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            notes: None,
        }
    }

    pub fn with_notes(term: impl Into<String>, notes: Vec<String>) -> Self {
        Self {
            term: term.into(),
            notes: Some(notes),
        }
    }
}

/// Terms for one language; the first is the primary term, the rest are variations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LanguageSection {
    pub language_code: String,
    pub terms: Vec<TermSection>,
}

impl LanguageSection {
    pub fn new(language_code: impl Into<String>, terms: Vec<TermSection>) -> Self {
        Self {
            language_code: language_code.into(),
            terms,
        }
    }

    pub fn primary(&self) -> Option<&TermSection> {
        self.terms.first()
    }

    pub fn variations(&self) -> &[TermSection] {
        self.terms.get(1..).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GlossaryEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<String>>,
    #[serde(default)]
    pub language_sections: Vec<LanguageSection>,
}

impl GlossaryEntry {
    pub fn new(id: impl Into<String>, language_sections: Vec<LanguageSection>) -> Self {
        Self {
            id: id.into(),
            definition: None,
            subject_field: None,
            notes: None,
            language_sections,
        }
    }

    pub fn section(&self, language_code: &str) -> Option<&LanguageSection> {
        self.language_sections
            .iter()
            .find(|section| section.language_code == language_code)
    }
}

/// A terminology collection as exchanged in TBX files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Glossary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_description: Option<String>,
    pub entries: Vec<GlossaryEntry>,
}

impl Glossary {
    pub fn new(entries: Vec<GlossaryEntry>) -> Self {
        Self {
            title: None,
            source_description: None,
            entries,
        }
    }
}

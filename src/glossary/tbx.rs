//! TBX (ISO 30042) reading and writing, TBX-Basic flavour.
//!
//! Reading also accepts the older `termEntry`/`langSet`/`tig`/`ntig` element
//! names so files produced by TBX v2 tools import cleanly.

use super::model::{Glossary, GlossaryEntry, LanguageSection, TermSection};
use crate::error::{ConnectorError, ConnectorResult};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;

pub const TBX_NAMESPACE: &str = "urn:iso:std:iso:30042:ed-2";
const TBX_NAMESPACE_PREFIX: &str = "urn:iso:std:iso:30042";

/// Cheap structural check run before parsing uploaded content.
pub fn ensure_tbx(document: &str) -> ConnectorResult<()> {
    let head = document.trim_start_matches('\u{feff}').trim_start();
    if !head.starts_with('<') {
        return Err(ConnectorError::misconfiguration("Invalid file format: expected TBX."));
    }
    let lowered = head.to_ascii_lowercase();
    if !lowered.contains("<tbx") {
        return Err(ConnectorError::misconfiguration(
            "Invalid TBX: missing <tbx> root element.",
        ));
    }
    if !lowered.contains(TBX_NAMESPACE_PREFIX) {
        return Err(ConnectorError::misconfiguration(
            "Invalid TBX: required TBX namespace not found.",
        ));
    }
    Ok(())
}

fn xml_error(error: impl std::fmt::Display) -> ConnectorError {
    ConnectorError::misconfiguration(format!("Invalid TBX: {error}"))
}

fn write_error(error: impl std::fmt::Display) -> ConnectorError {
    ConnectorError::application(format!("failed to write TBX: {error}"))
}

// =============================================================================
// WRITING
// =============================================================================

pub fn write_tbx(glossary: &Glossary) -> ConnectorResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let default_lang = glossary
        .entries
        .iter()
        .flat_map(|e| &e.language_sections)
        .map(|s| s.language_code.as_str())
        .next()
        .unwrap_or("en");

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_error)?;
    start(
        &mut writer,
        BytesStart::new("tbx").with_attributes([
            ("type", "TBX-Basic"),
            ("style", "dca"),
            ("xml:lang", default_lang),
            ("xmlns", TBX_NAMESPACE),
        ]),
    )?;

    start(&mut writer, BytesStart::new("tbxHeader"))?;
    start(&mut writer, BytesStart::new("fileDesc"))?;
    if let Some(title) = &glossary.title {
        start(&mut writer, BytesStart::new("titleStmt"))?;
        text_element(&mut writer, BytesStart::new("title"), title)?;
        end(&mut writer, "titleStmt")?;
    }
    if let Some(source) = &glossary.source_description {
        start(&mut writer, BytesStart::new("sourceDesc"))?;
        text_element(&mut writer, BytesStart::new("p"), source)?;
        end(&mut writer, "sourceDesc")?;
    }
    end(&mut writer, "fileDesc")?;
    end(&mut writer, "tbxHeader")?;

    start(&mut writer, BytesStart::new("text"))?;
    start(&mut writer, BytesStart::new("body"))?;
    for entry in &glossary.entries {
        write_entry(&mut writer, entry)?;
    }
    end(&mut writer, "body")?;
    end(&mut writer, "text")?;
    end(&mut writer, "tbx")?;

    String::from_utf8(writer.into_inner()).map_err(write_error)
}

fn write_entry(writer: &mut Writer<Vec<u8>>, entry: &GlossaryEntry) -> ConnectorResult<()> {
    start(
        writer,
        BytesStart::new("conceptEntry").with_attributes([("id", entry.id.as_str())]),
    )?;
    if let Some(subject) = &entry.subject_field {
        text_element(
            writer,
            BytesStart::new("descrip").with_attributes([("type", "subjectField")]),
            subject,
        )?;
    }
    if let Some(definition) = &entry.definition {
        text_element(
            writer,
            BytesStart::new("descrip").with_attributes([("type", "definition")]),
            definition,
        )?;
    }
    for note in entry.notes.iter().flatten() {
        text_element(writer, BytesStart::new("note"), note)?;
    }
    for section in &entry.language_sections {
        start(
            writer,
            BytesStart::new("langSec").with_attributes([("xml:lang", section.language_code.as_str())]),
        )?;
        for term in &section.terms {
            start(writer, BytesStart::new("termSec"))?;
            text_element(writer, BytesStart::new("term"), &term.term)?;
            for note in term.notes.iter().flatten() {
                text_element(writer, BytesStart::new("note"), note)?;
            }
            end(writer, "termSec")?;
        }
        end(writer, "langSec")?;
    }
    end(writer, "conceptEntry")
}

fn start(writer: &mut Writer<Vec<u8>>, element: BytesStart<'_>) -> ConnectorResult<()> {
    writer.write_event(Event::Start(element)).map_err(write_error)
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> ConnectorResult<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(write_error)
}

fn text_element(writer: &mut Writer<Vec<u8>>, element: BytesStart<'_>, text: &str) -> ConnectorResult<()> {
    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    start(writer, element)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(write_error)?;
    end(writer, &name)
}

// =============================================================================
// READING
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    Title,
    SourceDescription,
    Definition,
    SubjectField,
    EntryNote,
    Term,
    TermNote,
    Skip,
}

struct Capture {
    target: TextTarget,
    depth: usize,
    text: String,
}

#[derive(Default)]
struct TbxBuilder {
    glossary_title: Option<String>,
    source_description: Option<String>,
    entries: Vec<GlossaryEntry>,
    entry: Option<GlossaryEntry>,
    section: Option<LanguageSection>,
    term: Option<TermSection>,
    in_source_desc: bool,
}

impl TbxBuilder {
    fn start_element(&mut self, name: &[u8], element: &BytesStart<'_>) -> ConnectorResult<Option<TextTarget>> {
        let target = match name {
            b"title" if self.entry.is_none() => Some(TextTarget::Title),
            b"sourceDesc" => {
                self.in_source_desc = true;
                None
            }
            b"p" if self.in_source_desc => Some(TextTarget::SourceDescription),
            b"conceptEntry" | b"termEntry" => {
                let id = attribute(element, b"id")?.unwrap_or_default();
                self.entry = Some(GlossaryEntry::new(id, Vec::new()));
                None
            }
            b"langSec" | b"langSet" => {
                let code = attribute(element, b"lang")?.unwrap_or_default();
                self.section = Some(LanguageSection::new(code, Vec::new()));
                None
            }
            b"termSec" | b"tig" | b"ntig" => {
                self.term = Some(TermSection::new(String::new()));
                None
            }
            b"term" if self.term.is_some() => Some(TextTarget::Term),
            b"descrip" if self.entry.is_some() => {
                match attribute(element, b"type")?.as_deref() {
                    Some("definition") => Some(TextTarget::Definition),
                    Some("subjectField") => Some(TextTarget::SubjectField),
                    _ => Some(TextTarget::Skip),
                }
            }
            b"note" if self.term.is_some() => Some(TextTarget::TermNote),
            b"note" if self.entry.is_some() && self.section.is_none() => Some(TextTarget::EntryNote),
            _ => None,
        };
        Ok(target)
    }

    fn end_element(&mut self, name: &[u8]) {
        match name {
            b"sourceDesc" => self.in_source_desc = false,
            b"termSec" | b"tig" | b"ntig" => self.finish_term(),
            b"langSec" | b"langSet" => {
                self.finish_term();
                if let (Some(section), Some(entry)) = (self.section.take(), self.entry.as_mut()) {
                    entry.language_sections.push(section);
                }
            }
            b"conceptEntry" | b"termEntry" => {
                if let Some(section) = self.section.take()
                    && let Some(entry) = self.entry.as_mut()
                {
                    entry.language_sections.push(section);
                }
                if let Some(entry) = self.entry.take() {
                    self.entries.push(entry);
                }
            }
            _ => {}
        }
    }

    fn finish_term(&mut self) {
        if let Some(term) = self.term.take()
            && let Some(section) = self.section.as_mut()
            && !term.term.is_empty()
        {
            section.terms.push(term);
        }
    }

    fn apply_text(&mut self, target: TextTarget, text: String) {
        let text = text.trim().to_string();
        match target {
            TextTarget::Title => self.glossary_title = Some(text),
            TextTarget::SourceDescription => self.source_description = Some(text),
            TextTarget::Definition => {
                if let Some(entry) = self.entry.as_mut()
                    && entry.definition.is_none()
                {
                    entry.definition = Some(text);
                }
            }
            TextTarget::SubjectField => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.subject_field = Some(text);
                }
            }
            TextTarget::EntryNote => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.notes.get_or_insert_with(Vec::new).push(text);
                }
            }
            TextTarget::Term => {
                if let Some(term) = self.term.as_mut() {
                    term.term = text;
                }
            }
            TextTarget::TermNote => {
                if let Some(term) = self.term.as_mut() {
                    term.notes.get_or_insert_with(Vec::new).push(text);
                }
            }
            TextTarget::Skip => {}
        }
    }

    fn finish(self) -> Glossary {
        Glossary {
            title: self.glossary_title,
            source_description: self.source_description,
            entries: self.entries,
        }
    }
}

fn attribute(element: &BytesStart<'_>, local_name: &[u8]) -> ConnectorResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.local_name().as_ref() == local_name {
            let value = attr.unescape_value().map_err(xml_error)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Parse a TBX document after [`ensure_tbx`] accepts it.
pub fn read_tbx(document: &str) -> ConnectorResult<Glossary> {
    ensure_tbx(document)?;
    let mut reader = Reader::from_str(document.trim_start_matches('\u{feff}'));
    reader.trim_text(true);

    let mut builder = TbxBuilder::default();
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(element) => {
                if let Some(active) = capture.as_mut() {
                    active.depth += 1;
                    continue;
                }
                let name = element.local_name().as_ref().to_vec();
                if let Some(target) = builder.start_element(&name, &element)? {
                    capture = Some(Capture {
                        target,
                        depth: 0,
                        text: String::new(),
                    });
                }
            }
            Event::Empty(element) => {
                if capture.is_some() {
                    continue;
                }
                let name = element.local_name().as_ref().to_vec();
                if builder.start_element(&name, &element)?.is_none() {
                    builder.end_element(&name);
                }
            }
            Event::Text(text) => {
                if let Some(active) = capture.as_mut() {
                    let value = text.unescape().map_err(xml_error)?;
                    if !active.text.is_empty() {
                        active.text.push(' ');
                    }
                    active.text.push_str(&value);
                }
            }
            Event::CData(data) => {
                if let Some(active) = capture.as_mut() {
                    active.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(element) => {
                if let Some(active) = capture.as_mut() {
                    if active.depth > 0 {
                        active.depth -= 1;
                        continue;
                    }
                    if let Some(done) = capture.take() {
                        builder.apply_text(done.target, done.text);
                    }
                    continue;
                }
                let name = element.local_name().as_ref().to_vec();
                builder.end_element(&name);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(builder.finish())
}

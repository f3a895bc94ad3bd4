/*!
 * XLIFF writer.
 *
 * Structure is written with a 2-space indenting event writer. Inline
 * content is serialized separately without indentation and spliced in as
 * pre-escaped text, so the indenter never touches paragraph content.
 */

use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use quick_xml::Writer;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;

use super::elements::{Element, MarkerStack, TagType};
use super::merge::{self, Side};
use super::model::{DocInfo, File, Paragraph, SegmentPair, TextContextMatchLevel, TransUnit, TranslationOrigin, Xliff};
use super::sniffer::{Dialect, SDL_NAMESPACE};
use super::validation;
use crate::errors::{Location, XliffError, XliffResult};
use crate::file_utils::FileManager;

pub const XLIFF_NAMESPACE: &str = "urn:oasis:names:tc:xliff:document:1.2";

pub const SEGMENT_MTYPE: &str = "seg";
pub const LOCKED_MTYPE: &str = "protected";
pub const COMMENT_MTYPE: &str = "x-sdl-comment";

const SUPPORT_VALUE: &str = "xliff12sdl";
const EXTENSION_VERSION: &str = "1.2.1";

/// UTC with millisecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// An origin attribute and the rule deciding whether it is written.
pub struct OriginAttribute {
    pub name: &'static str,
    pub value: fn(&TranslationOrigin) -> Option<String>,
}

/// Origin attributes in output order. Default values are never written.
pub const ORIGIN_ATTRIBUTES: [OriginAttribute; 5] = [
    OriginAttribute {
        name: "origin",
        value: origin_type,
    },
    OriginAttribute {
        name: "origin-system",
        value: origin_system,
    },
    OriginAttribute {
        name: "percent",
        value: match_percent,
    },
    OriginAttribute {
        name: "struct-match",
        value: structure_match,
    },
    OriginAttribute {
        name: "text-match",
        value: text_match,
    },
];

fn origin_type(origin: &TranslationOrigin) -> Option<String> {
    (!origin.origin_type.is_empty()).then(|| origin.origin_type.clone())
}

fn origin_system(origin: &TranslationOrigin) -> Option<String> {
    (!origin.origin_system.is_empty()).then(|| origin.origin_system.clone())
}

fn match_percent(origin: &TranslationOrigin) -> Option<String> {
    (origin.match_percent != 0).then(|| origin.match_percent.to_string())
}

fn structure_match(origin: &TranslationOrigin) -> Option<String> {
    origin.is_structure_context_match.then(|| "True".to_string())
}

fn text_match(origin: &TranslationOrigin) -> Option<String> {
    (origin.text_context_match_level != TextContextMatchLevel::None)
        .then(|| origin.text_context_match_level.as_str().to_string())
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

type XmlWriter = Writer<Vec<u8>>;

/// Writer for one output dialect.
///
/// Carries no state besides the dialect; concurrent calls on a shared
/// value are independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XliffWriter {
    dialect: Dialect,
}

impl XliffWriter {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn is_extended(&self) -> bool {
        self.dialect == Dialect::Extended
    }

    /// Serialize a document.
    ///
    /// With `include_translations` unset, target-language attributes are left
    /// out at every level; target content is written either way.
    pub fn write(&self, document: &Xliff, include_translations: bool) -> XliffResult<String> {
        validation::validate(document).into_result()?;

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut root = BytesStart::new("xliff");
        set_attribute(&mut root, "version", "1.2");
        set_attribute(&mut root, "xmlns", XLIFF_NAMESPACE);
        if self.is_extended() {
            set_attribute(&mut root, "xmlns:sdl", SDL_NAMESPACE);
            set_attribute(&mut root, "sdl:support", SUPPORT_VALUE);
            set_attribute(&mut root, "sdl:version", EXTENSION_VERSION);
        }
        writer.write_event(Event::Start(root))?;

        if self.is_extended() {
            self.write_doc_info(&mut writer, &document.doc_info, include_translations)?;
        }
        for file in &document.files {
            self.write_file_element(&mut writer, file, include_translations)?;
        }

        writer.write_event(Event::End(BytesEnd::new("xliff")))?;

        let output = String::from_utf8(writer.into_inner())?;
        debug!(
            "Wrote {} file(s) as {} dialect ({} bytes)",
            document.files.len(),
            self.dialect,
            output.len()
        );
        Ok(output)
    }

    /// Serialize and publish atomically; on failure no partial file is left.
    pub fn write_file<P: AsRef<Path>>(&self, document: &Xliff, path: P, include_translations: bool) -> XliffResult<()> {
        let output = self.write(document, include_translations)?;
        FileManager::write_atomic(path.as_ref(), &output)?;
        debug!("Saved {}", path.as_ref().display());
        Ok(())
    }

    fn write_doc_info(&self, writer: &mut XmlWriter, info: &DocInfo, include_translations: bool) -> XliffResult<()> {
        let mut start = BytesStart::new("sdl:doc-info");
        set_attribute(&mut start, "project-id", info.project_id.as_str());
        set_attribute(&mut start, "source", info.source.as_str());
        set_attribute(&mut start, "source-language", info.source_language.as_str());
        if include_translations {
            if let Some(target) = &info.target_language {
                set_attribute(&mut start, "target-language", target.as_str());
            }
        }
        if let Some(created) = &info.created {
            set_attribute(&mut start, "created", format_timestamp(created).as_str());
        }
        writer.write_event(Event::Start(start))?;

        if info.comments.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("sdl:cmt-defs")))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new("sdl:cmt-defs")))?;
            for (id, comments) in &info.comments {
                let mut definition = BytesStart::new("sdl:cmt-def");
                set_attribute(&mut definition, "id", id.as_str());
                writer.write_event(Event::Start(definition))?;

                if comments.is_empty() {
                    writer.write_event(Event::Empty(BytesStart::new("sdl:comments")))?;
                } else {
                    writer.write_event(Event::Start(BytesStart::new("sdl:comments")))?;
                    for comment in comments {
                        let mut start = BytesStart::new("sdl:comment");
                        set_attribute(&mut start, "user", comment.author.as_str());
                        if let Some(date) = &comment.date {
                            set_attribute(&mut start, "date", format_timestamp(date).as_str());
                        }
                        if !comment.version.is_empty() {
                            set_attribute(&mut start, "version", comment.version.as_str());
                        }
                        set_attribute(&mut start, "severity", comment.severity.as_str());
                        write_text_element(writer, start, &comment.text)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new("sdl:comments")))?;
                }

                writer.write_event(Event::End(BytesEnd::new("sdl:cmt-def")))?;
            }
            writer.write_event(Event::End(BytesEnd::new("sdl:cmt-defs")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("sdl:doc-info")))?;
        Ok(())
    }

    fn write_file_element(&self, writer: &mut XmlWriter, file: &File, include_translations: bool) -> XliffResult<()> {
        let mut start = BytesStart::new("file");
        set_attribute(&mut start, "original", file.original.as_str());
        set_attribute(&mut start, "source-language", file.source_language.as_str());
        if include_translations {
            if let Some(target) = &file.target_language {
                set_attribute(&mut start, "target-language", target.as_str());
            }
        }
        set_attribute(&mut start, "datatype", file.data_type.as_str());
        writer.write_event(Event::Start(start))?;

        match &file.header {
            None => writer.write_event(Event::Empty(BytesStart::new("header")))?,
            Some(header) => {
                writer.write_event(Event::Start(BytesStart::new("header")))?;
                writer.write_event(Event::Start(BytesStart::new("skl")))?;
                let mut external = BytesStart::new("external-file");
                set_attribute(&mut external, "uid", header.uid.as_str());
                set_attribute(&mut external, "href", header.href.as_str());
                writer.write_event(Event::Empty(external))?;
                writer.write_event(Event::End(BytesEnd::new("skl")))?;
                writer.write_event(Event::End(BytesEnd::new("header")))?;
            }
        }

        if file.body.trans_units.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("body")))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new("body")))?;
            for unit in &file.body.trans_units {
                self.write_trans_unit(writer, unit)?;
            }
            writer.write_event(Event::End(BytesEnd::new("body")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("file")))?;
        Ok(())
    }

    fn write_trans_unit(&self, writer: &mut XmlWriter, unit: &TransUnit) -> XliffResult<()> {
        let mut start = BytesStart::new("trans-unit");
        set_attribute(&mut start, "id", unit.id.as_str());
        writer.write_event(Event::Start(start))?;

        let location = Location::trans_unit(&unit.id);
        let merged = merge::merge_segments(&unit.segment_pairs, Side::Source);
        let markup = self.inline_markup(&merged, false, &location)?;
        write_markup(writer, BytesStart::new("source"), &markup)?;

        self.write_segments(writer, "seg-source", unit, Side::Source)?;
        self.write_segments(writer, "target", unit, Side::Target)?;

        if self.is_extended() {
            write_segment_definitions(writer, unit)?;
        }

        writer.write_event(Event::End(BytesEnd::new("trans-unit")))?;
        Ok(())
    }

    /// One `mrk mtype="seg"` per segment pair.
    fn write_segments(&self, writer: &mut XmlWriter, name: &str, unit: &TransUnit, side: Side) -> XliffResult<()> {
        if unit.segment_pairs.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new(name)))?;
            return Ok(());
        }

        writer.write_event(Event::Start(BytesStart::new(name)))?;
        for pair in &unit.segment_pairs {
            let location = Location::segment(&unit.id, &pair.id);
            let markup = self.inline_markup(side.paragraph(pair), pair.is_locked, &location)?;

            let mut marker = BytesStart::new("mrk");
            set_attribute(&mut marker, "mtype", SEGMENT_MTYPE);
            set_attribute(&mut marker, "mid", pair.id.as_str());
            write_markup(writer, marker, &markup)?;
        }
        writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Escaped inline markup of a paragraph, optionally inside a lock wrapper.
    fn inline_markup(&self, paragraph: &Paragraph, locked: bool, location: &Location) -> XliffResult<String> {
        let mut writer = Writer::new(Vec::new());
        let mut markers = MarkerStack::new();
        let mut dropped_comments = 0usize;

        if locked {
            writer.write_event(Event::Start(locked_marker()))?;
        }

        for element in &paragraph.elements {
            markers
                .apply(element)
                .map_err(|e| XliffError::invalid(location.clone(), e.to_string()))?;

            match element {
                Element::Text(text) => {
                    writer.write_event(Event::Text(BytesText::from_escaped(escape_value(text, false))))?;
                }
                Element::TagPair {
                    tag_type,
                    tag_id,
                    tag_content,
                } => {
                    let name = match tag_type {
                        TagType::Opening => "bpt",
                        TagType::Closing => "ept",
                    };
                    let mut start = BytesStart::new(name);
                    set_attribute(&mut start, "id", tag_id.as_str());
                    write_text_element(&mut writer, start, tag_content)?;
                }
                Element::Placeholder { tag_id, tag_content } => {
                    let mut start = BytesStart::new("ph");
                    set_attribute(&mut start, "id", tag_id.as_str());
                    write_text_element(&mut writer, start, tag_content)?;
                }
                Element::Locked { tag_type } => match tag_type {
                    TagType::Opening => writer.write_event(Event::Start(locked_marker()))?,
                    TagType::Closing => writer.write_event(Event::End(BytesEnd::new("mrk")))?,
                },
                Element::Comment {
                    tag_type,
                    definition_id,
                } => {
                    if !self.is_extended() {
                        dropped_comments += 1;
                        continue;
                    }
                    match tag_type {
                        TagType::Opening => {
                            let mut start = BytesStart::new("mrk");
                            set_attribute(&mut start, "mtype", COMMENT_MTYPE);
                            set_attribute(&mut start, "sdl:cid", definition_id.as_str());
                            writer.write_event(Event::Start(start))?;
                        }
                        TagType::Closing => writer.write_event(Event::End(BytesEnd::new("mrk")))?,
                    }
                }
            }
        }

        markers
            .finish()
            .map_err(|e| XliffError::invalid(location.clone(), e.to_string()))?;

        if locked {
            writer.write_event(Event::End(BytesEnd::new("mrk")))?;
        }
        if dropped_comments > 0 {
            warn!(
                "{}: {} comment marker(s) dropped, the {} dialect has no comment definitions",
                location, dropped_comments, self.dialect
            );
        }

        Ok(String::from_utf8(writer.into_inner())?)
    }
}

fn locked_marker() -> BytesStart<'static> {
    let mut start = BytesStart::new("mrk");
    set_attribute(&mut start, "mtype", LOCKED_MTYPE);
    start
}

/// Escape `value` for XML. Carriage returns are always written as character
/// references so parsers do not normalize them away; tabs and line feeds are
/// too inside attribute values, where parsers fold them to spaces.
fn escape_value(value: &str, attribute: bool) -> String {
    let escaped = quick_xml::escape::escape(value);
    let mut out = String::with_capacity(escaped.len());
    for ch in escaped.chars() {
        match ch {
            '\r' => out.push_str("&#13;"),
            '\t' if attribute => out.push_str("&#9;"),
            '\n' if attribute => out.push_str("&#10;"),
            other => out.push(other),
        }
    }
    out
}

fn set_attribute(start: &mut BytesStart<'_>, name: &str, value: &str) {
    start.push_attribute(Attribute {
        key: QName(name.as_bytes()),
        value: Cow::Owned(escape_value(value, true).into_bytes()),
    });
}

/// Write `start` with pre-escaped content, or as an empty element when there is none.
fn write_markup(writer: &mut XmlWriter, start: BytesStart<'_>, markup: &str) -> XliffResult<()> {
    if markup.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::from_escaped(markup)))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

fn write_text_element(writer: &mut XmlWriter, start: BytesStart<'_>, text: &str) -> XliffResult<()> {
    if text.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::from_escaped(escape_value(text, false))))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

fn write_segment_definitions(writer: &mut XmlWriter, unit: &TransUnit) -> XliffResult<()> {
    if unit.segment_pairs.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new("sdl:seg-defs")))?;
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new("sdl:seg-defs")))?;
    for pair in &unit.segment_pairs {
        write_segment_definition(writer, unit, pair)?;
    }
    writer.write_event(Event::End(BytesEnd::new("sdl:seg-defs")))?;
    Ok(())
}

fn write_segment_definition(writer: &mut XmlWriter, unit: &TransUnit, pair: &SegmentPair) -> XliffResult<()> {
    let mut start = BytesStart::new("sdl:seg");
    set_attribute(&mut start, "id", pair.id.as_str());
    set_attribute(&mut start, "conf", pair.confirmation_level.as_str());
    if pair.is_locked {
        set_attribute(&mut start, "locked", "True");
    }

    match &pair.translation_origin {
        Some(origin) if !origin.is_empty() => {
            write_origin_chain(writer, start, origin, &Location::segment(&unit.id, &pair.id))
        }
        _ => {
            writer.write_event(Event::Empty(start))?;
            Ok(())
        }
    }
}

/// Write an origin into `start` and its earlier records as nested `sdl:prev-origin`.
fn write_origin_chain(
    writer: &mut XmlWriter,
    start: BytesStart<'_>,
    origin: &TranslationOrigin,
    location: &Location,
) -> XliffResult<()> {
    let mut visited = HashSet::new();
    let mut open: Vec<BytesEnd<'static>> = Vec::new();
    let mut start = start;
    let mut current = origin;

    loop {
        if !visited.insert(std::ptr::from_ref(current)) {
            return Err(XliffError::invalid(location.clone(), "translation origin chain is cyclic"));
        }
        for attribute in &ORIGIN_ATTRIBUTES {
            if let Some(value) = (attribute.value)(current) {
                set_attribute(&mut start, attribute.name, value.as_str());
            }
        }

        if current.meta_data.is_empty() && current.origin_before_adaptation.is_none() {
            writer.write_event(Event::Empty(start))?;
            break;
        }

        open.push(start.to_end().into_owned());
        writer.write_event(Event::Start(start))?;
        for (key, value) in current.meta_data.iter() {
            let mut entry = BytesStart::new("sdl:value");
            set_attribute(&mut entry, "key", key);
            write_text_element(writer, entry, value)?;
        }

        match current.origin_before_adaptation.as_deref() {
            Some(previous) => {
                start = BytesStart::new("sdl:prev-origin");
                current = previous;
            }
            None => break,
        }
    }

    while let Some(end) = open.pop() {
        writer.write_event(Event::End(end))?;
    }
    Ok(())
}

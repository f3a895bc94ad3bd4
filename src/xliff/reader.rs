/*!
 * XLIFF reader.
 *
 * Builds the document model from a parsed tree. Tables that paragraphs
 * refer to (comment definitions, segment definitions) are read before the
 * paragraphs themselves. Nothing is recursive: groups are flattened with a
 * work list, paragraphs are walked with an explicit stack of open and
 * close steps, and origin chains are folded from the innermost record
 * outwards.
 */

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use roxmltree::{Document, Node};

use super::elements::{Element, MarkerStack, NestingError};
use super::model::{
    Comment, ConfirmationLevel, DocInfo, File, Header, Paragraph, SegmentPair, Severity, TransUnit,
    TranslationOrigin, Xliff,
};
use super::sniffer::{self, Dialect, SDL_NAMESPACE, SUPPORTED_VERSIONS};
use super::writer::{COMMENT_MTYPE, LOCKED_MTYPE, ORIGIN_ATTRIBUTES, SEGMENT_MTYPE};
use crate::errors::{Location, XliffError, XliffResult};

/// Non-fatal finding recorded while reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: Location,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Everything a successful read produces.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub xliff: Xliff,
    /// Dialect the input was read as
    pub dialect: Dialect,
    pub diagnostics: Vec<Diagnostic>,
}

/// Reader for both dialects.
///
/// Holds no state between calls, so one value can serve any number of
/// threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct XliffReader;

impl XliffReader {
    pub fn new() -> Self {
        Self
    }

    /// Read a document, sniffing the dialect. Diagnostics are logged as warnings.
    pub fn parse(&self, input: &str) -> XliffResult<Xliff> {
        let outcome = self.read(input, None)?;
        for diagnostic in &outcome.diagnostics {
            warn!("{}", diagnostic);
        }
        Ok(outcome.xliff)
    }

    /// Read a document.
    ///
    /// A `hint` skips dialect sniffing; the root element is checked either way.
    pub fn read(&self, input: &str, hint: Option<Dialect>) -> XliffResult<ReadOutcome> {
        let dialect = match hint {
            Some(dialect) => dialect,
            None => sniffer::sniff(input)?,
        };

        let document = Document::parse(input)?;
        let root = document.root_element();
        check_root(root)?;

        let mut context = ReadContext::new(dialect);
        let doc_info = match sdl_child(root, "doc-info") {
            Some(node) => context.read_doc_info(node)?,
            None => DocInfo::default(),
        };

        let mut files = Vec::new();
        for node in root.children().filter(|n| is_xliff_element(*n, "file")) {
            files.push(context.read_file(node, &doc_info)?);
        }
        debug!(
            "Read {} file(s) as {} dialect with {} diagnostic(s)",
            files.len(),
            dialect,
            context.diagnostics.len()
        );

        Ok(ReadOutcome {
            xliff: Xliff { doc_info, files },
            dialect,
            diagnostics: context.diagnostics,
        })
    }

    pub fn read_file(&self, path: &Path, hint: Option<Dialect>) -> XliffResult<ReadOutcome> {
        debug!("Reading {}", path.display());
        let input = fs::read_to_string(path)?;
        self.read(&input, hint)
    }
}

fn check_root(root: Node) -> XliffResult<()> {
    if root.tag_name().name() != "xliff" {
        return Err(XliffError::Format(format!(
            "unexpected root element '{}'",
            root.tag_name().name()
        )));
    }
    match root.attribute("version") {
        Some(version) if SUPPORTED_VERSIONS.contains(&version) => Ok(()),
        Some(version) => Err(XliffError::Format(format!("unsupported XLIFF version '{}'", version))),
        None => Err(XliffError::Format("missing XLIFF version".to_string())),
    }
}

/// Per-segment metadata from `sdl:seg-defs`.
struct SegmentDefinition {
    id: String,
    confirmation_level: ConfirmationLevel,
    is_locked: bool,
    origin: Option<TranslationOrigin>,
}

/// How one inline element maps onto the element stream.
enum Inline {
    /// Consumed whole, subtree included
    Leaf(Element),
    /// Children are walked between the two markers
    Span { open: Element, close: Element },
    /// Children are walked, no marker
    Transparent,
    /// Dropped with its subtree
    Skipped,
}

/// One pending step of a paragraph walk.
enum Step<'a, 'input> {
    Open(Node<'a, 'input>),
    Close(Element),
}

/// Working state of one `read` call.
struct ReadContext {
    dialect: Dialect,
    diagnostics: Vec<Diagnostic>,
}

impl ReadContext {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            diagnostics: Vec::new(),
        }
    }

    fn note(&mut self, location: &Location, message: impl Into<String>) {
        let message = message.into();
        debug!("{}: {}", location, message);
        self.diagnostics.push(Diagnostic {
            location: location.clone(),
            message,
        });
    }

    /// Parse an optional enumerated attribute, falling back to the default.
    fn parse_or_default<T>(&mut self, value: Option<&str>, what: &str, location: &Location) -> T
    where
        T: FromStr + Default,
        T::Err: fmt::Display,
    {
        let Some(value) = value else {
            return T::default();
        };
        match value.parse::<T>() {
            Ok(parsed) => parsed,
            Err(e) => {
                self.note(location, format!("{}: {}, using default", what, e));
                T::default()
            }
        }
    }

    fn read_doc_info(&mut self, node: Node) -> XliffResult<DocInfo> {
        let location = Location::document();
        let mut info = DocInfo {
            project_id: attribute(node, "project-id"),
            source: attribute(node, "source"),
            source_language: attribute(node, "source-language"),
            target_language: node.attribute("target-language").map(str::to_string),
            created: parse_date(node.attribute("created"), &location)?,
            comments: BTreeMap::new(),
        };

        let Some(definitions) = sdl_child(node, "cmt-defs") else {
            return Ok(info);
        };
        for definition in definitions.children().filter(|n| is_sdl_element(*n, "cmt-def")) {
            let id = definition
                .attribute("id")
                .ok_or_else(|| XliffError::parse(location.clone(), "comment definition without id"))?;
            let mut comments = Vec::new();
            for group in definition.children().filter(|n| has_name_ignoring_case(*n, "comments")) {
                for comment in group.children().filter(|n| has_name_ignoring_case(*n, "comment")) {
                    comments.push(self.read_comment(comment, &location)?);
                }
            }
            info.comments.entry(id.to_string()).or_default().extend(comments);
        }
        debug!("Read {} comment definition(s)", info.comments.len());

        Ok(info)
    }

    fn read_comment(&mut self, node: Node, location: &Location) -> XliffResult<Comment> {
        Ok(Comment {
            text: text_content(node),
            author: attribute(node, "user"),
            severity: self.parse_or_default::<Severity>(node.attribute("severity"), "comment severity", location),
            date: parse_date(node.attribute("date"), location)?,
            version: attribute(node, "version"),
        })
    }

    fn read_file(&mut self, node: Node, doc_info: &DocInfo) -> XliffResult<File> {
        let mut file = File::new(
            &attribute(node, "original"),
            &attribute(node, "source-language"),
            &attribute(node, "datatype"),
        );
        file.target_language = node.attribute("target-language").map(str::to_string);
        file.header = xliff_child(node, "header")
            .and_then(|header| xliff_child(header, "skl"))
            .and_then(|skeleton| xliff_child(skeleton, "external-file"))
            .map(|external| Header::new(&attribute(external, "uid"), &attribute(external, "href")));

        let Some(body) = xliff_child(node, "body") else {
            self.note(&Location::document(), format!("file '{}' has no body", file.original));
            return Ok(file);
        };

        let mut pending: Vec<Node> = body.children().filter(Node::is_element).rev().collect();
        while let Some(next) = pending.pop() {
            if is_xliff_element(next, "trans-unit") {
                let unit = self.read_trans_unit(next, doc_info)?;
                file.body.trans_units.push(unit);
            } else if is_xliff_element(next, "group") {
                pending.extend(next.children().filter(Node::is_element).rev());
            } else if next.tag_name().namespace() != Some(SDL_NAMESPACE) {
                self.note(
                    &Location::document(),
                    format!("'{}' element in body skipped", next.tag_name().name()),
                );
            }
        }
        debug!(
            "Read file '{}' with {} trans-unit(s)",
            file.original,
            file.body.trans_units.len()
        );

        Ok(file)
    }

    fn read_trans_unit(&mut self, node: Node, doc_info: &DocInfo) -> XliffResult<TransUnit> {
        let id = node
            .attribute("id")
            .ok_or_else(|| XliffError::parse(Location::document(), "trans-unit without id"))?;
        let location = Location::trans_unit(id);

        let definitions = match (self.dialect, sdl_child(node, "seg-defs")) {
            (Dialect::Extended, Some(seg_defs)) => self.read_segment_definitions(seg_defs, id)?,
            _ => Vec::new(),
        };

        let seg_source = xliff_child(node, "seg-source");
        let sources = match seg_source {
            Some(seg_source) => self.segment_nodes(seg_source, &location)?,
            None => {
                let segment_id = match definitions.as_slice() {
                    [only] => only.id.clone(),
                    _ => "1".to_string(),
                };
                xliff_child(node, "source")
                    .map(|source| vec![(segment_id, source)])
                    .unwrap_or_default()
            }
        };

        let targets: HashMap<String, Node> = match xliff_child(node, "target") {
            None => HashMap::new(),
            Some(target) if seg_source.is_none() || !target.children().any(is_segment_marker) => {
                match sources.as_slice() {
                    [(segment_id, _)] => HashMap::from([(segment_id.clone(), target)]),
                    _ => {
                        if has_content(target) {
                            self.note(&location, "unsegmented target with several source segments ignored");
                        }
                        HashMap::new()
                    }
                }
            }
            Some(target) => {
                let segments = self.segment_nodes(target, &location)?;
                let known: HashSet<&str> = sources.iter().map(|(segment_id, _)| segment_id.as_str()).collect();
                if let Some((orphan, _)) = segments.iter().find(|(mid, _)| !known.contains(mid.as_str())) {
                    return Err(XliffError::parse(
                        location,
                        format!("target segment '{}' has no source segment", orphan),
                    ));
                }
                segments.into_iter().collect()
            }
        };

        let mut definitions: HashMap<String, SegmentDefinition> = definitions
            .into_iter()
            .map(|definition| (definition.id.clone(), definition))
            .collect();

        let mut unit = TransUnit::new(id);
        for (segment_id, source_node) in &sources {
            let segment_location = Location::segment(id, segment_id);
            let definition = definitions.remove(segment_id);
            let locked = definition.as_ref().is_some_and(|definition| definition.is_locked);

            let source = self.read_segment(*source_node, locked, &segment_location, doc_info, "source")?;
            let target = match targets.get(segment_id) {
                Some(target_node) => self.read_segment(*target_node, locked, &segment_location, doc_info, "target")?,
                None => Paragraph::new(),
            };

            let mut pair = SegmentPair::new(segment_id, source, target);
            if let Some(definition) = definition {
                pair.confirmation_level = definition.confirmation_level;
                pair.is_locked = definition.is_locked;
                pair.translation_origin = definition.origin;
            }
            unit.segment_pairs.push(pair);
        }

        let mut unused: Vec<String> = definitions.into_keys().collect();
        unused.sort();
        for segment_id in unused {
            self.note(
                &Location::segment(id, &segment_id),
                "segment definition without a matching segment ignored",
            );
        }

        Ok(unit)
    }

    /// Segment markers directly under `container`, in document order.
    fn segment_nodes<'a, 'input>(
        &mut self,
        container: Node<'a, 'input>,
        location: &Location,
    ) -> XliffResult<Vec<(String, Node<'a, 'input>)>> {
        let mut segments = Vec::new();
        let mut seen = HashSet::new();

        for child in container.children() {
            if is_segment_marker(child) {
                let mid = child
                    .attribute("mid")
                    .ok_or_else(|| XliffError::parse(location.clone(), "segment marker without mid"))?;
                if !seen.insert(mid) {
                    return Err(XliffError::parse(
                        location.clone(),
                        format!("duplicate segment id '{}' in {}", mid, container.tag_name().name()),
                    ));
                }
                segments.push((mid.to_string(), child));
            } else if is_content(child) {
                self.note(
                    location,
                    format!("content outside segments in {} ignored", container.tag_name().name()),
                );
            }
        }

        Ok(segments)
    }

    fn read_segment_definitions(&mut self, seg_defs: Node, unit_id: &str) -> XliffResult<Vec<SegmentDefinition>> {
        let mut definitions = Vec::new();
        let mut seen = HashSet::new();

        for seg in seg_defs.children().filter(|n| is_sdl_element(*n, "seg")) {
            let id = seg.attribute("id").ok_or_else(|| {
                XliffError::parse(Location::trans_unit(unit_id), "segment definition without id")
            })?;
            let location = Location::segment(unit_id, id);
            if !seen.insert(id) {
                self.note(&location, "duplicate segment definition ignored");
                continue;
            }

            let confirmation_level =
                self.parse_or_default::<ConfirmationLevel>(seg.attribute("conf"), "confirmation level", &location);
            let is_locked = seg.attribute("locked").is_some_and(is_true);
            let origin = self.read_origin(seg, &location)?;

            definitions.push(SegmentDefinition {
                id: id.to_string(),
                confirmation_level,
                is_locked,
                origin,
            });
        }

        Ok(definitions)
    }

    /// Read the origin of a `sdl:seg` and its `sdl:prev-origin` chain.
    fn read_origin(&mut self, seg: Node, location: &Location) -> XliffResult<Option<TranslationOrigin>> {
        let mut records = vec![seg];
        let mut current = seg;
        while let Some(previous) = sdl_child(current, "prev-origin") {
            records.push(previous);
            current = previous;
        }

        if records.len() == 1 && !has_origin_data(seg) {
            return Ok(None);
        }

        let mut chain: Option<TranslationOrigin> = None;
        for node in records.into_iter().rev() {
            let mut origin = self.read_origin_record(node, location)?;
            origin.origin_before_adaptation = chain.take().map(Box::new);
            chain = Some(origin);
        }

        Ok(chain)
    }

    fn read_origin_record(&mut self, node: Node, location: &Location) -> XliffResult<TranslationOrigin> {
        let match_percent = match node.attribute("percent") {
            Some(percent) => parse_percent(percent, location)?,
            None => 0,
        };

        let mut origin = TranslationOrigin {
            origin_type: attribute(node, "origin"),
            origin_system: attribute(node, "origin-system"),
            match_percent,
            is_structure_context_match: node.attribute("struct-match").is_some_and(is_true),
            text_context_match_level: self.parse_or_default(node.attribute("text-match"), "text match level", location),
            ..TranslationOrigin::default()
        };

        for value in node.children().filter(|n| is_sdl_element(*n, "value")) {
            match value.attribute("key") {
                Some(key) => origin.meta_data.insert(key, &text_content(value)),
                None => self.note(location, "metadata value without key ignored"),
            }
        }

        Ok(origin)
    }

    fn read_segment(
        &mut self,
        node: Node,
        locked: bool,
        location: &Location,
        doc_info: &DocInfo,
        side: &str,
    ) -> XliffResult<Paragraph> {
        let container = if locked {
            lock_wrapper(node).unwrap_or(node)
        } else {
            node
        };
        self.read_paragraph(container, location, doc_info, side)
    }

    /// Walk the inline content of `container` into a paragraph.
    fn read_paragraph(
        &mut self,
        container: Node,
        location: &Location,
        doc_info: &DocInfo,
        side: &str,
    ) -> XliffResult<Paragraph> {
        let mut paragraph = Paragraph::new();
        let mut markers = MarkerStack::new();
        let nesting = |e: NestingError| XliffError::parse(location.clone(), format!("{}: {}", side, e));

        let mut pending: Vec<Step> = container.children().rev().map(Step::Open).collect();
        while let Some(step) = pending.pop() {
            let node = match step {
                Step::Close(element) => {
                    markers.apply(&element).map_err(nesting)?;
                    paragraph.push(element);
                    continue;
                }
                Step::Open(node) => node,
            };
            if node.is_text() {
                paragraph.push_text(node.text().unwrap_or_default());
                continue;
            }
            if !node.is_element() {
                continue;
            }

            match self.classify(node, location, doc_info)? {
                Inline::Leaf(element) => {
                    markers.apply(&element).map_err(nesting)?;
                    paragraph.push(element);
                }
                Inline::Span { open, close } => {
                    markers.apply(&open).map_err(nesting)?;
                    paragraph.push(open);
                    // the closer is popped after every child of the span
                    pending.push(Step::Close(close));
                    pending.extend(node.children().rev().map(Step::Open));
                }
                Inline::Transparent => pending.extend(node.children().rev().map(Step::Open)),
                Inline::Skipped => {}
            }
        }

        markers.finish().map_err(nesting)?;
        Ok(paragraph)
    }

    fn classify(&mut self, node: Node, location: &Location, doc_info: &DocInfo) -> XliffResult<Inline> {
        let name = node.tag_name().name();
        if node.tag_name().namespace() == Some(SDL_NAMESPACE) {
            self.note(location, format!("vendor element '{}' inside content skipped", name));
            return Ok(Inline::Skipped);
        }

        let inline = match name {
            "bpt" => Inline::Leaf(Element::tag_open(required_id(node, location)?, text_content(node))),
            "ept" => Inline::Leaf(Element::tag_close(required_id(node, location)?, text_content(node))),
            "ph" | "x" => Inline::Leaf(Element::placeholder(required_id(node, location)?, text_content(node))),
            "g" => {
                let id = required_id(node, location)?;
                Inline::Span {
                    open: Element::tag_open(id, ""),
                    close: Element::tag_close(id, ""),
                }
            }
            "mrk" => match node.attribute("mtype") {
                Some(LOCKED_MTYPE) => Inline::Span {
                    open: Element::locked_open(),
                    close: Element::locked_close(),
                },
                Some(COMMENT_MTYPE) => {
                    let cid = node
                        .attribute((SDL_NAMESPACE, "cid"))
                        .or_else(|| node.attribute("cid"))
                        .ok_or_else(|| XliffError::parse(location.clone(), "comment marker without cid"))?;
                    if !doc_info.comments.contains_key(cid) {
                        return Err(XliffError::parse(
                            location.clone(),
                            format!("comment marker references unknown definition '{}'", cid),
                        ));
                    }
                    Inline::Span {
                        open: Element::comment_open(cid),
                        close: Element::comment_close(cid),
                    }
                }
                other => {
                    self.note(
                        location,
                        format!("mrk with mtype '{}' kept as plain content", other.unwrap_or_default()),
                    );
                    Inline::Transparent
                }
            },
            other => {
                self.note(location, format!("unsupported inline element '{}' skipped", other));
                Inline::Skipped
            }
        };

        Ok(inline)
    }
}

fn is_xliff_element(node: Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() != Some(SDL_NAMESPACE)
}

fn is_sdl_element(node: Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(SDL_NAMESPACE)
}

fn has_name_ignoring_case(node: Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name().eq_ignore_ascii_case(name)
}

fn xliff_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| is_xliff_element(*child, name))
}

fn sdl_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| is_sdl_element(*child, name))
}

fn is_segment_marker(node: Node) -> bool {
    is_xliff_element(node, "mrk") && node.attribute("mtype") == Some(SEGMENT_MTYPE)
}

/// Element or non-whitespace text.
fn is_content(node: Node) -> bool {
    node.is_element() || (node.is_text() && node.text().is_some_and(|text| !text.trim().is_empty()))
}

fn has_content(node: Node) -> bool {
    node.children().any(is_content)
}

/// The protected span written around a locked segment, if it wraps all of it.
fn lock_wrapper<'a, 'input>(segment: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    let mut children = segment.children();
    match (children.next(), children.next()) {
        (Some(only), None) if is_xliff_element(only, "mrk") && only.attribute("mtype") == Some(LOCKED_MTYPE) => {
            Some(only)
        }
        _ => None,
    }
}

fn has_origin_data(node: Node) -> bool {
    ORIGIN_ATTRIBUTES.iter().any(|rule| node.attribute(rule.name).is_some())
        || node.children().any(|child| is_sdl_element(child, "value"))
}

fn attribute(node: Node, name: &str) -> String {
    node.attribute(name).unwrap_or_default().to_string()
}

fn required_id<'a>(node: Node<'a, '_>, location: &Location) -> XliffResult<&'a str> {
    node.attribute("id").ok_or_else(|| {
        XliffError::parse(
            location.clone(),
            format!("'{}' element without id", node.tag_name().name()),
        )
    })
}

fn text_content(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn parse_percent(value: &str, location: &Location) -> XliffResult<u8> {
    match value.trim().parse::<u8>() {
        Ok(percent) if percent <= 100 => Ok(percent),
        _ => Err(XliffError::parse(
            location.clone(),
            format!("invalid match percent '{}'", value),
        )),
    }
}

fn parse_date(value: Option<&str>, location: &Location) -> XliffResult<Option<DateTime<Utc>>> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(value)
        .map(|date| Some(date.with_timezone(&Utc)))
        .map_err(|e| XliffError::parse(location.clone(), format!("invalid timestamp '{}': {}", value, e)))
}

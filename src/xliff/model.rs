/*!
 * Bilingual document model.
 *
 * One owned tree per document: doc-level metadata with the comment
 * definition table, then files, trans-units and segment pairs. Every type
 * is JSON-serializable so hosts can hand documents over as data.
 */

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::elements::Element;
use super::merge::{self, Side};

/// Root of a bilingual document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Xliff {
    /// Doc-level metadata and comment definitions
    #[serde(default)]
    pub doc_info: DocInfo,

    /// Logical files
    #[serde(default)]
    pub files: Vec<File>,
}

impl Xliff {
    pub fn new(doc_info: DocInfo) -> Self {
        Self {
            doc_info,
            files: Vec::new(),
        }
    }

    pub fn with_file(mut self, file: File) -> Self {
        self.files.push(file);
        self
    }

    /// All trans-units across files, in document order.
    pub fn trans_units(&self) -> impl Iterator<Item = &TransUnit> {
        self.files.iter().flat_map(|file| file.body.trans_units.iter())
    }

    /// All segment pairs across files, in document order.
    pub fn segment_pairs(&self) -> impl Iterator<Item = &SegmentPair> {
        self.trans_units().flat_map(|unit| unit.segment_pairs.iter())
    }

    /// Comments of a comment definition.
    pub fn comment_definition(&self, id: &str) -> Option<&[Comment]> {
        self.doc_info.comments.get(id).map(|comments| comments.as_slice())
    }
}

/// Doc-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocInfo {
    pub project_id: String,

    /// Identifier of the producing tool or document
    pub source: String,

    pub source_language: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// Comment definitions keyed by definition id
    #[serde(default)]
    pub comments: BTreeMap<String, Vec<Comment>>,
}

impl DocInfo {
    pub fn new(project_id: &str, source: &str, source_language: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            source: source.to_string(),
            source_language: source_language.to_string(),
            ..Self::default()
        }
    }

    pub fn with_target_language(mut self, target_language: &str) -> Self {
        self.target_language = Some(target_language.to_string());
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Append a comment to a definition, creating the definition if needed.
    pub fn add_comment(&mut self, definition_id: &str, comment: Comment) {
        self.comments
            .entry(definition_id.to_string())
            .or_default()
            .push(comment);
    }
}

/// A logical file inside the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct File {
    /// Original document identifier or path
    pub original: String,

    pub source_language: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,

    pub data_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,

    #[serde(default)]
    pub body: Body,
}

impl File {
    pub fn new(original: &str, source_language: &str, data_type: &str) -> Self {
        Self {
            original: original.to_string(),
            source_language: source_language.to_string(),
            data_type: data_type.to_string(),
            ..Self::default()
        }
    }

    pub fn with_target_language(mut self, target_language: &str) -> Self {
        self.target_language = Some(target_language.to_string());
        self
    }

    pub fn with_header(mut self, header: Header) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_trans_unit(mut self, trans_unit: TransUnit) -> Self {
        self.body.trans_units.push(trans_unit);
        self
    }
}

/// Skeleton file reference needed to rebuild the native document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub uid: String,
    pub href: String,
}

impl Header {
    pub fn new(uid: &str, href: &str) -> Self {
        Self {
            uid: uid.to_string(),
            href: href.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub trans_units: Vec<TransUnit>,
}

/// Paragraph-level translatable unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransUnit {
    pub id: String,

    #[serde(default)]
    pub segment_pairs: Vec<SegmentPair>,
}

impl TransUnit {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            segment_pairs: Vec::new(),
        }
    }

    pub fn with_segment(mut self, segment_pair: SegmentPair) -> Self {
        self.segment_pairs.push(segment_pair);
        self
    }

    /// Source paragraph reflowed from all segments.
    pub fn merged_source(&self) -> Paragraph {
        merge::merge_segments(&self.segment_pairs, Side::Source)
    }

    /// Target paragraph reflowed from all segments.
    pub fn merged_target(&self) -> Paragraph {
        merge::merge_segments(&self.segment_pairs, Side::Target)
    }

    pub fn segment(&self, id: &str) -> Option<&SegmentPair> {
        self.segment_pairs.iter().find(|pair| pair.id == id)
    }
}

/// Source/target pair sharing one segment id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentPair {
    pub id: String,

    #[serde(default)]
    pub confirmation_level: ConfirmationLevel,

    #[serde(default)]
    pub is_locked: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_origin: Option<TranslationOrigin>,

    #[serde(default)]
    pub source: Paragraph,

    #[serde(default)]
    pub target: Paragraph,
}

impl SegmentPair {
    pub fn new(id: &str, source: Paragraph, target: Paragraph) -> Self {
        Self {
            id: id.to_string(),
            source,
            target,
            ..Self::default()
        }
    }

    pub fn with_confirmation_level(mut self, level: ConfirmationLevel) -> Self {
        self.confirmation_level = level;
        self
    }

    pub fn locked(mut self) -> Self {
        self.is_locked = true;
        self
    }

    pub fn with_origin(mut self, origin: TranslationOrigin) -> Self {
        self.translation_origin = Some(origin);
        self
    }
}

/// Ordered inline content of one side of a segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Paragraph {
    pub elements: Vec<Element>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paragraph holding a single text run.
    pub fn from_text(text: &str) -> Self {
        let mut paragraph = Self::new();
        paragraph.push(Element::text(text));
        paragraph
    }

    /// Append an element, merging it into a preceding text run.
    ///
    /// Empty text is dropped, so the paragraph stays in the form the reader produces.
    pub fn push(&mut self, element: Element) {
        if let Element::Text(text) = element {
            self.push_text(&text);
        } else {
            self.elements.push(element);
        }
    }

    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Element::Text(last)) = self.elements.last_mut() {
            last.push_str(text);
        } else {
            self.elements.push(Element::Text(text.to_string()));
        }
    }

    pub fn with(mut self, element: Element) -> Self {
        self.push(element);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn first(&self) -> Option<&Element> {
        self.elements.first()
    }

    pub fn last(&self) -> Option<&Element> {
        self.elements.last()
    }

    /// Concatenated text runs and placeholder contents are left out.
    pub fn plain_text(&self) -> String {
        self.elements.iter().filter_map(Element::as_text).collect()
    }
}

impl From<Vec<Element>> for Paragraph {
    fn from(elements: Vec<Element>) -> Self {
        let mut paragraph = Self::new();
        for element in elements {
            paragraph.push(element);
        }
        paragraph
    }
}

/// Error for enum values that have no textual form in the format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValue(pub String);

impl fmt::Display for UnknownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl std::error::Error for UnknownValue {}

/// Review state of a segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfirmationLevel {
    #[default]
    Unspecified,
    Draft,
    Translated,
    RejectedTranslation,
    ApprovedTranslation,
    RejectedSignOff,
    ApprovedSignOff,
}

impl ConfirmationLevel {
    pub const ALL: [ConfirmationLevel; 7] = [
        Self::Unspecified,
        Self::Draft,
        Self::Translated,
        Self::RejectedTranslation,
        Self::ApprovedTranslation,
        Self::RejectedSignOff,
        Self::ApprovedSignOff,
    ];

    /// Attribute value used by the `conf` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "Unspecified",
            Self::Draft => "Draft",
            Self::Translated => "Translated",
            Self::RejectedTranslation => "RejectedTranslation",
            Self::ApprovedTranslation => "ApprovedTranslation",
            Self::RejectedSignOff => "RejectedSignOff",
            Self::ApprovedSignOff => "ApprovedSignOff",
        }
    }
}

impl fmt::Display for ConfirmationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfirmationLevel {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| UnknownValue(s.to_string()))
    }
}

/// How much of the surrounding text matched when the target was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextContextMatchLevel {
    #[default]
    None,
    Source,
    SourceAndTarget,
}

impl TextContextMatchLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Source => "Source",
            Self::SourceAndTarget => "SourceAndTarget",
        }
    }
}

impl FromStr for TextContextMatchLevel {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "source" => Ok(Self::Source),
            "sourceandtarget" => Ok(Self::SourceAndTarget),
            _ => Err(UnknownValue(s.to_string())),
        }
    }
}

/// Insertion-ordered key/value metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaData(Vec<(String, String)>);

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value; an existing key keeps its position.
    pub fn insert(&mut self, key: &str, value: &str) {
        if let Some(entry) = self.0.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            self.0.push((key.to_string(), value.to_string()));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Provenance of a segment's target text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationOrigin {
    /// Match type, e.g. "tm", "mt", "interactive"
    #[serde(default)]
    pub origin_type: String,

    #[serde(default)]
    pub origin_system: String,

    /// 0-100
    #[serde(default)]
    pub match_percent: u8,

    #[serde(default)]
    pub is_structure_context_match: bool,

    #[serde(default)]
    pub text_context_match_level: TextContextMatchLevel,

    #[serde(default)]
    pub meta_data: MetaData,

    /// Record that was current before an adaptation replaced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_before_adaptation: Option<Box<TranslationOrigin>>,
}

impl TranslationOrigin {
    pub fn new(origin_type: &str) -> Self {
        Self {
            origin_type: origin_type.to_string(),
            ..Self::default()
        }
    }

    pub fn with_system(mut self, origin_system: &str) -> Self {
        self.origin_system = origin_system.to_string();
        self
    }

    pub fn with_match_percent(mut self, match_percent: u8) -> Self {
        self.match_percent = match_percent;
        self
    }

    pub fn with_structure_context_match(mut self, is_match: bool) -> Self {
        self.is_structure_context_match = is_match;
        self
    }

    pub fn with_text_context_match(mut self, level: TextContextMatchLevel) -> Self {
        self.text_context_match_level = level;
        self
    }

    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.meta_data.insert(key, value);
        self
    }

    pub fn with_previous(mut self, previous: TranslationOrigin) -> Self {
        self.origin_before_adaptation = Some(Box::new(previous));
        self
    }

    /// True when no field differs from its default.
    ///
    /// Such an origin has no serialized form of its own.
    pub fn is_empty(&self) -> bool {
        self.origin_type.is_empty()
            && self.origin_system.is_empty()
            && self.match_percent == 0
            && !self.is_structure_context_match
            && self.text_context_match_level == TextContextMatchLevel::None
            && self.meta_data.is_empty()
            && self.origin_before_adaptation.is_none()
    }

    /// This record followed by every earlier record of the adaptation chain.
    pub fn chain(&self) -> OriginChain<'_> {
        OriginChain {
            next: Some(self),
            visited: HashSet::new(),
        }
    }

    pub fn chain_depth(&self) -> usize {
        self.chain().count()
    }
}

/// Iterator over an adaptation chain; ends early on a revisited record.
pub struct OriginChain<'a> {
    next: Option<&'a TranslationOrigin>,
    visited: HashSet<*const TranslationOrigin>,
}

impl<'a> Iterator for OriginChain<'a> {
    type Item = &'a TranslationOrigin;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if !self.visited.insert(std::ptr::from_ref(current)) {
            return None;
        }
        self.next = current.origin_before_adaptation.as_deref();
        Some(current)
    }
}

/// Severity of a review comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Undefined,
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undefined => "Undefined",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Undefined => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

impl FromStr for Severity {
    type Err = UnknownValue;

    /// Accepts names in any case and the ordinals 0-3.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "undefined" | "0" => Ok(Self::Undefined),
            "low" | "1" => Ok(Self::Low),
            "medium" | "2" => Ok(Self::Medium),
            "high" | "3" => Ok(Self::High),
            _ => Err(UnknownValue(s.to_string())),
        }
    }
}

/// One comment inside a comment definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,

    pub author: String,

    #[serde(default)]
    pub severity: Severity,

    /// UTC, millisecond precision in the serialized form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub version: String,
}

impl Comment {
    pub fn new(text: &str, author: &str, severity: Severity) -> Self {
        Self {
            text: text.to_string(),
            author: author.to_string(),
            severity,
            date: None,
            version: String::new(),
        }
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }
}

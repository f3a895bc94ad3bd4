/*!
 * Invariant checks over a document model.
 *
 * The writer refuses documents with error-level issues; warnings flag
 * content that is valid but will not survive a write/read cycle unchanged.
 */

use std::collections::HashSet;
use std::fmt;

use log::debug;

use super::elements::{Element, check_balance};
use super::model::{File, Paragraph, SegmentPair, Xliff};
use crate::errors::{Location, XliffError, XliffResult};
use crate::language_utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub location: Location,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
        };
        write!(f, "{} at {}: {}", label, self.location, self.message)
    }
}

/// Outcome of `validate`.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.severity == IssueSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.severity == IssueSeverity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Turn the first error into an `InvalidDocument` error.
    pub fn into_result(self) -> XliffResult<()> {
        match self.issues.into_iter().find(|issue| issue.severity == IssueSeverity::Error) {
            Some(issue) => Err(XliffError::invalid(issue.location, issue.message)),
            None => Ok(()),
        }
    }

    fn error(&mut self, location: Location, message: String) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Error,
            location,
            message,
        });
    }

    fn warning(&mut self, location: Location, message: String) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Warning,
            location,
            message,
        });
    }
}

/// Check a document against the model invariants.
pub fn validate(document: &Xliff) -> ValidationReport {
    let mut report = ValidationReport::default();

    let info = &document.doc_info;
    check_doc_info_chars(&mut report, document);
    check_language(&mut report, Location::document(), &info.source_language);
    if let Some(target) = &info.target_language {
        check_language(&mut report, Location::document(), target);
    }

    for file in &document.files {
        check_file_chars(&mut report, file);
        check_language(&mut report, Location::document(), &file.source_language);
        if !info.source_language.is_empty()
            && !file.source_language.is_empty()
            && !language_utils::language_codes_match(&info.source_language, &file.source_language)
        {
            report.warning(
                Location::document(),
                format!(
                    "file '{}' source language '{}' differs from document source language '{}'",
                    file.original, file.source_language, info.source_language
                ),
            );
        }
        if let Some(target) = &file.target_language {
            check_language(&mut report, Location::document(), target);
        }

        let mut unit_ids = HashSet::new();
        for unit in &file.body.trans_units {
            let unit_location = Location::trans_unit(&unit.id);
            check_chars(&mut report, &unit_location, "trans-unit id", &unit.id);
            if unit.id.is_empty() {
                report.error(unit_location.clone(), "trans-unit id is empty".to_string());
            } else if !unit_ids.insert(unit.id.as_str()) {
                report.error(
                    unit_location.clone(),
                    format!("duplicate trans-unit id in file '{}'", file.original),
                );
            }

            let mut segment_ids = HashSet::new();
            for pair in &unit.segment_pairs {
                let location = Location::segment(&unit.id, &pair.id);
                if pair.id.is_empty() {
                    report.error(location.clone(), "segment id is empty".to_string());
                } else if !segment_ids.insert(pair.id.as_str()) {
                    report.error(location.clone(), "duplicate segment id".to_string());
                }
                check_segment(&mut report, document, pair, &location);
            }
        }
    }

    debug!("Validation finished with {} issue(s)", report.issues.len());
    report
}

fn check_language(report: &mut ValidationReport, location: Location, tag: &str) {
    if tag.is_empty() {
        return;
    }
    if let Err(e) = language_utils::validate_language_tag(tag) {
        report.warning(location, e.to_string());
    }
}

fn check_segment(report: &mut ValidationReport, document: &Xliff, pair: &SegmentPair, location: &Location) {
    check_chars(report, location, "segment id", &pair.id);
    for (label, paragraph) in [("source", &pair.source), ("target", &pair.target)] {
        check_paragraph_chars(report, paragraph, label, location);
        if let Err(e) = check_balance(&paragraph.elements) {
            report.error(location.clone(), format!("{}: {}", label, e));
        }
        check_comment_references(report, document, paragraph, label, location);
        check_text_runs(report, paragraph, label, location);
    }

    if let Some(origin) = &pair.translation_origin {
        for record in origin.chain() {
            check_chars(report, location, "origin type", &record.origin_type);
            check_chars(report, location, "origin system", &record.origin_system);
            for (key, value) in record.meta_data.iter() {
                check_chars(report, location, "metadata key", key);
                check_chars(report, location, "metadata value", value);
            }
            if record.match_percent > 100 {
                report.error(
                    location.clone(),
                    format!("match percent {} is above 100", record.match_percent),
                );
            }
        }
    }
}

/// Characters allowed in an XML 1.0 document.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Error on any character a parser would reject; the output could not be read back.
fn check_chars(report: &mut ValidationReport, location: &Location, what: &str, value: &str) {
    if let Some(c) = value.chars().find(|c| !is_xml_char(*c)) {
        report.error(
            location.clone(),
            format!("{} contains U+{:04X}, which XML cannot carry", what, u32::from(c)),
        );
    }
}

fn check_doc_info_chars(report: &mut ValidationReport, document: &Xliff) {
    let info = &document.doc_info;
    let location = Location::document();
    check_chars(report, &location, "project id", &info.project_id);
    check_chars(report, &location, "source", &info.source);
    check_chars(report, &location, "source language", &info.source_language);
    if let Some(target) = &info.target_language {
        check_chars(report, &location, "target language", target);
    }
    for (id, comments) in &info.comments {
        check_chars(report, &location, "comment definition id", id);
        for comment in comments {
            check_chars(report, &location, "comment text", &comment.text);
            check_chars(report, &location, "comment author", &comment.author);
            check_chars(report, &location, "comment version", &comment.version);
        }
    }
}

fn check_file_chars(report: &mut ValidationReport, file: &File) {
    let location = Location::document();
    check_chars(report, &location, "file original", &file.original);
    check_chars(report, &location, "file source language", &file.source_language);
    if let Some(target) = &file.target_language {
        check_chars(report, &location, "file target language", target);
    }
    check_chars(report, &location, "file datatype", &file.data_type);
    if let Some(header) = &file.header {
        check_chars(report, &location, "skeleton uid", &header.uid);
        check_chars(report, &location, "skeleton href", &header.href);
    }
}

fn check_paragraph_chars(report: &mut ValidationReport, paragraph: &Paragraph, label: &str, location: &Location) {
    for element in &paragraph.elements {
        match element {
            Element::Text(text) => check_chars(report, location, label, text),
            Element::TagPair {
                tag_id, tag_content, ..
            }
            | Element::Placeholder { tag_id, tag_content } => {
                check_chars(report, location, label, tag_id);
                check_chars(report, location, label, tag_content);
            }
            Element::Comment { definition_id, .. } => check_chars(report, location, label, definition_id),
            Element::Locked { .. } => {}
        }
    }
}

fn check_comment_references(
    report: &mut ValidationReport,
    document: &Xliff,
    paragraph: &Paragraph,
    label: &str,
    location: &Location,
) {
    for element in &paragraph.elements {
        if let Element::Comment { definition_id, .. } = element {
            if !document.doc_info.comments.contains_key(definition_id) {
                report.error(
                    location.clone(),
                    format!("{}: comment definition '{}' does not exist", label, definition_id),
                );
            }
        }
    }
}

fn check_text_runs(report: &mut ValidationReport, paragraph: &Paragraph, label: &str, location: &Location) {
    let mut previous_was_text = false;
    for element in &paragraph.elements {
        match element {
            Element::Text(text) if text.is_empty() => {
                report.warning(location.clone(), format!("{}: empty text run", label));
            }
            Element::Text(_) if previous_was_text => {
                report.warning(location.clone(), format!("{}: adjacent text runs", label));
            }
            _ => {}
        }
        previous_was_text = matches!(element, Element::Text(_));
    }
}

/*!
 * XLIFF 1.2 codec.
 *
 * `model` and `elements` hold the document; `sniffer`, `reader` and
 * `writer` move it to and from text in either dialect.
 */

pub mod elements;
pub mod merge;
pub mod model;
pub mod reader;
pub mod sniffer;
pub mod validation;
pub mod writer;

pub use elements::{Element, MarkerStack, TagType};
pub use model::{
    Comment, ConfirmationLevel, DocInfo, File, Header, Paragraph, SegmentPair, Severity, TextContextMatchLevel,
    TransUnit, TranslationOrigin, Xliff,
};
pub use reader::{Diagnostic, ReadOutcome, XliffReader};
pub use sniffer::{Dialect, sniff};
pub use validation::{ValidationReport, validate};
pub use writer::XliffWriter;

use crate::errors::XliffResult;

/// Read a document, sniffing its dialect.
pub fn parse(input: &str) -> XliffResult<Xliff> {
    XliffReader::new().parse(input)
}

/// Write a document in `dialect`.
pub fn write(document: &Xliff, dialect: Dialect, include_translations: bool) -> XliffResult<String> {
    XliffWriter::new(dialect).write(document, include_translations)
}

/*!
 * Integration tests for reading documents
 */

use anyhow::Result;
use bixliff::xliff::{
    ConfirmationLevel, Element, Paragraph, Severity, TextContextMatchLevel, XliffReader,
};
use bixliff::{Dialect, XliffError};
use crate::common;

/// Test the extended resource end to end
#[test]
fn test_read_withExtendedResource_shouldPopulateModel() -> Result<()> {
    common::init_logging();
    let outcome = XliffReader::new().read_file(&common::test_resource_path("extended.sdlxliff"), None)?;
    let doc = &outcome.xliff;

    assert_eq!(outcome.dialect, Dialect::Extended);
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);

    assert_eq!(doc.doc_info.project_id, "p-42");
    assert_eq!(doc.doc_info.target_language.as_deref(), Some("de-DE"));
    assert_eq!(
        doc.doc_info.created.map(|created| created.timestamp_subsec_millis()),
        Some(250)
    );

    let file = &doc.files[0];
    assert_eq!(file.original, "manual.docx");
    assert_eq!(file.header.as_ref().map(|header| header.href.as_str()), Some("manual.skl"));
    assert_eq!(file.body.trans_units.len(), 2);

    let unit = &file.body.trans_units[0];
    assert_eq!(unit.id, "tu1");
    assert_eq!(unit.segment_pairs.len(), 2);

    let first = &unit.segment_pairs[0];
    assert_eq!(
        first.source,
        Paragraph::from_text("Click ")
            .with(Element::tag_open("1", ""))
            .with(Element::text("Save"))
            .with(Element::tag_close("1", ""))
            .with(Element::text("."))
    );
    assert_eq!(first.confirmation_level, ConfirmationLevel::ApprovedTranslation);

    let origin = first.translation_origin.as_ref().unwrap();
    assert_eq!(origin.origin_type, "tm");
    assert_eq!(origin.origin_system, "Main TM");
    assert_eq!(origin.match_percent, 100);
    assert!(origin.is_structure_context_match);
    assert_eq!(origin.text_context_match_level, TextContextMatchLevel::SourceAndTarget);
    assert_eq!(origin.meta_data.get("created_by"), Some("jdoe"));
    let previous = origin.origin_before_adaptation.as_deref().unwrap();
    assert_eq!(previous.origin_type, "mt");
    assert_eq!(previous.origin_system, "Engine");
    assert!(previous.origin_before_adaptation.is_none());

    let second = &unit.segment_pairs[1];
    assert_eq!(second.confirmation_level, ConfirmationLevel::Draft);
    assert!(second.translation_origin.is_none());
    assert_eq!(
        second.target.elements,
        vec![
            Element::comment_open("c1"),
            Element::text("Dann schließen."),
            Element::comment_close("c1"),
        ]
    );

    Ok(())
}

/// Test comment definitions in the extended resource
#[test]
fn test_read_withCommentDefinitions_shouldKeepEveryField() -> Result<()> {
    let doc = XliffReader::new().parse(&common::read_resource("extended.sdlxliff")?)?;

    let comments = doc.comment_definition("c1").unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author, "jdoe");
    assert_eq!(comments[0].severity, Severity::Medium);
    assert_eq!(comments[0].text, "Check this");
    assert_eq!(comments[0].version, "1.0");
    assert!(comments[0].date.is_some());
    Ok(())
}

/// Test that a locked segment loses its protected wrapper
#[test]
fn test_read_withLockedSegment_shouldUnwrapProtectedSpan() -> Result<()> {
    let doc = XliffReader::new().parse(&common::read_resource("extended.sdlxliff")?)?;
    let pair = doc.trans_units().nth(1).and_then(|unit| unit.segment("3")).unwrap();

    assert!(pair.is_locked);
    assert_eq!(pair.confirmation_level, ConfirmationLevel::ApprovedSignOff);
    assert_eq!(pair.source, Paragraph::from_text("Version 2.0"));
    assert_eq!(pair.target, Paragraph::from_text("Version 2.0"));
    Ok(())
}

/// Test the plain resource, with and without seg-source
#[test]
fn test_read_withPlainResource_shouldSynthesizeSegments() -> Result<()> {
    let outcome = XliffReader::new().read(&common::read_resource("plain.xlf")?, None)?;
    let doc = &outcome.xliff;

    assert_eq!(outcome.dialect, Dialect::Plain);
    assert!(doc.doc_info.comments.is_empty());

    let greeting = doc.trans_units().next().unwrap();
    assert_eq!(greeting.segment_pairs.len(), 1);
    let pair = &greeting.segment_pairs[0];
    assert_eq!(pair.id, "1");
    assert_eq!(
        pair.source.elements,
        vec![
            Element::text("Hello "),
            Element::placeholder("1", "{name}"),
            Element::text("!"),
        ]
    );
    assert_eq!(pair.target.plain_text(), "Bonjour  !");
    assert_eq!(pair.confirmation_level, ConfirmationLevel::Unspecified);

    let farewell = doc.trans_units().nth(1).unwrap();
    assert_eq!(farewell.segment_pairs[0].target, Paragraph::from_text("Au revoir."));
    Ok(())
}

/// Test that the extended resource read as plain ignores seg-defs
#[test]
fn test_read_withPlainHintOnExtendedInput_shouldDropSegmentMetadata() -> Result<()> {
    let outcome = XliffReader::new().read(&common::read_resource("extended.sdlxliff")?, Some(Dialect::Plain))?;

    assert_eq!(outcome.dialect, Dialect::Plain);
    assert!(outcome.xliff.segment_pairs().all(|pair| pair.translation_origin.is_none()));
    assert!(outcome.xliff.segment_pairs().all(|pair| !pair.is_locked));
    Ok(())
}

/// Test that an unknown root element is rejected before any model is built
#[test]
fn test_read_withUnknownRoot_shouldBeFormatError() {
    let error = XliffReader::new()
        .read("<tmx version=\"1.4\"><body/></tmx>", None)
        .unwrap_err();
    assert!(matches!(error, XliffError::Format(_)));
}

/// Test that a missing file is an I/O error
#[test]
fn test_read_file_withMissingFile_shouldBeIoError() {
    let error = XliffReader::new()
        .read_file(&common::test_resource_path("missing.xlf"), None)
        .unwrap_err();
    assert!(matches!(error, XliffError::Io(_)));
}

/// Test that an unresolved comment reference is a parse error with its location
#[test]
fn test_read_withUnknownCommentReference_shouldFailAtSegment() {
    let input = r#"<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2" xmlns:sdl="http://schemas.sdl.com/xliff">
  <file original="a" source-language="en" datatype="plaintext">
    <body>
      <trans-unit id="u1">
        <source>Hi</source>
        <seg-source><mrk mtype="seg" mid="7"><mrk mtype="x-sdl-comment" sdl:cid="nope">Hi</mrk></mrk></seg-source>
        <sdl:seg-defs><sdl:seg id="7"/></sdl:seg-defs>
      </trans-unit>
    </body>
  </file>
</xliff>"#;

    match XliffReader::new().read(input, None) {
        Err(XliffError::Parse { location, message }) => {
            assert_eq!(location.trans_unit.as_deref(), Some("u1"));
            assert_eq!(location.segment.as_deref(), Some("7"));
            assert!(message.contains("nope"));
        }
        other => panic!("expected a parse error, got {:?}", other.map(|outcome| outcome.dialect)),
    }
}

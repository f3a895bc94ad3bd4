/*!
 * Integration tests for writing documents
 */

use std::fs;
use std::sync::Arc;
use std::thread;
use anyhow::Result;
use bixliff::xliff::{
    Comment, DocInfo, Element, File, Paragraph, SegmentPair, Severity, TransUnit, TranslationOrigin, Xliff,
    XliffReader, XliffWriter,
};
use bixliff::{Dialect, XliffError};
use crate::common;

fn document_with(pair: SegmentPair) -> Xliff {
    Xliff::new(DocInfo::new("p", "tests", "en-US")).with_file(
        File::new("a.txt", "en-US", "plaintext").with_trans_unit(TransUnit::new("u1").with_segment(pair)),
    )
}

/// Test that only non-default origin values become attributes
#[test]
fn test_write_withOriginDefaults_shouldOnlyWriteSetAttributes() -> Result<()> {
    let pair = SegmentPair::new("1", Paragraph::from_text("a"), Paragraph::from_text("b"))
        .with_origin(TranslationOrigin::new("interactive"));
    let output = XliffWriter::new(Dialect::Extended).write(&document_with(pair), true)?;

    assert!(output.contains(r#"<sdl:seg id="1" conf="Unspecified" origin="interactive"/>"#));
    for attribute in ["origin-system=", "percent=", "struct-match=", "text-match=", "locked="] {
        assert!(!output.contains(attribute), "{} should be absent", attribute);
    }
    Ok(())
}

/// Test that a segment without an origin writes a bare definition
#[test]
fn test_write_withoutOrigin_shouldWriteIdAndConfOnly() -> Result<()> {
    let pair = SegmentPair::new("1", Paragraph::from_text("a"), Paragraph::new());
    let output = XliffWriter::new(Dialect::Extended).write(&document_with(pair), true)?;

    assert!(output.contains(r#"<sdl:seg id="1" conf="Unspecified"/>"#));
    assert!(!output.contains("origin="));
    Ok(())
}

/// Test that suppressing translations removes every target-language attribute
#[test]
fn test_write_withoutTranslations_shouldDropTargetLanguageEverywhere() -> Result<()> {
    let doc = common::sample_document();
    let writer = XliffWriter::new(Dialect::Extended);

    let with_targets = writer.write(&doc, true)?;
    assert_eq!(with_targets.matches("target-language=\"fr-FR\"").count(), 2);

    let without_targets = writer.write(&doc, false)?;
    assert!(!without_targets.contains("target-language"));
    assert!(without_targets.contains("Appuyez sur "));

    let reread = XliffReader::new().parse(&without_targets)?;
    assert!(reread.doc_info.target_language.is_none());
    assert!(reread.files.iter().all(|file| file.target_language.is_none()));
    assert_eq!(
        reread.segment_pairs().map(|pair| pair.target.clone()).collect::<Vec<_>>(),
        doc.segment_pairs().map(|pair| pair.target.clone()).collect::<Vec<_>>()
    );
    Ok(())
}

/// Test comment definitions and anchors survive a write/read cycle
#[test]
fn test_write_withComment_shouldRoundTripDefinitionAndAnchor() -> Result<()> {
    let mut doc = document_with(SegmentPair::new(
        "1",
        Paragraph::from_text("Please ")
            .with(Element::comment_open("c-7"))
            .with(Element::text("review"))
            .with(Element::comment_close("c-7")),
        Paragraph::new(),
    ));
    doc.doc_info.add_comment(
        "c-7",
        Comment::new("Check this", "jdoe", Severity::Medium).with_version("1.0"),
    );

    let output = XliffWriter::new(Dialect::Extended).write(&doc, true)?;
    assert!(output.contains(r#"<mrk mtype="x-sdl-comment" sdl:cid="c-7">review</mrk>"#));

    let reread = XliffReader::new().parse(&output)?;
    let comments = reread.comment_definition("c-7").unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author, "jdoe");
    assert_eq!(comments[0].severity, Severity::Medium);
    assert_eq!(comments[0].text, "Check this");
    assert_eq!(comments[0].version, "1.0");
    assert_eq!(reread.segment_pairs().next().map(|pair| &pair.source), Some(&doc.files[0].body.trans_units[0].segment_pairs[0].source));
    Ok(())
}

/// Test that the plain dialect carries no vendor markup
#[test]
fn test_write_withPlainDialect_shouldBeReadBackAsPlain() -> Result<()> {
    let output = XliffWriter::new(Dialect::Plain).write(&common::sample_document(), true)?;

    assert!(!output.contains("sdl:"));
    assert!(!output.contains("x-sdl-comment"));

    let outcome = XliffReader::new().read(&output, None)?;
    assert_eq!(outcome.dialect, Dialect::Plain);
    let sources: Vec<String> = outcome.xliff.segment_pairs().map(|pair| pair.source.plain_text()).collect();
    assert_eq!(sources, vec!["Press OK.", "Then close & exit.", "v2.0"]);
    Ok(())
}

/// Test that escaping is applied to text, tag content and attributes
#[test]
fn test_write_withMarkupCharacters_shouldEscape() -> Result<()> {
    let pair = SegmentPair::new(
        "1",
        Paragraph::from_text("a < b & \"c\"").with(Element::placeholder("1", "<br/>")),
        Paragraph::new(),
    );
    let mut doc = document_with(pair);
    doc.files[0].original = "R&D <draft>.txt".to_string();

    let output = XliffWriter::new(Dialect::Extended).write(&doc, true)?;
    assert!(output.contains("a &lt; b &amp;"));
    assert!(output.contains(r#"<ph id="1">&lt;br/&gt;</ph>"#));
    assert!(output.contains("R&amp;D &lt;draft&gt;.txt"));

    let reread = XliffReader::new().parse(&output)?;
    assert_eq!(reread, doc);
    Ok(())
}

/// Test that carriage returns in content and whitespace in attributes survive XML normalization
#[test]
fn test_write_withLineBreaksAndTabs_shouldRoundTripExactly() -> Result<()> {
    let pair = SegmentPair::new(
        "1",
        Paragraph::from_text("line1\r\nline2").with(Element::placeholder("1", "<br>\r")),
        Paragraph::from_text("a\rb"),
    )
    .with_origin(TranslationOrigin::new("tm").with_system("Main\tTM").with_meta("multi\nline", "v\r\n"));
    let mut doc = document_with(pair);
    doc.doc_info.add_comment("c1", Comment::new("first\r\nsecond", "j\tdoe", Severity::Low));
    doc.files[0].original = "dir\tname.txt".to_string();

    let output = XliffWriter::new(Dialect::Extended).write(&doc, true)?;
    assert!(output.contains("line1&#13;\nline2"));
    assert!(output.contains(r#"origin-system="Main&#9;TM""#));
    assert!(output.contains(r#"key="multi&#10;line""#));
    assert!(output.contains(r#"user="j&#9;doe""#));

    let reread = XliffReader::new().parse(&output)?;
    assert_eq!(reread, doc);
    Ok(())
}

/// Test that characters XML cannot carry are refused instead of written
#[test]
fn test_write_file_withNonXmlCharacters_shouldNotCreateFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out.xlf");
    let writer = XliffWriter::new(Dialect::Extended);

    let control = document_with(SegmentPair::new("1", Paragraph::from_text("a\u{1}b"), Paragraph::new()));
    let result = writer.write_file(&control, &path, true);
    assert!(matches!(result, Err(XliffError::InvalidDocument { .. })));

    let mut non_character = common::simple_document();
    non_character
        .doc_info
        .add_comment("c1", Comment::new("text", "ann\u{FFFE}", Severity::Low));
    let result = writer.write_file(&non_character, &path, true);
    assert!(matches!(result, Err(XliffError::InvalidDocument { .. })));

    assert!(!path.exists());
    Ok(())
}

/// Test that invalid models are refused before anything is written
#[test]
fn test_write_file_withInvalidDocument_shouldNotCreateFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out.xlf");
    let pair = SegmentPair::new(
        "1",
        Paragraph::new().with(Element::tag_open("1", "<b>")),
        Paragraph::new(),
    );

    let result = XliffWriter::new(Dialect::Extended).write_file(&document_with(pair), &path, true);

    assert!(matches!(result, Err(XliffError::InvalidDocument { .. })));
    assert!(!path.exists());
    Ok(())
}

/// Test that a failing publish keeps the previous content in place
#[test]
fn test_write_file_withUnwritableTarget_shouldKeepPreviousState() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("missing-dir").join("out.xlf");

    let result = XliffWriter::new(Dialect::Extended).write_file(&common::sample_document(), &path, true);
    assert!(matches!(result, Err(XliffError::Io(_))));
    assert!(!path.exists());

    let existing = common::create_test_file(temp_dir.path(), "kept.xlf", "previous")?;
    XliffWriter::new(Dialect::Extended).write_file(&common::simple_document(), &existing, true)?;
    assert!(fs::read_to_string(&existing)?.contains("<xliff"));
    assert_eq!(fs::read_dir(temp_dir.path())?.count(), 1);
    Ok(())
}

/// Test that one writer and one reader can serve several threads at once
#[test]
fn test_writer_withConcurrentCalls_shouldProduceIdenticalOutput() -> Result<()> {
    let doc = Arc::new(common::sample_document());
    let writer = XliffWriter::new(Dialect::Extended);
    let reader = XliffReader::new();
    let expected = writer.write(&doc, true)?;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let doc = Arc::clone(&doc);
            thread::spawn(move || -> Result<(String, Xliff), XliffError> {
                let output = writer.write(&doc, true)?;
                let reread = reader.parse(&output)?;
                Ok((output, reread))
            })
        })
        .collect();

    for handle in handles {
        let (output, reread) = handle.join().expect("writer thread panicked")?;
        assert_eq!(output, expected);
        assert_eq!(&reread, doc.as_ref());
    }
    Ok(())
}

/*!
 * Tests for segment merging and inter-segment spacing
 */

use bixliff::xliff::merge::{Side, merge_segments, needs_separator};
use bixliff::xliff::{Element, Paragraph, SegmentPair};

fn source_pairs(texts: &[&str]) -> Vec<SegmentPair> {
    texts
        .iter()
        .enumerate()
        .map(|(index, text)| SegmentPair::new(&(index + 1).to_string(), Paragraph::from_text(text), Paragraph::new()))
        .collect()
}

/// Test the three text boundary cases
#[test]
fn test_merge_segments_withTextBoundaries_shouldSpaceOnce() {
    assert_eq!(merge_segments(&source_pairs(&["cat", "dog"]), Side::Source).plain_text(), "cat dog");
    assert_eq!(merge_segments(&source_pairs(&["cat ", "dog"]), Side::Source).plain_text(), "cat dog");
    assert_eq!(merge_segments(&source_pairs(&["cat", " dog"]), Side::Source).plain_text(), "cat dog");
}

/// Test that a single segment and no segments merge without separators
#[test]
fn test_merge_segments_withZeroOrOneSegment_shouldNotAddSpace() {
    assert!(merge_segments(&[], Side::Source).is_empty());
    assert_eq!(merge_segments(&source_pairs(&["alone"]), Side::Source).plain_text(), "alone");
}

/// Test that a marker at the boundary counts as missing whitespace
#[test]
fn test_merge_segments_withTagAtBoundary_shouldInsertSpace() {
    let pairs = vec![
        SegmentPair::new(
            "1",
            Paragraph::from_text("Press ")
                .with(Element::tag_open("1", "<b>"))
                .with(Element::text("OK"))
                .with(Element::tag_close("1", "</b>")),
            Paragraph::new(),
        ),
        SegmentPair::new("2", Paragraph::from_text("now."), Paragraph::new()),
    ];

    let merged = merge_segments(&pairs, Side::Source);

    assert_eq!(merged.elements.len(), 5);
    assert_eq!(merged.elements[4], Element::text(" now."));
}

/// Test that a separator merges into adjacent text instead of adding runs
#[test]
fn test_merge_segments_withThreeSegments_shouldProduceOneTextRun() {
    let merged = merge_segments(&source_pairs(&["a", "b", "c"]), Side::Source);
    assert_eq!(merged.elements, vec![Element::text("a b c")]);
}

/// Test empty paragraphs on either side of the boundary
#[test]
fn test_needs_separator_withEmptyNeighbour_shouldInsertSpace() {
    assert!(needs_separator(&Paragraph::new(), &Paragraph::from_text("x")));
    assert!(needs_separator(&Paragraph::from_text("x"), &Paragraph::new()));
    assert!(!needs_separator(&Paragraph::from_text("x "), &Paragraph::new()));
}

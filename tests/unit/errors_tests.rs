/*!
 * Tests for error types
 */

use bixliff::errors::{AppError, Location, XliffError};

/// Test location rendering at each level
#[test]
fn test_location_display_withEachLevel_shouldName() {
    assert_eq!(Location::document().to_string(), "document");
    assert_eq!(Location::trans_unit("tu1").to_string(), "trans-unit 'tu1'");
    assert_eq!(Location::segment("tu1", "3").to_string(), "trans-unit 'tu1', segment '3'");
}

/// Test that codec errors carry their location into the message
#[test]
fn test_xliff_error_display_withLocation_shouldIncludeIt() {
    let error = XliffError::parse(Location::segment("a", "b"), "duplicate segment id");
    assert_eq!(
        error.to_string(),
        "Parse error at trans-unit 'a', segment 'b': duplicate segment id"
    );

    let error = XliffError::invalid(Location::document(), "bad");
    assert!(matches!(error, XliffError::InvalidDocument { .. }));
}

/// Test conversions into the application error
#[test]
fn test_app_error_from_withSourceErrors_shouldWrap() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert!(matches!(AppError::from(io), AppError::File(_)));

    let codec = XliffError::Format("unexpected root element 'tmx'".to_string());
    let app = AppError::from(codec);
    assert!(app.to_string().contains("tmx"));

    let other = AppError::from(anyhow::anyhow!("boom"));
    assert!(matches!(other, AppError::Unknown(message) if message == "boom"));
}

/// Test that malformed XML surfaces as an XML error
#[test]
fn test_xliff_error_from_withBrokenXml_shouldBeXml() {
    let error = bixliff::xliff::XliffReader::new()
        .read("<xliff version=\"1.2\"><file>", Some(bixliff::Dialect::Plain))
        .unwrap_err();
    assert!(matches!(error, XliffError::Xml(_)));
}

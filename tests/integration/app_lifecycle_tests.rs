/*!
 * Integration tests for application lifecycle
 */

use std::fs;
use anyhow::Result;
use tokio_test;
use bixliff::app_config::{Config, DialectSetting};
use bixliff::app_controller::{Controller, FileOutcome};
use bixliff::xliff::{XliffReader, XliffWriter};
use bixliff::Dialect;
use crate::common;

/// Test the controller rejects an invalid configuration
#[test]
fn test_controller_with_invalid_config_shouldFail() {
    let config = Config {
        concurrent_files: 0,
        ..Config::default()
    };
    assert!(Controller::with_config(config).is_err());
}

/// Test converting a single extended document to plain
#[test]
fn test_run_withSingleFile_shouldWritePlainOutput() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("manual.sdlxliff");
    fs::copy(common::test_resource_path("extended.sdlxliff"), &input)?;

    let config = Config {
        output_dialect: DialectSetting::Plain,
        ..Config::default()
    };
    let controller = Controller::with_config(config)?;
    let output_dir = temp_dir.path().join("out");

    let outcome = tokio_test::block_on(controller.run(input.clone(), output_dir.clone(), false))?;

    let FileOutcome::Converted(report) = outcome else {
        panic!("expected a conversion");
    };
    assert_eq!(report.output, output_dir.join("manual.out.xlf"));
    assert_eq!(report.input_dialect, Dialect::Extended);
    assert_eq!(report.output_dialect, Dialect::Plain);

    let written = XliffReader::new().read_file(&report.output, None)?;
    assert_eq!(written.dialect, Dialect::Plain);
    assert_eq!(written.xliff.segment_pairs().count(), 3);
    Ok(())
}

/// Test that existing outputs are skipped unless forced
#[test]
fn test_run_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("strings.xlf");
    fs::copy(common::test_resource_path("plain.xlf"), &input)?;
    let existing = common::create_test_file(temp_dir.path(), "strings.out.xlf", "old")?;

    let controller = Controller::with_config(Config::default())?;

    let skipped = tokio_test::block_on(controller.run(input.clone(), temp_dir.path().to_path_buf(), false))?;
    assert_eq!(skipped, FileOutcome::Skipped(existing.clone()));
    assert_eq!(fs::read_to_string(&existing)?, "old");

    let forced = tokio_test::block_on(controller.run(input, temp_dir.path().to_path_buf(), true))?;
    assert!(matches!(forced, FileOutcome::Converted(_)));
    assert!(fs::read_to_string(&existing)?.contains("<xliff"));
    Ok(())
}

/// Test a folder run with good, broken and already converted documents
#[test]
fn test_run_folder_withMixedDocuments_shouldSummarize() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("in");
    let nested = input_dir.join("nested");
    fs::create_dir_all(&nested)?;

    fs::copy(common::test_resource_path("extended.sdlxliff"), input_dir.join("a.sdlxliff"))?;
    fs::copy(common::test_resource_path("plain.xlf"), nested.join("b.xlf"))?;
    common::create_test_file(&input_dir, "broken.xlf", "<xliff version=\"1.2\"><file>")?;
    XliffWriter::new(Dialect::Extended).write_file(
        &common::simple_document(),
        input_dir.join("c.xliff"),
        true,
    )?;
    common::create_test_file(&input_dir, "c.out.xlf", "already converted")?;

    let controller = Controller::with_config(Config::default())?;
    let summary = tokio_test::block_on(controller.run_folder(input_dir.clone(), None, false))?;

    assert_eq!(summary.converted, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);
    assert!(input_dir.join("a.out.xlf").exists());
    assert!(nested.join("b.out.xlf").exists());
    assert!(!input_dir.join("broken.out.xlf").exists());
    assert_eq!(fs::read_to_string(input_dir.join("c.out.xlf"))?, "already converted");
    Ok(())
}

/// Test a folder run into a separate output directory without translations
#[test]
fn test_run_folder_withOutputDir_shouldWriteThereWithoutTargetLanguages() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("in");
    let output_dir = temp_dir.path().join("out");
    fs::create_dir_all(&input_dir)?;
    fs::copy(common::test_resource_path("extended.sdlxliff"), input_dir.join("a.sdlxliff"))?;

    let config = Config {
        include_translations: false,
        concurrent_files: 1,
        ..Config::default()
    };
    let controller = Controller::with_config(config)?;
    let summary = tokio_test::block_on(controller.run_folder(input_dir, Some(output_dir.clone()), false))?;

    assert_eq!(summary.converted, 1);
    let written = fs::read_to_string(output_dir.join("a.out.xlf"))?;
    assert!(!written.contains("target-language"));
    assert!(written.contains("xmlns:sdl"));
    Ok(())
}

/// Test that an empty folder is reported
#[test]
fn test_run_folder_withNoDocuments_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_config(Config::default())?;

    let result = tokio_test::block_on(controller.run_folder(temp_dir.path().to_path_buf(), None, false));
    assert!(result.is_err());
    Ok(())
}

/// Test that the JSON model carries a document through unchanged
#[test]
fn test_json_export_and_import_withSampleDocument_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let doc = common::sample_document();

    let json_path = temp_dir.path().join("model.json");
    bixliff::file_utils::FileManager::write_to_file(&json_path, &serde_json::to_string_pretty(&doc)?)?;

    let loaded: bixliff::Xliff = serde_json::from_str(&fs::read_to_string(&json_path)?)?;
    assert_eq!(loaded, doc);

    let xliff_path = temp_dir.path().join("model.sdlxliff");
    XliffWriter::new(Dialect::Extended).write_file(&loaded, &xliff_path, true)?;
    assert_eq!(XliffReader::new().read_file(&xliff_path, None)?.xliff, doc);
    Ok(())
}

/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use bixliff::app_config::{Config, DialectSetting, LogLevel, DEFAULT_CONFIG_FILE};
use bixliff::Dialect;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.output_dialect, DialectSetting::Auto);
    assert!(config.include_translations);
    assert_eq!(config.concurrent_files, 4);
    assert_eq!(config.output_suffix, "out");
    assert_eq!(config.output_extension, "xlf");
    assert_eq!(config.input_extensions, vec!["xlf", "xliff", "sdlxliff"]);
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(DEFAULT_CONFIG_FILE, "bixliff.json");
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.output_extension = ".".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.input_extensions.clear();
    assert!(config.validate().is_err());

    // No suffix is fine when outputs cannot be mistaken for inputs
    let mut config = Config::default();
    config.output_suffix = String::new();
    config.output_extension = "converted".to_string();
    assert!(config.validate().is_ok());
}

/// Test that save and load preserve every field
#[test]
fn test_config_save_and_load_withCustomValues_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("custom.json");

    let config = Config {
        output_dialect: DialectSetting::Extended,
        include_translations: false,
        concurrent_files: 2,
        output_suffix: "plain".to_string(),
        output_extension: "sdlxliff".to_string(),
        input_extensions: vec!["xlf".to_string()],
        log_level: LogLevel::Debug,
    };
    config.save(&path)?;

    assert_eq!(Config::load(&path)?, config);
    Ok(())
}

/// Test that a malformed file is reported rather than replaced
#[test]
fn test_config_load_or_create_withMalformedFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    assert_eq!(std::fs::read_to_string(&path)?, "{ not json");
    Ok(())
}

/// Test dialect settings against input dialects
#[test]
fn test_dialect_setting_resolve_withEveryCombination_shouldPickOutput() {
    for input in [Dialect::Plain, Dialect::Extended] {
        assert_eq!(DialectSetting::Auto.resolve(input), input);
        assert_eq!(DialectSetting::Plain.resolve(input), Dialect::Plain);
        assert_eq!(DialectSetting::Extended.resolve(input), Dialect::Extended);
    }
    assert_eq!(DialectSetting::from(Dialect::Plain), DialectSetting::Plain);
}

/// Test log level mapping
#[test]
fn test_log_level_to_level_filter_shouldMapEachLevel() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}

/// Test that the configured log level applies unless the command line overrides it
#[test]
fn test_effective_log_level_withConfigFile_shouldUseConfiguredLevelByDefault() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "quiet.json", r#"{"log_level": "warn"}"#)?;
    let config = Config::load_or_create(&path)?;

    assert_eq!(config.effective_log_level(None), LogLevel::Warn);
    assert_eq!(config.effective_log_level(Some(LogLevel::Trace)), LogLevel::Trace);
    Ok(())
}

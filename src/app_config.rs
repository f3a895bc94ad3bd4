use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::xliff::Dialect;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "bixliff.json";

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Dialect of converted documents
    #[serde(default)]
    pub output_dialect: DialectSetting,

    /// Write target-language attributes
    #[serde(default = "default_include_translations")]
    pub include_translations: bool,

    /// Maximum number of files converted at once
    #[serde(default = "default_concurrent_files")]
    pub concurrent_files: usize,

    /// Inserted between file stem and extension of outputs
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    /// Extension of converted documents
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// Extensions picked up when converting a directory
    #[serde(default = "default_input_extensions")]
    pub input_extensions: Vec<String>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Output dialect choice
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DialectSetting {
    // @setting: Keep the dialect each input was read as
    #[default]
    Auto,
    // @setting: Community XLIFF 1.2
    Plain,
    // @setting: XLIFF 1.2 with vendor metadata
    Extended,
}

impl DialectSetting {
    // @returns: Dialect to write for an input read as `input`
    pub fn resolve(&self, input: Dialect) -> Dialect {
        match self {
            Self::Auto => input,
            Self::Plain => Dialect::Plain,
            Self::Extended => Dialect::Extended,
        }
    }
}

impl From<Dialect> for DialectSetting {
    fn from(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Plain => Self::Plain,
            Dialect::Extended => Self::Extended,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_include_translations() -> bool {
    true
}

fn default_concurrent_files() -> usize {
    4
}

fn default_output_suffix() -> String {
    "out".to_string()
}

fn default_output_extension() -> String {
    "xlf".to_string()
}

fn default_input_extensions() -> Vec<String> {
    vec!["xlf".to_string(), "xliff".to_string(), "sdlxliff".to_string()]
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), AppError> {
        if self.concurrent_files == 0 {
            return Err(AppError::Config("concurrent_files must be at least 1".to_string()));
        }

        if self.output_extension.trim_start_matches('.').is_empty() {
            return Err(AppError::Config("output_extension must not be empty".to_string()));
        }

        if self.input_extensions.is_empty() {
            return Err(AppError::Config("input_extensions must list at least one extension".to_string()));
        }

        // Outputs would be picked up again as inputs on the next folder run
        if self.output_suffix.is_empty()
            && self
                .input_extensions
                .iter()
                .any(|ext| ext.trim_start_matches('.').eq_ignore_ascii_case(self.output_extension.trim_start_matches('.')))
        {
            return Err(AppError::Config(
                "output_suffix must be set when output_extension is also an input extension".to_string(),
            ));
        }

        Ok(())
    }

    /// Log level to run with; a command-line level wins over the configured one
    pub fn effective_log_level(&self, cli_level: Option<LogLevel>) -> LogLevel {
        cli_level.unwrap_or(self.log_level)
    }

    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open config file: {:?}", path))?;

        let reader = BufReader::new(file);
        let config: Config =
            serde_json::from_reader(reader).with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;

        FileManager::write_to_file(path.as_ref(), &config_json)
            .with_context(|| format!("Failed to write config to file: {:?}", path.as_ref()))
    }

    /// Load a configuration file, creating it with defaults when missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if FileManager::file_exists(path) {
            return Self::load(path);
        }
        if path.exists() {
            return Err(anyhow!("Config path is not a file: {:?}", path));
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            output_dialect: DialectSetting::default(),
            include_translations: default_include_translations(),
            concurrent_files: default_concurrent_files(),
            output_suffix: default_output_suffix(),
            output_extension: default_output_extension(),
            input_extensions: default_input_extensions(),
            log_level: LogLevel::default(),
        }
    }
}

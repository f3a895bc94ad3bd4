/*!
 * Error types for the bixliff library and CLI.
 *
 * `XliffError` is the codec's error surface: format rejections, structural
 * parse failures, writer-side model rejections, storage failures and XML
 * syntax errors. `AppError` wraps it for the application layer.
 */

use std::fmt;

use thiserror::Error;

/// Position of a problem inside a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Owning trans-unit id, if known
    pub trans_unit: Option<String>,
    /// Owning segment id, if known
    pub segment: Option<String>,
}

impl Location {
    /// Document-level location.
    pub fn document() -> Self {
        Self::default()
    }

    /// Location of a trans-unit.
    pub fn trans_unit(id: &str) -> Self {
        Self {
            trans_unit: Some(id.to_string()),
            segment: None,
        }
    }

    /// Location of a segment inside a trans-unit.
    pub fn segment(trans_unit: &str, segment: &str) -> Self {
        Self {
            trans_unit: Some(trans_unit.to_string()),
            segment: Some(segment.to_string()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.trans_unit, &self.segment) {
            (Some(unit), Some(segment)) => write!(f, "trans-unit '{}', segment '{}'", unit, segment),
            (Some(unit), None) => write!(f, "trans-unit '{}'", unit),
            (None, Some(segment)) => write!(f, "segment '{}'", segment),
            (None, None) => write!(f, "document"),
        }
    }
}

/// Errors raised by the XLIFF codec
#[derive(Error, Debug)]
pub enum XliffError {
    /// Root element, version or dialect is not supported
    #[error("Unsupported format: {0}")]
    Format(String),

    /// Structural violation found while reading
    #[error("Parse error at {location}: {message}")]
    Parse {
        /// Where the violation was found
        location: Location,
        /// What was wrong
        message: String,
    },

    /// Document model rejected by the writer
    #[error("Invalid document at {location}: {message}")]
    InvalidDocument {
        /// Where the violation was found
        location: Location,
        /// What was wrong
        message: String,
    },

    /// Underlying storage failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML
    #[error("Malformed XML: {0}")]
    Xml(String),
}

impl XliffError {
    /// Build a parse error for a location.
    pub fn parse(location: Location, message: impl Into<String>) -> Self {
        Self::Parse {
            location,
            message: message.into(),
        }
    }

    /// Build a writer-side model rejection for a location.
    pub fn invalid(location: Location, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            location,
            message: message.into(),
        }
    }
}

impl From<roxmltree::Error> for XliffError {
    fn from(error: roxmltree::Error) -> Self {
        Self::Xml(error.to_string())
    }
}

impl From<quick_xml::Error> for XliffError {
    fn from(error: quick_xml::Error) -> Self {
        Self::Xml(error.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for XliffError {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(error.to_string())
    }
}

impl From<std::string::FromUtf8Error> for XliffError {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Self::Xml(error.to_string())
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the XLIFF codec
    #[error("XLIFF error: {0}")]
    Xliff(#[from] XliffError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

/// Result type used throughout the codec
pub type XliffResult<T> = std::result::Result<T, XliffError>;

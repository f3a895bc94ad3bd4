/*!
 * Dialect detection.
 *
 * Streams the raw input with an event reader and stops as soon as the
 * answer is known; no tree is built.
 */

use std::fmt;
use std::str::FromStr;

use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};

use crate::errors::{XliffError, XliffResult};

/// Namespace of the vendor extension elements.
pub const SDL_NAMESPACE: &str = "http://schemas.sdl.com/xliff";

/// XLIFF versions sharing the 1.x document structure.
pub const SUPPORTED_VERSIONS: [&str; 3] = ["1.0", "1.1", "1.2"];

const ROOT_ELEMENT: &[u8] = b"xliff";
const SEG_DEFS_ELEMENT: &str = "seg-defs";

/// Structural variant of the format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Community XLIFF 1.2 without per-segment metadata
    Plain,
    /// XLIFF 1.2 with the vendor namespace and `seg-defs` metadata
    #[default]
    Extended,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Extended => "extended",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = XliffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "xliff12" | "xliff12polyglot" => Ok(Self::Plain),
            "extended" | "xliff12sdl" => Ok(Self::Extended),
            _ => Err(XliffError::Format(format!("unknown dialect '{}'", s))),
        }
    }
}

/// Classify raw input as one of the supported dialects.
///
/// The root must be an `xliff` element with a supported version.
/// `Extended` needs both the vendor namespace declaration on the root and
/// a `seg-defs` element in that namespace somewhere in the document.
pub fn sniff(input: &str) -> XliffResult<Dialect> {
    let mut reader = Reader::from_str(input);
    let mut seg_defs_name: Option<Vec<u8>> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) | Event::Empty(element) => {
                if let Some(name) = seg_defs_name.as_deref() {
                    if element.name().as_ref() == name {
                        return Ok(Dialect::Extended);
                    }
                    continue;
                }
                let Some(prefix) = inspect_root(&element)? else {
                    debug!("No vendor namespace on root, plain dialect");
                    return Ok(Dialect::Plain);
                };
                seg_defs_name = Some(format!("{}:{}", prefix, SEG_DEFS_ELEMENT).into_bytes());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match seg_defs_name {
        None => Err(XliffError::Format("no root element".to_string())),
        Some(_) => {
            debug!("Vendor namespace declared but no seg-defs found, plain dialect");
            Ok(Dialect::Plain)
        }
    }
}

/// Validate the root element and return the prefix bound to the vendor namespace.
fn inspect_root(root: &BytesStart<'_>) -> XliffResult<Option<String>> {
    if root.local_name().as_ref() != ROOT_ELEMENT {
        return Err(XliffError::Format(format!(
            "unexpected root element '{}'",
            String::from_utf8_lossy(root.name().as_ref())
        )));
    }

    let mut version = None;
    let mut prefix = None;
    for attribute in root.attributes() {
        let attribute = attribute?;
        let key = attribute.key.as_ref();
        let value = attribute.unescape_value()?;
        if key == b"version" {
            version = Some(value.into_owned());
        } else if let Some(declared) = key.strip_prefix(b"xmlns:") {
            if value == SDL_NAMESPACE {
                prefix = Some(String::from_utf8_lossy(declared).into_owned());
            }
        }
    }

    match version {
        Some(version) if SUPPORTED_VERSIONS.contains(&version.as_str()) => Ok(prefix),
        Some(version) => Err(XliffError::Format(format!("unsupported XLIFF version '{}'", version))),
        None => Err(XliffError::Format("missing XLIFF version".to_string())),
    }
}

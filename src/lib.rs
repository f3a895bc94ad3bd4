/*!
 * # bixliff - Bilingual XLIFF documents
 *
 * A Rust library for reading, inspecting and writing XLIFF 1.2 bilingual
 * documents.
 *
 * ## Features
 *
 * - Typed document model: files, trans-units, segment pairs and inline
 *   content (text, tag pairs, placeholders, locked spans, comment anchors)
 * - Two dialects:
 *   - plain XLIFF 1.2 with `seg-source` segmentation
 *   - extended XLIFF 1.2 with per-segment confirmation levels, locks,
 *     translation origins and review comments
 * - Streaming dialect detection
 * - Round-trip safe writer with optional suppression of target languages
 * - Batch conversion of whole directories
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `xliff`: the codec:
 *   - `xliff::model`: Document model
 *   - `xliff::elements`: Inline elements and the marker automaton
 *   - `xliff::sniffer`: Dialect detection
 *   - `xliff::reader`: Text to model
 *   - `xliff::writer`: Model to text
 *   - `xliff::merge`: Segment spacing when reflowing paragraphs
 *   - `xliff::validation`: Model invariant checks
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `app_controller`: Single-file and folder conversion
 * - `language_utils`: Language tag utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod xliff;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{BatchSummary, Controller, FileOutcome};
pub use errors::{AppError, Location, XliffError, XliffResult};
pub use language_utils::{get_language_name, language_codes_match, validate_language_tag};
pub use xliff::{Dialect, Paragraph, SegmentPair, TransUnit, Xliff, XliffReader, XliffWriter};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

// @module: File and directory utilities

// @pattern: XLIFF root element near the start of a document
static XLIFF_ROOT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"<(?:[A-Za-z_][\w.-]*:)?xliff[\s>/]").ok());

// @const: Bytes inspected when sniffing file contents
const CONTENT_SNIFF_BYTES: usize = 4096;

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Output path for a converted document
    // @params: input_file, output_dir, suffix, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        suffix: &str,
        extension: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let output_dir = output_dir.as_ref();

        let stem = input_file.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        if !suffix.is_empty() {
            output_filename.push('.');
            output_filename.push_str(suffix);
        }
        output_filename.push('.');
        output_filename.push_str(extension.trim_start_matches('.'));

        output_dir.join(output_filename)
    }

    /// Find files with any of the given extensions under a directory
    pub fn find_files<P: AsRef<Path>>(dir: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy();
                if extensions
                    .iter()
                    .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(&ext))
                {
                    result.push(path.to_path_buf());
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file, creating parent directories
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        Self::write_atomic(path.as_ref(), content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
    }

    /// Replace `path` with `content` through a temporary file in the same directory.
    ///
    /// Either the whole new content is visible under `path` or the old state
    /// is left untouched.
    pub fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut temp = NamedTempFile::new_in(&parent)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Detect whether a file holds an XLIFF document or a JSON document model
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("File does not exist: {:?}", path));
        }

        if let Some(ext) = path.extension() {
            match ext.to_string_lossy().to_lowercase().as_str() {
                "xlf" | "xliff" | "sdlxliff" => return Ok(FileType::Xliff),
                "json" => return Ok(FileType::Json),
                _ => {}
            }
        }

        // Fall back to examining the start of the file
        let content = fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;
        let head = String::from_utf8_lossy(&content[..content.len().min(CONTENT_SNIFF_BYTES)]);
        let trimmed = head.trim_start_matches('\u{feff}').trim_start();

        if trimmed.starts_with('{') {
            return Ok(FileType::Json);
        }
        if let Some(pattern) = XLIFF_ROOT.as_ref() {
            if pattern.is_match(trimmed) {
                return Ok(FileType::Xliff);
            }
        }

        Ok(FileType::Unknown)
    }
}

/// Enum representing the document kinds the tool handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// XLIFF document in either dialect
    Xliff,
    /// JSON serialization of the document model
    Json,
    /// Unknown file type
    Unknown,
}

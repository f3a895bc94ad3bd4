use anyhow::{Context, Result, anyhow};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::xliff::{Dialect, XliffReader, XliffWriter};

// @module: Application controller for document conversion

/// What happened to one input document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    // @variant: Written to `output`
    Converted(ConversionReport),
    // @variant: Output already present and overwrite not forced
    Skipped(PathBuf),
}

/// Details of a finished conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub input_dialect: Dialect,
    pub output_dialect: Dialect,
    /// Non-fatal reader findings
    pub diagnostics: usize,
}

/// Counts of a folder run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller for document conversion
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path a converted document is written to
    pub fn output_path_for(&self, input_file: &Path, output_dir: &Path) -> PathBuf {
        FileManager::generate_output_path(
            input_file,
            output_dir,
            &self.config.output_suffix,
            &self.config.output_extension,
        )
    }

    /// Read, re-encode and atomically write one document
    pub fn convert_file(config: &Config, input_file: &Path, output_file: &Path) -> Result<ConversionReport> {
        let outcome = XliffReader::new()
            .read_file(input_file, None)
            .with_context(|| format!("Failed to read {:?}", input_file))?;
        for diagnostic in &outcome.diagnostics {
            warn!("{}: {}", input_file.display(), diagnostic);
        }

        let output_dialect = config.output_dialect.resolve(outcome.dialect);
        XliffWriter::new(output_dialect)
            .write_file(&outcome.xliff, output_file, config.include_translations)
            .with_context(|| format!("Failed to write {:?}", output_file))?;

        debug!(
            "Converted {} ({}) to {} ({})",
            input_file.display(),
            outcome.dialect,
            output_file.display(),
            output_dialect
        );

        Ok(ConversionReport {
            input: input_file.to_path_buf(),
            output: output_file.to_path_buf(),
            input_dialect: outcome.dialect,
            output_dialect,
            diagnostics: outcome.diagnostics.len(),
        })
    }

    /// Convert a single document into `output_dir`
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<FileOutcome> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        FileManager::ensure_dir(&output_dir)?;

        let output_path = self.output_path_for(&input_file, &output_dir);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping file, output already exists (use -f to force overwrite)");
            return Ok(FileOutcome::Skipped(output_path));
        }

        let config = self.config.clone();
        let report = tokio::task::spawn_blocking(move || Self::convert_file(&config, &input_file, &output_path))
            .await
            .context("Conversion task panicked")??;

        info!(
            "Success: {} in {}",
            report.output.display(),
            Self::format_duration(start_time.elapsed())
        );
        Ok(FileOutcome::Converted(report))
    }

    /// Convert every document under `input_dir`
    ///
    /// Outputs go next to their input unless `output_dir` is given. Documents
    /// produced by an earlier run are not picked up as inputs.
    pub async fn run_folder(
        &self,
        input_dir: PathBuf,
        output_dir: Option<PathBuf>,
        force_overwrite: bool,
    ) -> Result<BatchSummary> {
        let start_time = std::time::Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }
        if let Some(dir) = &output_dir {
            FileManager::ensure_dir(dir)?;
        }

        let documents: Vec<PathBuf> = FileManager::find_files(&input_dir, &self.config.input_extensions)?
            .into_iter()
            .filter(|path| !self.is_generated_output(path))
            .collect();

        if documents.is_empty() {
            return Err(anyhow!("No documents found in directory: {:?}", input_dir));
        }

        let mut summary = BatchSummary::default();
        let mut jobs = Vec::new();
        for document in documents {
            let target_dir = match (&output_dir, document.parent()) {
                (Some(dir), _) => dir.clone(),
                (None, Some(parent)) => parent.to_path_buf(),
                (None, None) => input_dir.clone(),
            };
            let output_path = self.output_path_for(&document, &target_dir);
            if output_path.exists() && !force_overwrite {
                debug!("Skipping {}, output already exists", document.display());
                summary.skipped += 1;
                continue;
            }
            jobs.push((document, output_path));
        }

        let folder_pb = ProgressBar::new(jobs.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Converting documents");

        let results = stream::iter(jobs)
            .map(|(input, output)| {
                let config = self.config.clone();
                let progress = folder_pb.clone();
                async move {
                    let task_input = input.clone();
                    let result = match tokio::task::spawn_blocking(move || {
                        Self::convert_file(&config, &task_input, &output)
                    })
                    .await
                    {
                        Ok(result) => result,
                        Err(e) => Err(anyhow!("Conversion task panicked: {}", e)),
                    };
                    progress.inc(1);
                    (input, result)
                }
            })
            .buffer_unordered(self.config.concurrent_files)
            .collect::<Vec<_>>()
            .await;

        for (input, result) in results {
            match result {
                Ok(_) => summary.converted += 1,
                Err(e) => {
                    error!("Error converting {}: {:#}", input.display(), e);
                    summary.failed += 1;
                }
            }
        }

        folder_pb.finish_with_message("Folder conversion complete");

        info!(
            "Folder conversion completed: {} converted, {} skipped, {} errors in {}",
            summary.converted,
            summary.skipped,
            summary.failed,
            Self::format_duration(start_time.elapsed())
        );

        Ok(summary)
    }

    // Outputs are named `<stem>.<suffix>.<extension>`
    fn is_generated_output(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().map(|name| name.to_string_lossy().to_lowercase()) else {
            return false;
        };
        let ending = format!(
            ".{}.{}",
            self.config.output_suffix,
            self.config.output_extension.trim_start_matches('.')
        )
        .to_lowercase();
        !self.config.output_suffix.is_empty() && name.ends_with(&ending)
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

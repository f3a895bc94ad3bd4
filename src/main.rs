// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use bixliff::app_config::{self, Config, DialectSetting};
use bixliff::app_controller::{Controller, FileOutcome};
use bixliff::file_utils::{FileManager, FileType};
use bixliff::language_utils;
use bixliff::xliff::{self, Dialect, Xliff, XliffReader, XliffWriter};

/// CLI Wrapper for Dialect to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDialect {
    Plain,
    Extended,
}

impl From<CliDialect> for Dialect {
    fn from(cli_dialect: CliDialect) -> Self {
        match cli_dialect {
            CliDialect::Plain => Dialect::Plain,
            CliDialect::Extended => Dialect::Extended,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the dialect of a document
    Sniff {
        /// Document to look at
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Summarize a document
    Inspect {
        /// Document to summarize
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the whole document model as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Check a document against the model invariants
    Validate {
        /// Document to check
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Re-encode a document or every document in a directory
    Convert(ConvertArgs),

    /// Write the document model as JSON
    Export {
        /// Document to export
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// JSON file to write
        #[arg(value_name = "OUT_JSON")]
        output: PathBuf,
    },

    /// Write a JSON document model (or another XLIFF document) as XLIFF
    Import {
        /// JSON document model
        #[arg(value_name = "IN_JSON")]
        input: PathBuf,

        /// XLIFF file to write
        #[arg(value_name = "OUT_XLF")]
        output: PathBuf,

        /// Output dialect (defaults to the dialect the input was read as)
        #[arg(short, long, value_enum)]
        dialect: Option<CliDialect>,

        /// Leave target-language attributes out
        #[arg(long)]
        no_translations: bool,
    },

    /// Generate shell completions for bixliff
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Input document or directory to convert
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Output directory (defaults to next to each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output dialect (overrides the config)
    #[arg(short, long, value_enum)]
    dialect: Option<CliDialect>,

    /// Leave target-language attributes out
    #[arg(long)]
    no_translations: bool,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

/// bixliff - Bilingual XLIFF documents
///
/// Reads, inspects, validates and re-encodes XLIFF 1.2 documents in the
/// plain and the extended dialect.
#[derive(Parser, Debug)]
#[command(name = "bixliff")]
#[command(version)]
#[command(about = "XLIFF 1.2 bilingual document tool")]
#[command(long_about = "bixliff reads XLIFF 1.2 documents into a typed model and writes them back out.

EXAMPLES:
    bixliff sniff job.sdlxliff                     # Print plain or extended
    bixliff inspect job.sdlxliff                   # Summary of units, segments and comments
    bixliff inspect --json job.sdlxliff            # Full model as JSON
    bixliff validate job.xlf                       # Exit non-zero on invalid content
    bixliff convert -d plain job.sdlxliff          # Re-encode as plain XLIFF 1.2
    bixliff convert -f -o out/ projects/           # Convert a whole directory
    bixliff export job.xlf job.json                # Model to JSON
    bixliff import job.json job.xlf -d extended    # JSON to XLIFF
    bixliff completions bash > bixliff.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in bixliff.json by default. You can specify a
    different config file with --config-path. If the config file doesn't
    exist, a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = app_config::DEFAULT_CONFIG_FILE)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Label and ANSI colour for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "\x1B[1;31m"),
            Level::Warn => ("WARN ", "\x1B[1;33m"),
            Level::Info => ("INFO ", "\x1B[1;32m"),
            Level::Debug => ("DEBUG", "\x1B[1;36m"),
            Level::Trace => ("TRACE", "\x1B[1;35m"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (label, colour) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", colour, now, label, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with the most verbose level; the
    // effective level is set through set_max_level below
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(cmd_log_level) = &cli.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    // Every command except completions runs with the loaded configuration
    let load = || load_config(&cli.config_path, cli.log_level.as_ref());

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "bixliff", &mut std::io::stdout());
            Ok(())
        }
        Commands::Sniff { file } => {
            load()?;
            run_sniff(&file)
        }
        Commands::Inspect { file, json } => {
            load()?;
            run_inspect(&file, json)
        }
        Commands::Validate { file } => {
            load()?;
            run_validate(&file)
        }
        Commands::Export { file, output } => {
            load()?;
            run_export(&file, &output)
        }
        Commands::Import {
            input,
            output,
            dialect,
            no_translations,
        } => {
            let config = load()?;
            let include = config.include_translations && !no_translations;
            run_import(&input, &output, dialect.map(Dialect::from), include)
        }
        Commands::Convert(args) => {
            let config = load()?;
            run_convert(config, args).await
        }
    }
}

// Load or create the configuration and apply the log level from it
fn load_config(config_path: &str, cli_log_level: Option<&CliLogLevel>) -> Result<Config> {
    let mut config = Config::load_or_create(config_path)?;

    config.log_level = config.effective_log_level(cli_log_level.cloned().map(app_config::LogLevel::from));
    log::set_max_level(config.log_level.to_level_filter());

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

// XLIFF documents are read; JSON document models are loaded as they are and
// count as the default dialect
fn read_document(file: &Path) -> Result<xliff::ReadOutcome> {
    if FileManager::detect_file_type(file)? == FileType::Json {
        let content = FileManager::read_to_string(file)?;
        let document: Xliff =
            serde_json::from_str(&content).with_context(|| format!("Failed to parse document model {:?}", file))?;
        return Ok(xliff::ReadOutcome {
            xliff: document,
            dialect: Dialect::default(),
            diagnostics: Vec::new(),
        });
    }

    let outcome = XliffReader::new()
        .read_file(file, None)
        .with_context(|| format!("Failed to read {:?}", file))?;
    for diagnostic in &outcome.diagnostics {
        warn!("{}", diagnostic);
    }
    Ok(outcome)
}

fn run_sniff(file: &Path) -> Result<()> {
    let content = FileManager::read_to_string(file)?;
    let dialect = xliff::sniff(&content).with_context(|| format!("Failed to sniff {:?}", file))?;
    println!("{}", dialect);
    Ok(())
}

/// Per-document numbers printed by `inspect`
#[derive(Debug, Serialize)]
struct DocumentSummary {
    dialect: Dialect,
    source_language: String,
    target_language: Option<String>,
    files: usize,
    trans_units: usize,
    segments: usize,
    locked_segments: usize,
    confirmation_levels: BTreeMap<String, usize>,
    comment_definitions: usize,
    comments: usize,
    diagnostics: usize,
}

impl DocumentSummary {
    fn new(outcome: &xliff::ReadOutcome) -> Self {
        let document = &outcome.xliff;
        let mut confirmation_levels = BTreeMap::new();
        let mut locked_segments = 0;
        for pair in document.segment_pairs() {
            *confirmation_levels
                .entry(pair.confirmation_level.to_string())
                .or_insert(0) += 1;
            if pair.is_locked {
                locked_segments += 1;
            }
        }

        let first_file = document.files.first();
        let source_language = match first_file {
            Some(file) if document.doc_info.source_language.is_empty() => file.source_language.clone(),
            _ => document.doc_info.source_language.clone(),
        };
        let target_language = document
            .doc_info
            .target_language
            .clone()
            .or_else(|| first_file.and_then(|file| file.target_language.clone()));

        Self {
            dialect: outcome.dialect,
            source_language,
            target_language,
            files: document.files.len(),
            trans_units: document.trans_units().count(),
            segments: document.segment_pairs().count(),
            locked_segments,
            confirmation_levels,
            comment_definitions: document.doc_info.comments.len(),
            comments: document.doc_info.comments.values().map(Vec::len).sum(),
            diagnostics: outcome.diagnostics.len(),
        }
    }
}

fn describe_language(tag: &str) -> String {
    match language_utils::get_language_name(tag) {
        Ok(name) => format!("{} ({})", tag, name),
        Err(_) => tag.to_string(),
    }
}

fn run_inspect(file: &Path, json: bool) -> Result<()> {
    let outcome = read_document(file)?;

    if json {
        let model = serde_json::to_string_pretty(&outcome.xliff).context("Failed to serialize document")?;
        println!("{}", model);
        return Ok(());
    }

    let summary = DocumentSummary::new(&outcome);
    println!("Document:        {}", file.display());
    println!("Dialect:         {}", summary.dialect);
    println!("Source language: {}", describe_language(&summary.source_language));
    if let Some(target) = &summary.target_language {
        println!("Target language: {}", describe_language(target));
    }
    println!("Files:           {}", summary.files);
    println!("Trans-units:     {}", summary.trans_units);
    println!("Segments:        {} ({} locked)", summary.segments, summary.locked_segments);
    for (level, count) in &summary.confirmation_levels {
        println!("  {:<22} {}", level, count);
    }
    println!(
        "Comments:        {} in {} definition(s)",
        summary.comments, summary.comment_definitions
    );
    println!("Diagnostics:     {}", summary.diagnostics);
    Ok(())
}

fn run_validate(file: &Path) -> Result<()> {
    let outcome = read_document(file)?;
    let report = xliff::validate(&outcome.xliff);

    for issue in &report.issues {
        println!("{}", issue);
    }

    let errors = report.errors().count();
    let warnings = report.warnings().count();
    if errors > 0 {
        error!("{:?}: {} error(s), {} warning(s)", file, errors, warnings);
        return Err(anyhow!("Validation failed for {:?}", file));
    }

    info!("{:?} is valid ({} warning(s))", file, warnings);
    Ok(())
}

fn run_export(file: &Path, output: &Path) -> Result<()> {
    let outcome = read_document(file)?;
    let model = serde_json::to_string_pretty(&outcome.xliff).context("Failed to serialize document")?;
    FileManager::write_to_file(output, &model)?;
    info!("Success: {:?}", output);
    Ok(())
}

fn run_import(input: &Path, output: &Path, dialect: Option<Dialect>, include_translations: bool) -> Result<()> {
    let outcome = read_document(input)?;
    let document = outcome.xliff;

    let dialect = dialect.unwrap_or(outcome.dialect);
    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        FileManager::ensure_dir(parent)?;
    }
    XliffWriter::new(dialect)
        .write_file(&document, output, include_translations)
        .with_context(|| format!("Failed to write {:?}", output))?;

    info!("Success: {:?} ({})", output, dialect);
    Ok(())
}

async fn run_convert(mut config: Config, args: ConvertArgs) -> Result<()> {
    if let Some(dialect) = args.dialect {
        config.output_dialect = DialectSetting::from(Dialect::from(dialect));
    }
    if args.no_translations {
        config.include_translations = false;
    }

    let controller = Controller::with_config(config)?;

    if args.input_path.is_file() {
        let parent = args.input_path.parent().filter(|parent| !parent.as_os_str().is_empty());
        let output_dir = match (&args.output_dir, parent) {
            (Some(dir), _) => dir.clone(),
            (None, Some(parent)) => parent.to_path_buf(),
            (None, None) => PathBuf::from("."),
        };
        if let FileOutcome::Skipped(path) = controller.run(args.input_path, output_dir, args.force_overwrite).await? {
            warn!("Output already exists: {:?}", path);
        }
    } else if args.input_path.is_dir() {
        let summary = controller
            .run_folder(args.input_path, args.output_dir, args.force_overwrite)
            .await?;
        if summary.failed > 0 {
            return Err(anyhow!("{} document(s) failed to convert", summary.failed));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", args.input_path));
    }

    Ok(())
}

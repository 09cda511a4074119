//! Binary entry point for the refinfer CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Infer extract/inline-variable refactorings in one diff document
//! refinfer infer diff.json
//!
//! # Every document under a directory, one compact JSON line each
//! refinfer infer --dir diffs/
//!
//! # List the recorded AST node mappings whose source is a given node
//! refinfer mappings diff.json --src "ReturnStatement [17511,17714]"
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use refinfer::cli::{run_infer, run_infer_dir, run_mappings};
use refinfer::report::render_text;
use refinfer_core::config::{Config, OutputFormat};
use refinfer_core::error::{OutputErrorCode, RefinferError};
use refinfer_core::output::{emit_response, emit_response_compact, ErrorResponse};
use refinfer_mapping::InferenceOptions;
use serde::Serialize;

// ============================================================================
// CLI Structure
// ============================================================================

/// Extract/inline-variable inference over fragment mappings.
///
/// Reads diff documents produced by a statement matcher and explains the
/// differences between mapped fragments. Output is JSON by default.
#[derive(Parser, Debug)]
#[command(name = "refinfer", version, about = "Infer variable refactorings from fragment mappings")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Configuration file (default: refinfer.toml in the current directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (overrides the configuration).
    #[arg(long, global = true, value_enum)]
    format: Option<Format>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Report format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// JSON envelope.
    Json,
    /// Human-readable summary.
    Text,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputFormat::Json,
            Format::Text => OutputFormat::Text,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Infer extract/inline-variable refactorings.
    Infer {
        /// Diff document to read.
        #[arg(required_unless_present = "dir", conflicts_with = "dir")]
        file: Option<PathBuf>,

        /// Process every `*.json` document under this directory.
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Mark refactorings as found inside an extracted or inlined method.
        #[arg(long)]
        inside_extracted_method: bool,

        /// Also run inference on mappings that are already exact.
        #[arg(long)]
        include_exact: bool,
    },
    /// List the AST node mappings recorded in a document.
    Mappings {
        /// Diff document to read.
        file: PathBuf,

        /// Only mappings whose source renders as this node.
        #[arg(long)]
        src: Option<String>,
    },
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err, None);

            // Errors go to stdout as JSON, like every other response
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Load the configuration named on the command line, or the one in the
/// current directory.
fn load_config(global: &GlobalArgs) -> Result<Config, RefinferError> {
    let mut config = match &global.config {
        Some(path) => Config::load(path)?,
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| RefinferError::internal(format!("no current directory: {e}")))?;
            Config::load_from_dir(&cwd)?
        }
    };
    if let Some(format) = global.format {
        config.output.format = format.into();
    }
    Ok(config)
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), RefinferError> {
    let config = load_config(&cli.global)?;
    match cli.command {
        Command::Infer {
            file,
            dir,
            inside_extracted_method,
            include_exact,
        } => {
            let mut options = InferenceOptions::from(&config.inference);
            if inside_extracted_method {
                options.inside_extracted_or_inlined_method = true;
            }
            if include_exact {
                options.skip_exact_mappings = false;
            }
            execute_infer(&config, file.as_deref(), dir.as_deref(), options)
        }
        Command::Mappings { file, src } => execute_mappings(&config, &file, src.as_deref()),
    }
}

// ============================================================================
// Command Executors
// ============================================================================

fn execute_infer(
    config: &Config,
    file: Option<&Path>,
    dir: Option<&Path>,
    options: InferenceOptions,
) -> Result<(), RefinferError> {
    let mut stdout = io::stdout();
    match (file, dir) {
        (Some(file), _) => {
            let response = run_infer(file, options)?;
            match config.output.format {
                OutputFormat::Json => emit(config, &response, &mut stdout)?,
                OutputFormat::Text => write_text(&render_text(&response), &mut stdout)?,
            }
        }
        (None, Some(dir)) => {
            for response in run_infer_dir(dir, options)? {
                match config.output.format {
                    // One line per document
                    OutputFormat::Json => emit_response_compact(&response, &mut stdout)
                        .map_err(|e| RefinferError::internal(e.to_string()))?,
                    OutputFormat::Text => write_text(&render_text(&response), &mut stdout)?,
                }
            }
        }
        (None, None) => {
            return Err(RefinferError::invalid_args_with_details(
                "expected FILE or --dir",
                serde_json::json!({ "expected": ["FILE", "--dir"] }),
            ))
        }
    }
    let _ = stdout.flush();
    Ok(())
}

fn execute_mappings(config: &Config, file: &Path, src: Option<&str>) -> Result<(), RefinferError> {
    let response = run_mappings(file, src)?;
    let mut stdout = io::stdout();
    match config.output.format {
        OutputFormat::Json => emit(config, &response, &mut stdout)?,
        OutputFormat::Text => {
            let mut text = response.mappings.join("\n");
            if !text.is_empty() {
                text.push('\n');
            }
            write_text(&text, &mut stdout)?;
        }
    }
    let _ = stdout.flush();
    Ok(())
}

fn emit<T: Serialize>(config: &Config, response: &T, out: &mut impl Write) -> Result<(), RefinferError> {
    let result = if config.output.pretty {
        emit_response(response, out)
    } else {
        emit_response_compact(response, out)
    };
    result.map_err(|e| RefinferError::internal(e.to_string()))
}

fn write_text(text: &str, out: &mut impl Write) -> Result<(), RefinferError> {
    out.write_all(text.as_bytes())
        .map_err(|e| RefinferError::internal(e.to_string()))
}

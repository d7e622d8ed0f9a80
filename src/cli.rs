//! CLI argument parsing for cosechar

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for framework summaries
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// JSON array per test type (default)
    Json,
    /// CSV table per test type for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "cosechar")]
#[command(version)]
#[command(
    about = "Harvest wrk load-test logs and dstat resource samples into per-framework summaries",
    long_about = None
)]
pub struct Cli {
    /// Directory containing unpacked benchmark results (one subdirectory per framework)
    pub results_dir: PathBuf,

    /// Directory where per-test-type summary files are written
    #[arg(short = 'o', long = "out", value_name = "DIR", default_value = "docs")]
    pub out_dir: PathBuf,

    /// Output format (json or csv)
    #[arg(long = "format", value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Restrict extraction to a single test type
    #[arg(long = "test-type", value_name = "TYPE")]
    pub test_type: Option<String>,

    /// Path to a TOML config overriding the harvested test types
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long = "pretty")]
    pub pretty: bool,

    /// Enable debug logging to stderr
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Detect the semantic schema of tabular datasets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run schema detection over a CSV file and print the result
    Detect(DetectArgs),
    /// List registered detectors and their persisted configuration
    Detectors(DetectorsArgs),
    /// Seed default detector-config records into a registry store
    Seed(SeedArgs),
}

#[derive(Debug, Args)]
pub struct DetectArgs {
    /// Input CSV file to analyze ('-' reads from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Detector to run; omitted means auto-select with default fallback
    #[arg(short = 'd', long = "detector")]
    pub detector: Option<String>,
    /// Registry store with persisted detector configuration (.yml)
    #[arg(short = 'r', long = "registry")]
    pub registry: Option<PathBuf>,
    /// Number of rows to sample for statistics (0 means full scan)
    #[arg(long, default_value_t = crate::stats::DEFAULT_SAMPLE_ROWS)]
    pub sample_rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Output format for the detection result
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct DetectorsArgs {
    /// Registry store with persisted detector configuration (.yml)
    #[arg(short = 'r', long = "registry")]
    pub registry: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Registry store to create or update (.yml)
    #[arg(short = 'r', long = "registry")]
    pub registry: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

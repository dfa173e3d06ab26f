//! CLI argument parsing for wlcgsgas

use crate::query::ReportPeriod;
use crate::source::RowFormat;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "wlcgsgas")]
#[command(version)]
#[command(about = "Transform SGAS accounting rows into WLCG accounting records", long_about = None)]
pub struct Cli {
    /// Row file exported from the accounting query (JSON or CSV)
    #[arg(short = 'r', long = "rows", value_name = "FILE")]
    pub rows: Option<PathBuf>,

    /// Row file format (inferred from the extension by default)
    #[arg(long = "input-format", value_enum)]
    pub input_format: Option<RowFormat>,

    /// Pipeline configuration (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Key fields to collapse, comma separated (e.g. --collapse user,vo_role)
    #[arg(long = "collapse", value_name = "FIELDS", value_delimiter = ',')]
    pub collapse: Option<Vec<String>>,

    /// Factor for filling missing normalized times (default: 1.75)
    #[arg(long = "scale-factor", value_name = "FACTOR")]
    pub scale_factor: Option<f64>,

    /// Period length in days for machine equivalents
    #[arg(long = "days", value_name = "DAYS")]
    pub days: Option<u32>,

    /// Reporting month (YYYY-MM)
    #[arg(short = 'p', long = "period", value_name = "YYYY-MM")]
    pub period: Option<ReportPeriod>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Print the accounting query for --period and exit
    #[arg(long = "print-query", requires = "period")]
    pub print_query: bool,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

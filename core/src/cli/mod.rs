pub mod report;

use crate::config::DEFAULT_CONFIG_DIR;
use crate::types::Modality;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for drlcheck
#[derive(Parser, Debug)]
#[command(name = "drlcheck")]
#[command(about = "Compare exam doses against Diagnostic Reference Levels")]
#[command(version)]
pub struct Cli {
    /// Exam record file (.csv or .json)
    #[arg(value_name = "FILE")]
    pub records: PathBuf,

    /// Modality to compare
    #[arg(short, long)]
    pub modality: ModalityArg,

    /// Directory holding the DRL configuration documents
    #[arg(long, env = "DRL_CONFIG_DIR", default_value = DEFAULT_CONFIG_DIR)]
    pub config_dir: PathBuf,

    /// Earliest study date to include (YYYYMMDD or YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    /// Latest study date to include (YYYYMMDD or YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

/// Modality selection on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModalityArg {
    /// Computed Tomography
    Ct,
    /// X-ray Angiography
    Xa,
    /// Digital Radiography
    Dx,
    /// Mammography
    Mg,
}

impl From<ModalityArg> for Modality {
    fn from(arg: ModalityArg) -> Self {
        match arg {
            ModalityArg::Ct => Modality::Ct,
            ModalityArg::Xa => Modality::Xa,
            ModalityArg::Dx => Modality::Dx,
            ModalityArg::Mg => Modality::Mg,
        }
    }
}

/// clap value parser for study dates
pub fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    crate::ingest::parse_date(value)
        .ok_or_else(|| format!("invalid date '{}' (expected YYYYMMDD or YYYY-MM-DD)", value))
}

//! Command-line interface argument parsing.

use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

/// DRAM - Dynamic Resource Allocation Model
///
/// Aggregates enrolment, demographic-update and biometric-update registers
/// by district, computes the Update-to-Enrolment Ratio (UER), flags
/// outliers and assigns each district a service-delivery zone.
///
/// Examples:
///   dram
///   dram --data-dir ./data --output-dir ./reports
///   dram --no-charts --strict-variance
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory searched recursively for input CSV files (default: .)
    #[arg(short, long, value_name = "DIR", env = "DRAM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory for reports and charts (default: .)
    #[arg(short, long, value_name = "DIR", env = "DRAM_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to a JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Chart pixel density
    #[arg(long, value_name = "DPI")]
    pub dpi: Option<u32>,

    /// Abort when every district has the same UER
    #[arg(long)]
    pub strict_variance: bool,

    /// Enable verbose logging output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}

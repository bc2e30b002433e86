//! Configuration handling.
//!
//! Settings come from built-in defaults, an optional JSON file and
//! command-line overrides, applied in that order.

use crate::cli::Args;
use crate::data::SourceKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Directory searched recursively for source CSV files.
    #[serde(default = "default_dir")]
    pub data_dir: PathBuf,

    /// Directory receiving the reports and charts.
    #[serde(default = "default_dir")]
    pub output_dir: PathBuf,

    /// File name prefixes per source.
    #[serde(default)]
    pub sources: SourcePatterns,

    /// Chart settings.
    #[serde(default)]
    pub charts: ChartConfig,

    /// Abort instead of warning when UER has zero variance.
    #[serde(default)]
    pub strict_variance: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: default_dir(),
            output_dir: default_dir(),
            sources: SourcePatterns::default(),
            charts: ChartConfig::default(),
            strict_variance: false,
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Input file name prefixes. A file matches when its name starts with
/// the prefix and ends in `.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePatterns {
    #[serde(default = "default_enrolment_prefix")]
    pub enrolment: String,
    #[serde(default = "default_demographic_prefix")]
    pub demographic: String,
    #[serde(default = "default_biometric_prefix")]
    pub biometric: String,
}

impl Default for SourcePatterns {
    fn default() -> Self {
        Self {
            enrolment: default_enrolment_prefix(),
            demographic: default_demographic_prefix(),
            biometric: default_biometric_prefix(),
        }
    }
}

impl SourcePatterns {
    pub fn prefix_for(&self, kind: SourceKind) -> &str {
        match kind {
            SourceKind::Enrolment => &self.enrolment,
            SourceKind::Demographic => &self.demographic,
            SourceKind::Biometric => &self.biometric,
        }
    }
}

fn default_enrolment_prefix() -> String {
    "api_data_aadhar_enrolment".to_string()
}

fn default_demographic_prefix() -> String {
    "api_data_aadhar_demographic".to_string()
}

fn default_biometric_prefix() -> String {
    "api_data_aadhar_biometric".to_string()
}

/// Chart rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_charts_enabled")]
    pub enabled: bool,

    /// Pixel density; figure sizes are given in inches.
    #[serde(default = "default_dpi")]
    pub dpi: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: default_charts_enabled(),
            dpi: default_dpi(),
        }
    }
}

fn default_charts_enabled() -> bool {
    true
}

fn default_dpi() -> u32 {
    300
}

impl AnalysisConfig {
    /// Load configuration from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(dir) = &args.data_dir {
            self.data_dir = dir.clone();
        }
        if let Some(dir) = &args.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(dpi) = args.dpi {
            self.charts.dpi = dpi;
        }
        if args.no_charts {
            self.charts.enabled = false;
        }
        if args.strict_variance {
            self.strict_variance = true;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.charts.dpi == 0 {
            anyhow::bail!("charts.dpi must be greater than zero");
        }
        for kind in SourceKind::ALL {
            if self.sources.prefix_for(kind).is_empty() {
                anyhow::bail!("file prefix for {} source must not be empty", kind.label());
            }
        }
        Ok(())
    }
}

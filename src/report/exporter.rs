//! Report Exporter Module
//! Builds report DataFrames and writes them as CSV.

use super::summary::{AnalysisReport, ExecutiveSummary};
use crate::stats::{RegionMetrics, StateTrend};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DISTRICT_REPORT_FILE: &str = "final_district_classification.csv";
pub const ANOMALY_REPORT_FILE: &str = "anomaly_report.csv";
pub const STATE_REPORT_FILE: &str = "state_level_trends.csv";
pub const SUMMARY_REPORT_FILE: &str = "executive_summary.csv";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Writes the four CSV reports.
pub struct ReportExporter;

impl ReportExporter {
    /// One row per district with every metric column.
    pub fn district_frame(metrics: &[RegionMetrics]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Column::new(
                "state".into(),
                metrics.iter().map(|m| m.key().state.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "district".into(),
                metrics.iter().map(|m| m.key().district.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "Enrolments".into(),
                metrics.iter().map(|m| m.enrolments()).collect::<Vec<f64>>(),
            ),
            Column::new(
                "Updates".into(),
                metrics.iter().map(|m| m.updates()).collect::<Vec<f64>>(),
            ),
            Column::new(
                "UER".into(),
                metrics.iter().map(|m| m.uer()).collect::<Vec<f64>>(),
            ),
            Column::new(
                "Youth_Ratio".into(),
                metrics.iter().map(|m| m.youth_ratio()).collect::<Vec<Option<f64>>>(),
            ),
            Column::new(
                "Child_Dependency".into(),
                metrics
                    .iter()
                    .map(|m| m.child_dependency())
                    .collect::<Vec<Option<f64>>>(),
            ),
            Column::new(
                "UER_ZScore".into(),
                metrics.iter().map(|m| m.uer_zscore).collect::<Vec<Option<f64>>>(),
            ),
            Column::new(
                "Is_Anomaly".into(),
                metrics.iter().map(|m| m.is_anomaly).collect::<Vec<bool>>(),
            ),
            Column::new(
                "Zone_Strategy".into(),
                metrics.iter().map(|m| m.zone.label()).collect::<Vec<_>>(),
            ),
            Column::new(
                "Predicted_Trajectory".into(),
                metrics.iter().map(|m| m.trajectory.label()).collect::<Vec<_>>(),
            ),
        ])
    }

    pub fn state_frame(trends: &[StateTrend]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Column::new(
                "state".into(),
                trends.iter().map(|t| t.state.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "UER".into(),
                trends.iter().map(|t| t.mean_uer).collect::<Vec<f64>>(),
            ),
            Column::new(
                "Youth_Ratio".into(),
                trends.iter().map(|t| t.mean_youth_ratio).collect::<Vec<Option<f64>>>(),
            ),
            Column::new(
                "Enrolments".into(),
                trends.iter().map(|t| t.enrolments).collect::<Vec<f64>>(),
            ),
            Column::new(
                "Updates".into(),
                trends.iter().map(|t| t.updates).collect::<Vec<f64>>(),
            ),
            Column::new(
                "State_Classification".into(),
                trends.iter().map(|t| t.classification.label()).collect::<Vec<_>>(),
            ),
        ])
    }

    pub fn summary_frame(summary: &ExecutiveSummary) -> PolarsResult<DataFrame> {
        let count = |name: &str, value: usize| Column::new(name.into(), [value as u64]);

        DataFrame::new(vec![
            count("Total_Districts_Analyzed", summary.total_districts),
            count("Total_States", summary.total_states),
            count("RED_Zone_Districts", summary.red_districts),
            count("YELLOW_Zone_Districts", summary.yellow_districts),
            count("GREEN_Zone_Districts", summary.green_districts),
            count("Anomalies_Detected", summary.anomalies),
            Column::new("Average_UER".into(), [summary.average_uer]),
            Column::new("Median_UER".into(), [summary.median_uer]),
            count(
                "Districts_Expected_to_Transition",
                summary.expected_transitions,
            ),
            Column::new(
                "UER_Variance_Status".into(),
                [summary.variance_status.label()],
            ),
        ])
    }

    /// Build every report frame, then write them all.
    ///
    /// Frames are staged as `*.tmp` files beside their targets and only
    /// renamed into place once every one has been written, so a failure
    /// leaves the previous reports untouched.
    pub fn write_all(report: &AnalysisReport, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
        let mut frames = vec![
            (DISTRICT_REPORT_FILE, Self::district_frame(&report.districts)?),
            (ANOMALY_REPORT_FILE, Self::district_frame(&report.anomalies)?),
            (STATE_REPORT_FILE, Self::state_frame(&report.state_trends)?),
            (SUMMARY_REPORT_FILE, Self::summary_frame(&report.summary)?),
        ];

        fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(frames.len());
        for (name, df) in frames.iter_mut() {
            let target = dir.join(&*name);
            let temp = dir.join(format!("{}.tmp", name));
            if let Err(e) = Self::write_csv(df, &temp) {
                let _ = fs::remove_file(&temp);
                for (temp, _) in &staged {
                    let _ = fs::remove_file(temp);
                }
                return Err(e);
            }
            staged.push((temp, target));
        }

        let mut written = Vec::with_capacity(staged.len());
        for (temp, target) in staged {
            fs::rename(&temp, &target).map_err(|source| ExportError::Io {
                path: target.clone(),
                source,
            })?;
            written.push(target);
        }
        Ok(written)
    }

    /// Overwrite `path` with the frame as CSV.
    pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), ExportError> {
        let mut file = File::create(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        CsvWriter::new(&mut file).include_header(true).finish(df)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::VarianceStatus;

    fn summary() -> ExecutiveSummary {
        ExecutiveSummary {
            total_districts: 3,
            total_states: 2,
            red_districts: 1,
            yellow_districts: 0,
            green_districts: 2,
            anomalies: 0,
            average_uer: 20.5,
            median_uer: 3.25,
            expected_transitions: 1,
            variance_status: VarianceStatus::Ok,
        }
    }

    #[test]
    fn test_summary_frame_is_single_row() {
        let df = ReportExporter::summary_frame(&summary()).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 10);
        assert_eq!(
            df.get_column_names()[0].as_str(),
            "Total_Districts_Analyzed"
        );
    }

    #[test]
    fn test_summary_frame_headers_and_status() {
        let df = ReportExporter::summary_frame(&ExecutiveSummary {
            variance_status: VarianceStatus::ZeroVariance,
            ..summary()
        })
        .unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "Total_Districts_Analyzed",
                "Total_States",
                "RED_Zone_Districts",
                "YELLOW_Zone_Districts",
                "GREEN_Zone_Districts",
                "Anomalies_Detected",
                "Average_UER",
                "Median_UER",
                "Districts_Expected_to_Transition",
                "UER_Variance_Status"
            ]
        );
        let status = df.column("UER_Variance_Status").unwrap().str().unwrap().get(0);
        assert_eq!(status, Some("zero_variance"));
    }

    #[test]
    fn test_empty_district_frame_keeps_header() {
        let df = ReportExporter::district_frame(&[]).unwrap();
        assert_eq!(df.height(), 0);
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "state",
                "district",
                "Enrolments",
                "Updates",
                "UER",
                "Youth_Ratio",
                "Child_Dependency",
                "UER_ZScore",
                "Is_Anomaly",
                "Zone_Strategy",
                "Predicted_Trajectory"
            ]
        );
    }

    #[test]
    fn test_failed_write_keeps_previous_reports() {
        let dir = tempfile::TempDir::new().unwrap();
        let district = dir.path().join(DISTRICT_REPORT_FILE);
        std::fs::write(&district, "previous run\n").unwrap();
        // a directory in the way makes the state report unwritable
        std::fs::create_dir(dir.path().join(format!("{}.tmp", STATE_REPORT_FILE))).unwrap();

        let report = AnalysisReport {
            districts: Vec::new(),
            anomalies: Vec::new(),
            state_trends: Vec::new(),
            summary: summary(),
        };
        let result = ReportExporter::write_all(&report, dir.path());

        assert!(matches!(result, Err(ExportError::Io { .. })));
        assert_eq!(std::fs::read_to_string(&district).unwrap(), "previous run\n");
        assert!(!dir.path().join(ANOMALY_REPORT_FILE).exists());
        assert!(!dir.path().join(SUMMARY_REPORT_FILE).exists());
        assert!(!dir.path().join(format!("{}.tmp", DISTRICT_REPORT_FILE)).exists());
        assert!(!dir.path().join(format!("{}.tmp", ANOMALY_REPORT_FILE)).exists());
    }

    #[test]
    fn test_write_all_leaves_no_staging_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let report = AnalysisReport {
            districts: Vec::new(),
            anomalies: Vec::new(),
            state_trends: Vec::new(),
            summary: summary(),
        };
        let written = ReportExporter::write_all(&report, dir.path()).unwrap();
        assert_eq!(written.len(), 4);

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                ANOMALY_REPORT_FILE,
                SUMMARY_REPORT_FILE,
                DISTRICT_REPORT_FILE,
                STATE_REPORT_FILE
            ]
        );
    }

    #[test]
    fn test_write_csv_overwrites() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(SUMMARY_REPORT_FILE);
        std::fs::write(&path, "stale,content\n1,2\n3,4\n").unwrap();

        let mut df = ReportExporter::summary_frame(&summary()).unwrap();
        ReportExporter::write_csv(&mut df, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Total_Districts_Analyzed,Total_States,"));
        assert!(!text.contains("stale"));
        assert_eq!(text.lines().count(), 2);
    }
}

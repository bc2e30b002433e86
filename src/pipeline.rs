//! Analysis pipeline.
//!
//! Stages run strictly in order: ingest, aggregate, metrics, anomalies,
//! zones, trends, export, charts. Each computational stage takes immutable
//! input and returns new values; progress is reported to an injected
//! [`PipelineObserver`].

use crate::charts::ChartRenderer;
use crate::config::AnalysisConfig;
use crate::data::{Aggregator, DataLoader, LoaderError, SourceTables};
use crate::report::{AnalysisReport, ExecutiveSummary, ExportError, ReportExporter, VarianceStatus};
use crate::stats::{AnomalyDetector, AnomalyError, MetricEngine, RegionMetrics, RegionRatios, StateRollup};
use crate::zones::{ZoneClassifier, ZoneStrategy};
use polars::prelude::PolarsError;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("Aggregation failed: {0}")]
    Aggregation(#[from] PolarsError),
    #[error("No district with a valid state/district key")]
    NoRegions,
    #[error("Anomaly detection failed: {0}")]
    Anomaly(#[from] AnomalyError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Aggregate,
    Metrics,
    Anomalies,
    Zones,
    Trends,
    Export,
    Charts,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingest => "Ingesting multi-source data",
            Stage::Aggregate => "Aggregating districts",
            Stage::Metrics => "Calculating UER and demographic indicators",
            Stage::Anomalies => "Detecting anomalies",
            Stage::Zones => "Classifying zones and trajectories",
            Stage::Trends => "Analyzing state-level trends",
            Stage::Export => "Exporting reports",
            Stage::Charts => "Rendering charts",
        };
        f.write_str(name)
    }
}

/// Receives progress from the pipeline.
pub trait PipelineObserver {
    fn stage_started(&mut self, _stage: Stage) {}
    fn stage_completed(&mut self, _stage: Stage, _detail: &str) {}
    fn warning(&mut self, _stage: Stage, _message: &str) {}
}

/// Reports progress through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn stage_started(&mut self, stage: Stage) {
        info!("{}...", stage);
    }

    fn stage_completed(&mut self, _stage: Stage, detail: &str) {
        info!("  ✓ {}", detail);
    }

    fn warning(&mut self, stage: Stage, message: &str) {
        warn!("[{}] {}", stage, message);
    }
}

/// Discards progress.
#[derive(Debug, Default)]
pub struct SilentObserver;

impl PipelineObserver for SilentObserver {}

/// Files produced by a run.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub reports: Vec<PathBuf>,
    pub charts: Vec<PathBuf>,
}

/// Runs the analysis for one configuration.
pub struct Pipeline<'a, O: PipelineObserver> {
    config: &'a AnalysisConfig,
    observer: O,
}

impl<'a, O: PipelineObserver> Pipeline<'a, O> {
    pub fn new(config: &'a AnalysisConfig, observer: O) -> Self {
        Self { config, observer }
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Load, analyse, export and render.
    pub fn run(&mut self) -> Result<(AnalysisReport, RunOutput), PipelineError> {
        let tables = self.load()?;
        let report = self.analyze(&tables)?;
        let reports = self.export(&report)?;
        let charts = self.render_charts(&report);
        Ok((report, RunOutput { reports, charts }))
    }

    pub fn load(&mut self) -> Result<SourceTables, PipelineError> {
        self.observer.stage_started(Stage::Ingest);
        let loader = DataLoader::new(&self.config.data_dir, self.config.sources.clone());
        let tables = loader.load_all()?;

        for table in [&tables.enrolment, &tables.demographic, &tables.biometric] {
            self.observer.stage_completed(
                Stage::Ingest,
                &format!(
                    "Loaded {} {} records from {} files",
                    table.row_count(),
                    table.kind.label(),
                    table.files.len()
                ),
            );
        }
        Ok(tables)
    }

    /// Compute every report table from loaded sources. Writes nothing.
    pub fn analyze(&mut self, tables: &SourceTables) -> Result<AnalysisReport, PipelineError> {
        self.observer.stage_started(Stage::Aggregate);
        let aggregates = Aggregator::aggregate(tables)?;
        if aggregates.is_empty() {
            return Err(PipelineError::NoRegions);
        }
        let states: BTreeSet<&str> = aggregates.iter().map(|a| a.key.state.as_str()).collect();
        let enrolment_only = aggregates.iter().filter(|a| !a.has_update_rows).count();
        let update_only = aggregates.iter().filter(|a| !a.has_enrolment_rows).count();
        self.observer.stage_completed(
            Stage::Aggregate,
            &format!(
                "Analyzed {} districts across {} states ({} without update rows, {} without enrolment rows)",
                aggregates.len(),
                states.len(),
                enrolment_only,
                update_only
            ),
        );

        self.observer.stage_started(Stage::Metrics);
        let ratios = MetricEngine::compute_all(aggregates);
        let undefined_youth = ratios.iter().filter(|r| r.youth_ratio.is_none()).count();
        self.observer.stage_completed(
            Stage::Metrics,
            &format!("Added UER, Youth Ratio and Child Dependency ({} districts without a youth ratio)", undefined_youth),
        );

        self.observer.stage_started(Stage::Anomalies);
        let (zscores, variance_status) = self.score(&ratios)?;
        let flagged = zscores
            .iter()
            .flatten()
            .filter(|z| AnomalyDetector::is_anomaly(**z))
            .count();
        self.observer.stage_completed(
            Stage::Anomalies,
            &format!("Detected {} statistical anomalies (|Z-score| > 2.5)", flagged),
        );

        self.observer.stage_started(Stage::Zones);
        let districts = Self::classify(ratios, zscores);
        let anomalies = AnomalyDetector::anomaly_report(&districts);
        let transitions = districts.iter().filter(|m| m.trajectory.is_transition()).count();
        let zone_counts: Vec<String> = ZoneStrategy::ALL
            .iter()
            .map(|zone| {
                let count = districts.iter().filter(|m| m.zone == *zone).count();
                format!("{} {}", count, zone.short_name())
            })
            .collect();
        self.observer.stage_completed(
            Stage::Zones,
            &format!(
                "{}; {} districts likely to transition",
                zone_counts.join(", "),
                transitions
            ),
        );

        self.observer.stage_started(Stage::Trends);
        let state_trends = StateRollup::compute(&districts);
        let summary = ExecutiveSummary::build(&districts, anomalies.len(), variance_status);
        self.observer.stage_completed(
            Stage::Trends,
            &format!(
                "{} state trends; average UER {:.2}",
                state_trends.len(),
                summary.average_uer
            ),
        );

        Ok(AnalysisReport {
            districts,
            anomalies,
            state_trends,
            summary,
        })
    }

    /// Z-scores of UER, or `None` per district when variance is zero.
    fn score(
        &mut self,
        ratios: &[RegionRatios],
    ) -> Result<(Vec<Option<f64>>, VarianceStatus), PipelineError> {
        let uers: Vec<f64> = ratios.iter().map(|r| r.uer).collect();
        match AnomalyDetector::zscores(&uers) {
            Ok(z) => Ok((z.into_iter().map(Some).collect(), VarianceStatus::Ok)),
            Err(e @ AnomalyError::ZeroVariance { .. }) if !self.config.strict_variance => {
                self.observer.warning(
                    Stage::Anomalies,
                    &format!("{}; z-scores left empty and no anomalies flagged", e),
                );
                Ok((vec![None; ratios.len()], VarianceStatus::ZeroVariance))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn classify(ratios: Vec<RegionRatios>, zscores: Vec<Option<f64>>) -> Vec<RegionMetrics> {
        ratios
            .into_iter()
            .zip(zscores)
            .map(|(ratios, uer_zscore)| {
                let zone = ZoneClassifier::classify(ratios.uer);
                let trajectory = ZoneClassifier::predict_trajectory(zone, ratios.youth_ratio, ratios.uer);
                RegionMetrics {
                    is_anomaly: uer_zscore.is_some_and(AnomalyDetector::is_anomaly),
                    uer_zscore,
                    zone,
                    trajectory,
                    ratios,
                }
            })
            .collect()
    }

    pub fn export(&mut self, report: &AnalysisReport) -> Result<Vec<PathBuf>, PipelineError> {
        self.observer.stage_started(Stage::Export);
        let written = ReportExporter::write_all(report, &self.config.output_dir)?;
        for path in &written {
            self.observer
                .stage_completed(Stage::Export, &format!("Saved: {}", path.display()));
        }
        Ok(written)
    }

    /// Render charts if enabled. Failures are reported and skipped.
    pub fn render_charts(&mut self, report: &AnalysisReport) -> Vec<PathBuf> {
        if !self.config.charts.enabled {
            return Vec::new();
        }

        self.observer.stage_started(Stage::Charts);
        let renderer = ChartRenderer::new(self.config.charts.dpi);
        let mut rendered = Vec::new();
        for result in renderer.render_all(report, &self.config.output_dir) {
            match result {
                Ok(path) => rendered.push(path),
                Err(e) => self.observer.warning(Stage::Charts, &e.to_string()),
            }
        }
        self.observer.stage_completed(
            Stage::Charts,
            &format!("Generated {} visualizations ({} DPI)", rendered.len(), self.config.charts.dpi),
        );
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SourceKind, SourceTable};
    use crate::zones::Trajectory;
    use polars::prelude::*;

    #[derive(Debug, PartialEq)]
    enum Event {
        Started(Stage),
        Completed(Stage),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
        warnings: Vec<String>,
    }

    impl PipelineObserver for Recorder {
        fn stage_started(&mut self, stage: Stage) {
            self.events.push(Event::Started(stage));
        }

        fn stage_completed(&mut self, stage: Stage, _detail: &str) {
            self.events.push(Event::Completed(stage));
        }

        fn warning(&mut self, _stage: Stage, message: &str) {
            self.warnings.push(message.to_string());
        }
    }

    fn tables(enrolment: DataFrame, demographic: Option<DataFrame>) -> SourceTables {
        let demographic = match demographic {
            Some(df) => SourceTable::from_frame(SourceKind::Demographic, df).unwrap(),
            None => SourceTable::empty(SourceKind::Demographic),
        };
        SourceTables::new(
            SourceTable::from_frame(SourceKind::Enrolment, enrolment).unwrap(),
            demographic,
            SourceTable::empty(SourceKind::Biometric),
        )
        .unwrap()
    }

    #[test]
    fn test_reference_district_end_to_end() {
        let tables = tables(
            df!(
                "state" => ["A"],
                "district" => ["X"],
                "age_0_5" => [10i64],
                "age_5_17" => [20i64],
                "age_18_greater" => [70i64]
            )
            .unwrap(),
            Some(df!("state" => ["A"], "district" => ["X"], "age_update_col" => [600i64]).unwrap()),
        );

        let config = AnalysisConfig::default();
        let mut pipeline = Pipeline::new(&config, Recorder::default());
        let report = pipeline.analyze(&tables).unwrap();

        assert_eq!(report.districts.len(), 1);
        let x = &report.districts[0];
        assert_eq!(x.enrolments(), 100.0);
        assert_eq!(x.updates(), 600.0);
        assert_eq!(x.uer(), 600.0 / 101.0);
        assert_eq!(x.zone, ZoneStrategy::Green);
        assert_eq!(x.youth_ratio(), Some(0.3));
        assert_eq!(x.trajectory, Trajectory::Stable);

        // a single district has no spread
        assert_eq!(x.uer_zscore, None);
        assert!(!x.is_anomaly);
        assert_eq!(report.summary.variance_status, VarianceStatus::ZeroVariance);
        assert_eq!(report.state_trends[0].mean_uer, x.uer());

        let recorder = pipeline.into_observer();
        assert_eq!(recorder.warnings.len(), 1);
        let expected: Vec<Event> = [
            Stage::Aggregate,
            Stage::Metrics,
            Stage::Anomalies,
            Stage::Zones,
            Stage::Trends,
        ]
        .into_iter()
        .flat_map(|stage| [Event::Started(stage), Event::Completed(stage)])
        .collect();
        assert_eq!(recorder.events, expected);
    }

    #[test]
    fn test_strict_variance_aborts() {
        let tables = tables(
            df!(
                "state" => ["A", "A"],
                "district" => ["X", "Y"],
                "age_0_5" => [1i64, 1],
                "age_5_17" => [1i64, 1],
                "age_18_greater" => [1i64, 1]
            )
            .unwrap(),
            None,
        );

        let config = AnalysisConfig {
            strict_variance: true,
            ..AnalysisConfig::default()
        };
        let result = Pipeline::new(&config, SilentObserver).analyze(&tables);
        assert!(matches!(
            result,
            Err(PipelineError::Anomaly(AnomalyError::ZeroVariance { count: 2, .. }))
        ));
    }

    #[test]
    fn test_enrolment_only_district_is_green_with_zero_uer() {
        let tables = tables(
            df!(
                "state" => ["A", "A"],
                "district" => ["X", "Y"],
                "age_0_5" => [5i64, 1],
                "age_5_17" => [5i64, 1],
                "age_18_greater" => [90i64, 1]
            )
            .unwrap(),
            Some(df!("state" => ["A"], "district" => ["Y"], "demo_age_17_" => [400i64]).unwrap()),
        );

        let config = AnalysisConfig::default();
        let report = Pipeline::new(&config, SilentObserver).analyze(&tables).unwrap();
        let x = &report.districts[0];
        assert_eq!(x.key().district, "X");
        assert_eq!(x.updates(), 0.0);
        assert_eq!(x.uer(), 0.0);
        assert_eq!(x.zone, ZoneStrategy::Green);
        assert_eq!(report.summary.variance_status, VarianceStatus::Ok);

        let y = &report.districts[1];
        assert_eq!(y.uer(), 100.0);
        assert_eq!(y.zone, ZoneStrategy::Red);
    }

    #[test]
    fn test_outlier_flagged_and_reported() {
        let n = 20;
        let mut states = vec!["S"; n];
        let mut districts: Vec<String> = (0..n).map(|i| format!("d{:02}", i)).collect();
        states.push("T");
        districts.push("outlier".to_string());

        let ones = vec![1i64; n + 1];
        let enrolment = df!(
            "state" => states.clone(),
            "district" => districts.clone(),
            "age_0_5" => ones.clone(),
            "age_5_17" => ones.clone(),
            "age_18_greater" => ones
        )
        .unwrap();

        let mut updates = vec![4i64; n];
        updates.push(4000);
        let demographic = df!(
            "state" => states,
            "district" => districts,
            "demo_age_17_" => updates
        )
        .unwrap();

        let config = AnalysisConfig::default();
        let report = Pipeline::new(&config, SilentObserver)
            .analyze(&tables(enrolment, Some(demographic)))
            .unwrap();

        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].key().district, "outlier");
        assert!(report.anomalies[0].uer_zscore.unwrap() > 2.5);
        assert_eq!(report.summary.anomalies, 1);
        assert_eq!(report.summary.total_states, 2);
        assert_eq!(report.state_trends.len(), 2);
    }
}

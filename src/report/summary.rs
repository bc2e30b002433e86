//! Report Summary Module
//! The complete analysis result, the executive summary row and console insights.

use crate::stats::{RegionMetrics, StateTrend, StatsCalculator};
use crate::zones::ZoneStrategy;
use std::collections::BTreeSet;
use tracing::info;

/// Number of districts in the priority list and chart.
pub const TOP_PRIORITY_COUNT: usize = 5;

/// Whether z-scores could be computed for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarianceStatus {
    Ok,
    ZeroVariance,
}

impl VarianceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VarianceStatus::Ok => "ok",
            VarianceStatus::ZeroVariance => "zero_variance",
        }
    }
}

/// Single-row run summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutiveSummary {
    pub total_districts: usize,
    pub total_states: usize,
    pub red_districts: usize,
    pub yellow_districts: usize,
    pub green_districts: usize,
    pub anomalies: usize,
    pub average_uer: f64,
    pub median_uer: f64,
    pub expected_transitions: usize,
    pub variance_status: VarianceStatus,
}

impl ExecutiveSummary {
    pub fn build(
        districts: &[RegionMetrics],
        anomaly_count: usize,
        variance_status: VarianceStatus,
    ) -> Self {
        let uers: Vec<f64> = districts.iter().map(|m| m.uer()).collect();
        let stats = StatsCalculator::describe(&uers);
        let states: BTreeSet<&str> = districts.iter().map(|m| m.key().state.as_str()).collect();

        Self {
            total_districts: districts.len(),
            total_states: states.len(),
            red_districts: zone_count(districts, ZoneStrategy::Red),
            yellow_districts: zone_count(districts, ZoneStrategy::Yellow),
            green_districts: zone_count(districts, ZoneStrategy::Green),
            anomalies: anomaly_count,
            average_uer: StatsCalculator::round2(stats.mean),
            median_uer: StatsCalculator::round2(stats.median),
            expected_transitions: districts
                .iter()
                .filter(|m| m.trajectory.is_transition())
                .count(),
            variance_status,
        }
    }
}

/// Everything one run produces, ready for export.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Ordered by region key.
    pub districts: Vec<RegionMetrics>,
    /// UER descending.
    pub anomalies: Vec<RegionMetrics>,
    /// Ordered by state.
    pub state_trends: Vec<StateTrend>,
    pub summary: ExecutiveSummary,
}

impl AnalysisReport {
    /// RED districts with the highest UER, at most `limit`.
    pub fn top_priority(&self, limit: usize) -> Vec<&RegionMetrics> {
        let mut red: Vec<&RegionMetrics> = self
            .districts
            .iter()
            .filter(|m| m.zone == ZoneStrategy::Red)
            .collect();
        red.sort_by(|a, b| b.uer().total_cmp(&a.uer()));
        red.truncate(limit);
        red
    }

    /// District count per zone in RED, YELLOW, GREEN order.
    pub fn zone_distribution(&self) -> Vec<(ZoneStrategy, usize)> {
        ZoneStrategy::ALL
            .iter()
            .map(|zone| (*zone, zone_count(&self.districts, *zone)))
            .collect()
    }

    /// Log the headline findings.
    pub fn log_key_insights(&self) {
        let total = self.districts.len().max(1) as f64;
        for (zone, count) in self.zone_distribution() {
            info!(
                "{}: {} districts ({:.1}%)",
                zone.label(),
                count,
                count as f64 / total * 100.0
            );
        }

        for (rank, m) in self.anomalies.iter().take(3).enumerate() {
            info!(
                "Anomaly #{}: {} UER = {:.1} (z = {:.2})",
                rank + 1,
                m.key(),
                m.uer(),
                m.uer_zscore.unwrap_or(f64::NAN)
            );
        }

        for (rank, m) in self.top_priority(TOP_PRIORITY_COUNT).iter().enumerate() {
            let youth = m
                .youth_ratio()
                .map(|r| format!("{:.2}%", r * 100.0))
                .unwrap_or_else(|| "n/a".to_string());
            info!(
                "Priority #{}: {} UER = {:.1}, youth ratio {}, {}",
                rank + 1,
                m.key(),
                m.uer(),
                youth,
                m.trajectory
            );
        }

        info!(
            "{} districts need Express Update Centers; {} expected to transition",
            self.summary.red_districts, self.summary.expected_transitions
        );
        info!(
            "Average UER {:.2}, median UER {:.2}",
            self.summary.average_uer, self.summary.median_uer
        );
    }
}

fn zone_count(districts: &[RegionMetrics], zone: ZoneStrategy) -> usize {
    districts.iter().filter(|m| m.zone == zone).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EnrolmentBrackets, RegionAggregate, RegionKey};
    use crate::stats::{MetricEngine, RegionRatios};
    use crate::zones::{Trajectory, ZoneClassifier};

    fn metric(state: &str, district: &str, uer: f64, youth: Option<f64>) -> RegionMetrics {
        let zone = ZoneClassifier::classify(uer);
        RegionMetrics {
            ratios: RegionRatios {
                aggregate: RegionAggregate {
                    key: RegionKey::new(state, district),
                    enrolments: 0.0,
                    updates: uer,
                    brackets: EnrolmentBrackets::default(),
                    has_enrolment_rows: false,
                    has_update_rows: true,
                },
                uer: MetricEngine::uer(uer, 0.0),
                youth_ratio: youth,
                child_dependency: None,
            },
            uer_zscore: None,
            is_anomaly: false,
            zone,
            trajectory: ZoneClassifier::predict_trajectory(zone, youth, uer),
        }
    }

    fn report(districts: Vec<RegionMetrics>) -> AnalysisReport {
        let summary = ExecutiveSummary::build(&districts, 0, VarianceStatus::Ok);
        AnalysisReport {
            districts,
            anomalies: Vec::new(),
            state_trends: Vec::new(),
            summary,
        }
    }

    #[test]
    fn test_summary_counts() {
        let districts = vec![
            metric("A", "a", 80.0, None),
            metric("A", "b", 30.0, Some(0.5)),
            metric("B", "c", 10.0, Some(0.1)),
            metric("C", "d", 4.0, Some(0.6)),
        ];
        let summary = ExecutiveSummary::build(&districts, 1, VarianceStatus::Ok);

        assert_eq!(summary.total_districts, 4);
        assert_eq!(summary.total_states, 3);
        assert_eq!(summary.red_districts, 1);
        assert_eq!(summary.yellow_districts, 1);
        assert_eq!(summary.green_districts, 2);
        assert_eq!(
            summary.red_districts + summary.yellow_districts + summary.green_districts,
            summary.total_districts
        );
        assert_eq!(summary.anomalies, 1);
        assert_eq!(summary.average_uer, 31.0);
        assert_eq!(summary.median_uer, 20.0);
        // b -> RED, c -> YELLOW
        assert_eq!(summary.expected_transitions, 2);
    }

    #[test]
    fn test_top_priority_is_red_only_sorted_and_capped() {
        let mut districts: Vec<RegionMetrics> = (0..7)
            .map(|i| metric("S", &format!("r{}", i), 51.0 + i as f64, None))
            .collect();
        districts.push(metric("S", "yellow", 40.0, None));

        let report = report(districts);
        let top: Vec<&str> = report
            .top_priority(TOP_PRIORITY_COUNT)
            .iter()
            .map(|m| m.key().district.as_str())
            .collect();
        assert_eq!(top, vec!["r6", "r5", "r4", "r3", "r2"]);
    }

    #[test]
    fn test_zone_distribution_order() {
        let report = report(vec![metric("S", "g", 1.0, None), metric("S", "r", 99.0, None)]);
        assert_eq!(
            report.zone_distribution(),
            vec![
                (ZoneStrategy::Red, 1),
                (ZoneStrategy::Yellow, 0),
                (ZoneStrategy::Green, 1)
            ]
        );
    }

    #[test]
    fn test_trajectory_is_derived_for_fixture() {
        assert_eq!(metric("S", "x", 30.0, None).trajectory, Trajectory::ToRed);
    }
}

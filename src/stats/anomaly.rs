//! Anomaly Detector Module
//! Population z-scores of UER and the sorted anomaly report.

use super::calculator::StatsCalculator;
use super::metrics::RegionMetrics;
use thiserror::Error;

/// Regions with |z| strictly above this are anomalies.
pub const ANOMALY_Z_THRESHOLD: f64 = 2.5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnomalyError {
    #[error("Cannot compute z-scores of an empty column")]
    Empty,
    #[error("UER has zero variance across {count} regions (every value is {value})")]
    ZeroVariance { count: usize, value: f64 },
    #[error("UER is not finite for {count} of {total} regions")]
    NonFinite { count: usize, total: usize },
}

/// Z-score based outlier detection.
pub struct AnomalyDetector;

impl AnomalyDetector {
    /// `(x - mean) / population_std` for each value.
    ///
    /// A constant column (including a single value) has no defined
    /// z-scores and is reported as `ZeroVariance`. Infinite or NaN inputs
    /// are `NonFinite`.
    pub fn zscores(values: &[f64]) -> Result<Vec<f64>, AnomalyError> {
        if values.is_empty() {
            return Err(AnomalyError::Empty);
        }
        let non_finite = values.iter().filter(|v| !v.is_finite()).count();
        if non_finite > 0 {
            return Err(AnomalyError::NonFinite {
                count: non_finite,
                total: values.len(),
            });
        }

        let stats = StatsCalculator::describe(values);
        if stats.is_constant() {
            return Err(AnomalyError::ZeroVariance {
                count: stats.count,
                value: stats.min,
            });
        }

        Ok(values.iter().map(|v| (v - stats.mean) / stats.std).collect())
    }

    pub fn is_anomaly(zscore: f64) -> bool {
        zscore.abs() > ANOMALY_Z_THRESHOLD
    }

    /// Flagged regions, UER descending. Ties keep input order.
    pub fn anomaly_report(metrics: &[RegionMetrics]) -> Vec<RegionMetrics> {
        let mut anomalies: Vec<RegionMetrics> =
            metrics.iter().filter(|m| m.is_anomaly).cloned().collect();
        anomalies.sort_by(|a, b| b.uer().total_cmp(&a.uer()));
        anomalies
    }
}

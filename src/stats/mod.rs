//! Stats module - demand ratios, outliers and state rollups

mod anomaly;
mod calculator;
mod metrics;
mod rollup;

pub use anomaly::{AnomalyDetector, AnomalyError, ANOMALY_Z_THRESHOLD};
pub use calculator::{ColumnStats, StatsCalculator};
pub use metrics::{
    MetricEngine, RegionMetrics, RegionRatios, CHILD_DEPENDENCY_OFFSET, UER_DENOMINATOR_OFFSET,
};
pub use rollup::{StateRollup, StateTrend};

//! State Rollup Module
//! Re-aggregates district metrics to state-level trends.

use super::calculator::StatsCalculator;
use super::metrics::RegionMetrics;
use crate::zones::{ZoneClassifier, ZoneStrategy};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Summary trend for one state.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTrend {
    pub state: String,
    pub mean_uer: f64,
    /// Mean over districts with a defined youth ratio.
    pub mean_youth_ratio: Option<f64>,
    pub enrolments: f64,
    pub updates: f64,
    pub classification: ZoneStrategy,
}

pub struct StateRollup;

impl StateRollup {
    /// One trend per state, ordered by state name.
    pub fn compute(metrics: &[RegionMetrics]) -> Vec<StateTrend> {
        let mut by_state: BTreeMap<&str, Vec<&RegionMetrics>> = BTreeMap::new();
        for m in metrics {
            by_state.entry(m.key().state.as_str()).or_default().push(m);
        }

        by_state
            .into_iter()
            .map(|(state, districts)| {
                let mean_uer = districts.iter().map(|m| m.uer()).mean();
                StateTrend {
                    state: state.to_string(),
                    mean_uer,
                    mean_youth_ratio: StatsCalculator::mean_of_present(
                        districts.iter().map(|m| m.youth_ratio()),
                    ),
                    enrolments: districts.iter().map(|m| m.enrolments()).sum(),
                    updates: districts.iter().map(|m| m.updates()).sum(),
                    classification: ZoneClassifier::classify(mean_uer),
                }
            })
            .collect()
    }
}

//! Metric Engine Module
//! Per-region demand ratios and the final per-region record.

use crate::data::{EnrolmentBrackets, RegionAggregate, RegionKey};
use crate::zones::{Trajectory, ZoneStrategy};

/// Added to enrolments so UER is defined for regions without enrolments.
pub const UER_DENOMINATOR_OFFSET: f64 = 1.0;
/// Added to the adult bracket so child dependency is always defined.
pub const CHILD_DEPENDENCY_OFFSET: f64 = 1.0;

/// Aggregate with its derived ratios attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRatios {
    pub aggregate: RegionAggregate,
    pub uer: f64,
    pub youth_ratio: Option<f64>,
    pub child_dependency: Option<f64>,
}

/// Final per-district record.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMetrics {
    pub ratios: RegionRatios,
    /// `None` when UER had zero variance.
    pub uer_zscore: Option<f64>,
    pub is_anomaly: bool,
    pub zone: ZoneStrategy,
    pub trajectory: Trajectory,
}

impl RegionMetrics {
    pub fn key(&self) -> &RegionKey {
        &self.ratios.aggregate.key
    }

    pub fn uer(&self) -> f64 {
        self.ratios.uer
    }

    pub fn enrolments(&self) -> f64 {
        self.ratios.aggregate.enrolments
    }

    pub fn updates(&self) -> f64 {
        self.ratios.aggregate.updates
    }

    pub fn youth_ratio(&self) -> Option<f64> {
        self.ratios.youth_ratio
    }

    pub fn child_dependency(&self) -> Option<f64> {
        self.ratios.child_dependency
    }
}

/// Computes demand ratios from aggregates.
pub struct MetricEngine;

impl MetricEngine {
    /// Update-to-Enrolment Ratio: `updates / (enrolments + 1)`.
    pub fn uer(updates: f64, enrolments: f64) -> f64 {
        updates / (enrolments + UER_DENOMINATOR_OFFSET)
    }

    /// Share of the enrolled population under 18; undefined for an empty population.
    pub fn youth_ratio(brackets: &EnrolmentBrackets) -> Option<f64> {
        let total = brackets.total();
        if total > 0.0 {
            Some(brackets.youth() / total)
        } else {
            None
        }
    }

    /// `age_0_5 / (age_18_greater + 1)`, undefined without enrolment rows.
    pub fn child_dependency(aggregate: &RegionAggregate) -> Option<f64> {
        aggregate.has_enrolment_rows.then(|| {
            aggregate.brackets.age_0_5 / (aggregate.brackets.age_18_greater + CHILD_DEPENDENCY_OFFSET)
        })
    }

    pub fn compute(aggregate: RegionAggregate) -> RegionRatios {
        RegionRatios {
            uer: Self::uer(aggregate.updates, aggregate.enrolments),
            youth_ratio: Self::youth_ratio(&aggregate.brackets),
            child_dependency: Self::child_dependency(&aggregate),
            aggregate,
        }
    }

    pub fn compute_all(aggregates: Vec<RegionAggregate>) -> Vec<RegionRatios> {
        aggregates.into_iter().map(Self::compute).collect()
    }
}

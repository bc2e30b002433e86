//! Region Types
//! Region keys and per-region aggregates shared by every pipeline stage.

use std::fmt;

/// Administrative region identified by (state, district).
///
/// Ordering is by state, then district. This is the canonical row order
/// of every district-level report.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionKey {
    pub state: String,
    pub district: String,
}

impl RegionKey {
    pub fn new(state: impl Into<String>, district: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            district: district.into(),
        }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.district, self.state)
    }
}

/// Enrolment counts for one region, split by age bracket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnrolmentBrackets {
    pub age_0_5: f64,
    pub age_5_17: f64,
    pub age_18_greater: f64,
}

impl EnrolmentBrackets {
    /// Sum of the three brackets.
    pub fn total(&self) -> f64 {
        self.age_0_5 + self.age_5_17 + self.age_18_greater
    }

    /// Enrolled population under 18.
    pub fn youth(&self) -> f64 {
        self.age_0_5 + self.age_5_17
    }
}

/// Per-region totals after the outer-union merge of all sources.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionAggregate {
    pub key: RegionKey,
    pub enrolments: f64,
    pub updates: f64,
    pub brackets: EnrolmentBrackets,
    /// Region had at least one enrolment row.
    pub has_enrolment_rows: bool,
    /// Region had at least one demographic or biometric update row.
    pub has_update_rows: bool,
}

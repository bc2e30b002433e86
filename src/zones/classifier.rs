//! Zone Classifier Module
//! Maps UER to a service-delivery zone and predicts zone trajectories.

use std::fmt;

/// UER strictly above this is RED.
pub const RED_UER_THRESHOLD: f64 = 50.0;
/// UER strictly above this (and not RED) is YELLOW.
pub const YELLOW_UER_THRESHOLD: f64 = 15.0;
/// GREEN districts with a youth ratio strictly below this are expected to turn YELLOW.
pub const YOUTH_TRANSITION_THRESHOLD: f64 = 0.3;
/// YELLOW districts with UER strictly above this are expected to turn RED.
pub const RED_TRANSITION_UER: f64 = 25.0;

/// Service-delivery strategy tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ZoneStrategy {
    Red,
    Yellow,
    Green,
}

impl ZoneStrategy {
    pub const ALL: [ZoneStrategy; 3] = [ZoneStrategy::Red, ZoneStrategy::Yellow, ZoneStrategy::Green];

    /// Full label as written to the reports.
    pub fn label(&self) -> &'static str {
        match self {
            ZoneStrategy::Red => "RED: Express Update Hub",
            ZoneStrategy::Yellow => "YELLOW: Hybrid Center",
            ZoneStrategy::Green => "GREEN: Enrolment Van",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            ZoneStrategy::Red => "RED",
            ZoneStrategy::Yellow => "YELLOW",
            ZoneStrategy::Green => "GREEN",
        }
    }
}

impl fmt::Display for ZoneStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Expected movement of a district between zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trajectory {
    ToYellow,
    ToRed,
    StableRed,
    Stable,
}

impl Trajectory {
    pub fn label(&self) -> &'static str {
        match self {
            Trajectory::ToYellow => "Will transition to YELLOW within 3-5 years",
            Trajectory::ToRed => "Will transition to RED within 2-3 years",
            Trajectory::StableRed => "Stable RED zone - long-term update demand",
            Trajectory::Stable => "Stable in current zone",
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, Trajectory::ToYellow | Trajectory::ToRed)
    }
}

impl fmt::Display for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Threshold classifier for zones and trajectories.
pub struct ZoneClassifier;

impl ZoneClassifier {
    /// Total over UER; thresholds are exclusive on the lower side.
    pub fn classify(uer: f64) -> ZoneStrategy {
        if uer > RED_UER_THRESHOLD {
            ZoneStrategy::Red
        } else if uer > YELLOW_UER_THRESHOLD {
            ZoneStrategy::Yellow
        } else {
            ZoneStrategy::Green
        }
    }

    /// First matching rule wins. An unknown youth ratio never triggers
    /// the GREEN to YELLOW transition.
    pub fn predict_trajectory(zone: ZoneStrategy, youth_ratio: Option<f64>, uer: f64) -> Trajectory {
        match zone {
            ZoneStrategy::Green
                if youth_ratio.is_some_and(|ratio| ratio < YOUTH_TRANSITION_THRESHOLD) =>
            {
                Trajectory::ToYellow
            }
            ZoneStrategy::Yellow if uer > RED_TRANSITION_UER => Trajectory::ToRed,
            ZoneStrategy::Red => Trajectory::StableRed,
            _ => Trajectory::Stable,
        }
    }
}

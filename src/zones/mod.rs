//! Zones module - UER zoning and trajectory rules

mod classifier;

pub use classifier::{
    Trajectory, ZoneClassifier, ZoneStrategy, RED_TRANSITION_UER, RED_UER_THRESHOLD,
    YELLOW_UER_THRESHOLD, YOUTH_TRANSITION_THRESHOLD,
};

//! Charts module - PNG chart rendering

mod renderer;

pub use renderer::{
    log_axis_range, padded_range, zone_color, ChartError, ChartRenderer, ANOMALY_CHART,
    DEMOGRAPHIC_CHART, ENROLMENT_UPDATE_CHART, TOP_RED_CHART, ZONE_DISTRIBUTION_CHART,
};

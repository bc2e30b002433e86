//! Data module - source CSV loading and region aggregation

mod aggregator;
mod loader;
mod region;

pub use aggregator::Aggregator;
pub use loader::{
    DataLoader, LoaderError, SourceKind, SourceTable, SourceTables, DISTRICT_COL,
    ENROLMENT_COLUMNS, STATE_COL, UPDATE_COLUMN_MARKER,
};
pub use region::{EnrolmentBrackets, RegionAggregate, RegionKey};

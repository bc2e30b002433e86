//! DRAM - Dynamic Resource Allocation Model
//!
//! Turns raw enrolment and update CSV exports into district demand metrics,
//! zone classifications and report files.

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod zones;

//! Report module - analysis results and CSV export

mod exporter;
mod summary;

pub use exporter::{
    ExportError, ReportExporter, ANOMALY_REPORT_FILE, DISTRICT_REPORT_FILE, STATE_REPORT_FILE,
    SUMMARY_REPORT_FILE,
};
pub use summary::{AnalysisReport, ExecutiveSummary, VarianceStatus, TOP_PRIORITY_COUNT};

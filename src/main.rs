//! DRAM - Dynamic Resource Allocation Model
//!
//! Command-line entry point. Runs the full analysis and writes the
//! CSV reports and charts to the output directory.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Configuration, input or export failure

use anyhow::Result;
use dram::cli::Args;
use dram::config::AnalysisConfig;
use dram::pipeline::{Pipeline, TracingObserver};
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let args = Args::parse_args();

    init_logging(&args);

    info!("DRAM v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("Analysis failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn load_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load_from_file(path)?,
        None => AnalysisConfig::default(),
    };
    config.merge_with_args(args);
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let config = load_config(args)?;
    info!("Data directory: {}", config.data_dir.display());
    info!("Output directory: {}", config.output_dir.display());

    let mut pipeline = Pipeline::new(&config, TracingObserver);
    let (report, output) = pipeline.run()?;

    report.log_key_insights();

    info!(
        "Analysis complete in {:.1}s: {} reports, {} charts",
        start_time.elapsed().as_secs_f64(),
        output.reports.len(),
        output.charts.len()
    );
    Ok(())
}

mod config;
mod error;
mod logging;
pub mod runtime;
pub mod services;

use std::io;

use crate::adapters::job_file;

pub use config::AppConfig;
pub use error::AppError;
pub use runtime::{PipelineOutcome, ReportPipeline};
pub use services::{JobCompletionHandler, ReportPlugin};

/// Reports the job record given as the first argument, or read from stdin.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    logging::init()?;

    let config = AppConfig::from_env()?;

    tracing::info!(
        log_location = %config.log_location,
        collector_url = config.collector.as_ref().map(|c| c.url.as_str()),
        tls_insecure = config.collector.as_ref().is_some_and(|c| c.tls_insecure),
        "job completion reporter initialized"
    );

    let record = match std::env::args().nth(1) {
        Some(path) => job_file::load_from_file(&path),
        None => job_file::load_from_reader(io::stdin().lock()),
    }
    .map_err(AppError::input)?;

    let mut plugin = ReportPlugin::new(config.collector);
    plugin.init().map_err(AppError::plugin)?;
    plugin
        .set_location(Some(&config.log_location))
        .map_err(AppError::plugin)?;

    let result = plugin.log_record(record.as_ref());
    plugin.fini().map_err(AppError::plugin)?;

    match result.map_err(AppError::plugin)? {
        PipelineOutcome::Skipped { job_id, state } => {
            tracing::info!(job_id, state = %state, "job not reported");
        }
        PipelineOutcome::Reported { .. } => {}
    }

    Ok(())
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::report::Report;

const COST_FILE_EXTENSION: &str = "cost";

#[derive(Debug, Error)]
pub enum CostFileError {
    #[error("log directory {path} is not accessible: {source}")]
    DirectoryInaccessible {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("log directory {path} is not a directory")]
    NotADirectory { path: PathBuf },
    #[error("failed to write cost file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CostFileError {
    /// True when the log directory itself is unusable, as opposed to the file write.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::DirectoryInaccessible { .. } | Self::NotADirectory { .. }
        )
    }
}

pub fn cost_file_path(log_directory: &Path, job_id: u32) -> PathBuf {
    log_directory.join(format!("{job_id}.{COST_FILE_EXTENSION}"))
}

pub fn render_report(report: &Report) -> String {
    format!(
        "job_id: {}\n\
         user_id: {}\n\
         cluster: {}\n\
         partition: {}\n\
         state: {}\n\
         allocated_ressources:\n  \
         cpu: {}\n  \
         mem: {}\n  \
         gpu: {}\n\
         billable_ressources: {}\n\
         time_start: {}\n\
         time_end: {}\n\
         job_duration: {}\n\
         cost_tier:\n  \
         name: {}\n  \
         factor: {:.6}\n\
         total_cost: {}\n",
        report.job_id,
        report.user_id,
        report.cluster,
        report.partition,
        report.job_state.name(),
        report.cpu,
        report.mem,
        report.gpu,
        report.billing,
        report.start_time,
        report.end_time,
        report.elapsed,
        report.qos_name,
        report.usage_factor,
        report.total_cost,
    )
}

/// Overwrites `<log_directory>/<job_id>.cost` with the rendered report.
pub fn write_cost_file(log_directory: &Path, report: &Report) -> Result<PathBuf, CostFileError> {
    ensure_directory(log_directory)?;

    let path = cost_file_path(log_directory, report.job_id);
    let content = render_report(report);
    tracing::debug!(path = %path.display(), "writing cost file");

    fs::write(&path, content).map_err(|source| CostFileError::Write {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}

fn ensure_directory(path: &Path) -> Result<(), CostFileError> {
    let metadata = fs::metadata(path).map_err(|source| CostFileError::DirectoryInaccessible {
        path: path.to_path_buf(),
        source,
    })?;

    if !metadata.is_dir() {
        return Err(CostFileError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

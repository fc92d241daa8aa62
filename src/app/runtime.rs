use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::adapters::collector::{PublishError, ReportPublisher};
use crate::adapters::cost_file::{CostFileError, write_cost_file};
use crate::adapters::report_json::{EncodingError, encode_report};
use crate::domain::job_record::JobRecord;
use crate::domain::job_state::JobState;
use crate::domain::report::{ReportError, build_report};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Build,
    CostFile,
    Encode,
    Publish,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Build => "build",
            Stage::CostFile => "cost_file",
            Stage::Encode => "encode",
            Stage::Publish => "publish",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Precondition,
    Encoding,
    Io,
    Transport,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("job record is missing")]
    MissingJobRecord,
    #[error("job {job_id}: failed to build report: {source}")]
    Build {
        job_id: u32,
        #[source]
        source: ReportError,
    },
    #[error("job {job_id}: failed to write cost file: {source}")]
    CostFile {
        job_id: u32,
        #[source]
        source: CostFileError,
    },
    #[error("job {job_id}: failed to encode report: {source}")]
    Encode {
        job_id: u32,
        #[source]
        source: EncodingError,
    },
    #[error("job {job_id}: failed to publish report: {source}")]
    Publish {
        job_id: u32,
        #[source]
        source: PublishError,
    },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingJobRecord | Self::Build { .. } => ErrorKind::Precondition,
            Self::CostFile { source, .. } if source.is_precondition() => ErrorKind::Precondition,
            Self::CostFile { .. } => ErrorKind::Io,
            Self::Encode { .. } => ErrorKind::Encoding,
            Self::Publish {
                source: PublishError::Serialize(_),
                ..
            } => ErrorKind::Encoding,
            Self::Publish { .. } => ErrorKind::Transport,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::MissingJobRecord | Self::Build { .. } => Stage::Build,
            Self::CostFile { .. } => Stage::CostFile,
            Self::Encode { .. } => Stage::Encode,
            Self::Publish { .. } => Stage::Publish,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The job is not in a terminal state; nothing was emitted.
    Skipped { job_id: u32, state: JobState },
    Reported {
        job_id: u32,
        cost_file: PathBuf,
        published: bool,
    },
}

/// Turns one finished job into a cost file and, when a collector is set, a POST.
///
/// The text and HTTP sinks are independent: both are attempted, every failure is
/// logged, and the first failure in sink order is returned.
pub struct ReportPipeline<P> {
    log_directory: PathBuf,
    publisher: Option<P>,
}

impl<P> ReportPipeline<P>
where
    P: ReportPublisher,
{
    pub fn new(log_directory: impl Into<PathBuf>, publisher: Option<P>) -> Self {
        Self {
            log_directory: log_directory.into(),
            publisher,
        }
    }

    pub fn log_directory(&self) -> &Path {
        &self.log_directory
    }

    pub fn log_record(&self, job: Option<&JobRecord>) -> Result<PipelineOutcome, PipelineError> {
        let job = job.ok_or_else(|| {
            tracing::error!(stage = %Stage::Build, "job record is missing");
            PipelineError::MissingJobRecord
        })?;

        if !job.job_state.is_reportable() {
            tracing::debug!(
                job_id = job.job_id,
                state = %job.job_state,
                "job is not finished, ignoring"
            );
            return Ok(PipelineOutcome::Skipped {
                job_id: job.job_id,
                state: job.job_state,
            });
        }

        let report = build_report(job).map_err(|source| {
            report_failure(PipelineError::Build {
                job_id: job.job_id,
                source,
            })
        })?;

        let cost_file = write_cost_file(&self.log_directory, &report).map_err(|source| {
            report_failure(PipelineError::CostFile {
                job_id: report.job_id,
                source,
            })
        });

        let published = match &self.publisher {
            Some(publisher) => encode_report(&report)
                .map_err(|source| {
                    report_failure(PipelineError::Encode {
                        job_id: report.job_id,
                        source,
                    })
                })
                .and_then(|body| {
                    publisher.publish(&body).map_err(|source| {
                        report_failure(PipelineError::Publish {
                            job_id: report.job_id,
                            source,
                        })
                    })
                })
                .map(|()| true),
            None => Ok(false),
        };

        let cost_file = cost_file?;
        let published = published?;

        tracing::info!(
            job_id = report.job_id,
            path = %cost_file.display(),
            published,
            total_cost = report.total_cost,
            "job report emitted"
        );

        Ok(PipelineOutcome::Reported {
            job_id: report.job_id,
            cost_file,
            published,
        })
    }
}

fn report_failure(error: PipelineError) -> PipelineError {
    tracing::error!(stage = %error.stage(), error = %error, "job report stage failed");
    error
}

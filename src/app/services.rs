use thiserror::Error;

use crate::adapters::collector::{CollectorSettings, HttpCollectorClient, PublishError};
use crate::app::runtime::{PipelineError, PipelineOutcome, ReportPipeline};
use crate::domain::job_record::JobRecord;
use crate::domain::report::Report;

pub const PLUGIN_NAME: &str = "Job completion reporting plugin";
pub const PLUGIN_TYPE: &str = "jobcomp/report";

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("jobcomp/report: log location is required")]
    MissingLocation,
    #[error("jobcomp/report: log location has not been set")]
    LocationUnset,
    #[error("jobcomp/report: failed to set up collector: {0}")]
    Collector(#[source] PublishError),
    #[error("jobcomp/report: {operation} is not implemented")]
    NotImplemented { operation: &'static str },
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Filters for a completed-jobs query. Accepted only to be refused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobQuery {
    pub user_id: Option<u32>,
    pub cluster: Option<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveRequest {
    pub purge_before: Option<i64>,
}

/// Lifecycle the scheduler drives a job completion plugin through.
pub trait JobCompletionHandler {
    fn init(&mut self) -> Result<(), PluginError>;
    fn set_location(&mut self, location: Option<&str>) -> Result<(), PluginError>;
    fn log_record(&self, job: Option<&JobRecord>) -> Result<PipelineOutcome, PluginError>;
    fn get_jobs(&self, query: &JobQuery) -> Result<Vec<Report>, PluginError>;
    fn archive(&self, request: &ArchiveRequest) -> Result<(), PluginError>;
    fn fini(&mut self) -> Result<(), PluginError>;
}

pub struct ReportPlugin {
    collector: Option<CollectorSettings>,
    pipeline: Option<ReportPipeline<HttpCollectorClient>>,
}

impl ReportPlugin {
    pub fn new(collector: Option<CollectorSettings>) -> Self {
        Self {
            collector,
            pipeline: None,
        }
    }
}

impl JobCompletionHandler for ReportPlugin {
    fn init(&mut self) -> Result<(), PluginError> {
        tracing::info!("{PLUGIN_TYPE}: Initializing {PLUGIN_NAME}");
        Ok(())
    }

    fn set_location(&mut self, location: Option<&str>) -> Result<(), PluginError> {
        let location = location
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(PluginError::MissingLocation)?;
        tracing::info!(location, "{PLUGIN_TYPE}: set location");

        let publisher = self
            .collector
            .as_ref()
            .map(HttpCollectorClient::new)
            .transpose()
            .map_err(PluginError::Collector)?;
        self.pipeline = Some(ReportPipeline::new(location, publisher));

        Ok(())
    }

    fn log_record(&self, job: Option<&JobRecord>) -> Result<PipelineOutcome, PluginError> {
        let pipeline = self.pipeline.as_ref().ok_or_else(|| {
            tracing::error!("{PLUGIN_TYPE}: log record called before a location was set");
            PluginError::LocationUnset
        })?;
        pipeline.log_record(job).map_err(PluginError::from)
    }

    fn get_jobs(&self, _query: &JobQuery) -> Result<Vec<Report>, PluginError> {
        tracing::debug!("{PLUGIN_TYPE}: get_jobs is not implemented");
        Err(PluginError::NotImplemented {
            operation: "get_jobs",
        })
    }

    fn archive(&self, _request: &ArchiveRequest) -> Result<(), PluginError> {
        tracing::debug!("{PLUGIN_TYPE}: archive is not implemented");
        Err(PluginError::NotImplemented {
            operation: "archive",
        })
    }

    fn fini(&mut self) -> Result<(), PluginError> {
        tracing::info!("{PLUGIN_TYPE}: Finishing {PLUGIN_NAME}");
        self.pipeline = None;
        Ok(())
    }
}

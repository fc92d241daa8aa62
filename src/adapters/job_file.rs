use std::fs;
use std::io::{self, Read};

use thiserror::Error;

use crate::domain::job_record::JobRecord;

#[derive(Debug, Error)]
pub enum JobFileError {
    #[error("failed to read job record: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse job record: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_from_file(path: &str) -> Result<Option<JobRecord>, JobFileError> {
    let content = fs::read_to_string(path)?;
    parse_job_record(&content)
}

pub fn load_from_reader<R: Read>(mut reader: R) -> Result<Option<JobRecord>, JobFileError> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    parse_job_record(&content)
}

/// Parses one snapshot. A JSON `null` document stands for a missing record.
pub fn parse_job_record(content: &str) -> Result<Option<JobRecord>, JobFileError> {
    serde_json::from_str(content).map_err(JobFileError::from)
}

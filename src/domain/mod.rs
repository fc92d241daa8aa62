pub mod job_record;
pub mod job_state;
pub mod report;

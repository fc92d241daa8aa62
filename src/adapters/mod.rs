pub mod collector;
pub mod cost_file;
pub mod job_file;
pub mod report_json;

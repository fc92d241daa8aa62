use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to read job record: {0}")]
    Input(String),
    #[error("{0}")]
    Plugin(String),
}

impl AppError {
    pub fn logging_init<E: std::fmt::Display>(error: E) -> Self {
        Self::LoggingInit(error.to_string())
    }

    pub fn config<E: std::fmt::Display>(error: E) -> Self {
        Self::Config(error.to_string())
    }

    pub fn input<E: std::fmt::Display>(error: E) -> Self {
        Self::Input(error.to_string())
    }

    pub fn plugin<E: std::fmt::Display>(error: E) -> Self {
        Self::Plugin(error.to_string())
    }
}

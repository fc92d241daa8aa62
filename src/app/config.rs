use reqwest::Url;

use crate::adapters::collector::CollectorSettings;
use crate::app::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_location: String,
    pub collector: Option<CollectorSettings>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_location = non_empty(&lookup, "JOBCOMP_LOC")
            .ok_or_else(|| AppError::config("JOBCOMP_LOC is required"))?;

        let tls_insecure = parse_flag(&lookup, "JOBCOMP_TLS_INSECURE")?;
        let collector = match non_empty(&lookup, "JOBCOMP_URL") {
            Some(url) => {
                validate_url(&url)?;
                Some(CollectorSettings { url, tls_insecure })
            }
            None => None,
        };

        Ok(Self {
            log_location,
            collector,
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag<F>(lookup: &F, key: &str) -> Result<bool, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, key) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AppError::config(format!("{key} must be a boolean"))),
        },
        None => Ok(false),
    }
}

fn validate_url(raw: &str) -> Result<(), AppError> {
    let url = Url::parse(raw)
        .map_err(|err| AppError::config(format!("JOBCOMP_URL is not a valid URL: {err}")))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(AppError::config(format!(
            "JOBCOMP_URL must use http or https, got {scheme}"
        ))),
    }
}

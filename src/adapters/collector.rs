use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;

const JSON_MEDIA_TYPE: &str = "application/json";
const CHARSET_HEADER: &str = "charset";
const CHARSET_UTF8: &str = "utf-8";

pub trait ReportPublisher {
    fn publish(&self, body: &Value) -> Result<(), PublishError>;
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("POST to {url} failed: {source}; body was {body}")]
    Transport {
        url: String,
        body: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSettings {
    pub url: String,
    /// Skip TLS peer verification. Off unless explicitly requested.
    pub tls_insecure: bool,
}

/// Posts report bodies to the configured collector endpoint, one attempt per report.
#[derive(Debug, Clone)]
pub struct HttpCollectorClient {
    url: String,
    client: Client,
}

impl HttpCollectorClient {
    pub fn new(settings: &CollectorSettings) -> Result<Self, PublishError> {
        if settings.tls_insecure {
            tracing::warn!(url = %settings.url, "TLS peer verification disabled for collector");
        }

        let client = Client::builder()
            .danger_accept_invalid_certs(settings.tls_insecure)
            .build()
            .map_err(PublishError::ClientBuild)?;

        Ok(Self {
            url: settings.url.clone(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ReportPublisher for HttpCollectorClient {
    fn publish(&self, body: &Value) -> Result<(), PublishError> {
        let body = serde_json::to_string(body).map_err(PublishError::Serialize)?;

        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .header(CONTENT_TYPE, JSON_MEDIA_TYPE)
            .header(CHARSET_HEADER, CHARSET_UTF8)
            .body(body.clone())
            .send()
            .map_err(|source| PublishError::Transport {
                url: self.url.clone(),
                body,
                source,
            })?;

        // The collector's status and payload carry no meaning for us.
        tracing::debug!(url = %self.url, status = %response.status(), "report published");
        drop(response);

        Ok(())
    }
}

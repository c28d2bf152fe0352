use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::{Result, SubtransError};
use crate::stream::{parse_streamed_response_from, ByteStream};

#[derive(Debug, Clone, Serialize)]
struct JobRequest<'a> {
    id: &'a str,
}

/// Server side of a translation job
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Start the translation job and return its reassembled output stream
    async fn submit_job(&self, job_id: &str) -> Result<ByteStream>;

    /// Fetch the original subtitle text of the job
    async fn fetch_content(&self, job_id: &str) -> Result<String>;
}

/// `JobBackend` over the translation server's HTTP API
pub struct HttpJobClient {
    client: Client,
    endpoint: String,
}

impl HttpJobClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn ensure_success(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        Err(SubtransError::Job(format!("{} failed with {}: {}", what, status, error_text)))
    }
}

#[async_trait]
impl JobBackend for HttpJobClient {
    async fn submit_job(&self, job_id: &str) -> Result<ByteStream> {
        let url = format!("{}/api", self.endpoint);
        debug!("Submitting translation job {} to {}", job_id, url);

        let response = self
            .client
            .post(&url)
            .json(&JobRequest { id: job_id })
            .send()
            .await?;
        let response = Self::ensure_success(response, "Translation request").await?;

        Ok(parse_streamed_response_from(response))
    }

    async fn fetch_content(&self, job_id: &str) -> Result<String> {
        let url = format!("{}/api/content", self.endpoint);
        debug!("Fetching original content of job {} from {}", job_id, url);

        let body = serde_json::to_string(&JobRequest { id: job_id })?;
        let response = self.client.post(&url).body(body).send().await?;
        let response = Self::ensure_success(response, "Content request").await?;

        Ok(response.text().await?)
    }
}

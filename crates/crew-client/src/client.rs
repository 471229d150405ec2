use std::time::Duration;

use analysis_core::{AnalysisService, JobStatusResponse, ServiceError, SubmitResponse};
use async_trait::async_trait;
use serde::Serialize;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Serialize)]
struct AnalyzeRequest<'a> {
    symbol: &'a str,
}

/// HTTP adapter for the analysis crew service.
///
/// Thin request/response mapping only; lifecycle decisions (when to poll,
/// when to stop) live in the job tracker.
#[derive(Clone)]
pub struct CrewClient {
    client: reqwest::Client,
    base_url: String,
}

impl CrewClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Queue an analysis job for a ticker symbol.
    pub async fn submit(&self, symbol: &str) -> ClientResult<SubmitResponse> {
        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .json(&AnalyzeRequest { symbol })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::ServiceUnavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        let accepted = response.json::<SubmitResponse>().await?;
        tracing::debug!("Submitted {} as job {}", symbol, accepted.task_id);
        Ok(accepted)
    }

    /// Fetch the current state of a submitted job.
    pub async fn job_status(&self, task_id: &str) -> ClientResult<JobStatusResponse> {
        let response = self
            .client
            .get(format!("{}/status/{}", self.base_url, task_id))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::JobNotFound(task_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(ClientError::ServiceUnavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        Ok(response.json::<JobStatusResponse>().await?)
    }

    /// Check service health.
    pub async fn health(&self) -> ClientResult<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl AnalysisService for CrewClient {
    async fn submit(&self, symbol: &str) -> Result<SubmitResponse, ServiceError> {
        CrewClient::submit(self, symbol).await.map_err(Into::into)
    }

    async fn job_status(&self, task_id: &str) -> Result<JobStatusResponse, ServiceError> {
        CrewClient::job_status(self, task_id).await.map_err(Into::into)
    }
}

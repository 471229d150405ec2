use async_trait::async_trait;

use crate::{JobStatusResponse, ServiceError, SubmitResponse};

/// Boundary to the remote analysis service.
///
/// `CrewClient` is the production implementation; tests substitute scripted
/// fakes so lifecycle behavior can be exercised without a network.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Queue an analysis job for `symbol`, returning the service-assigned id.
    async fn submit(&self, symbol: &str) -> Result<SubmitResponse, ServiceError>;

    /// Fetch the current status of a previously submitted job.
    async fn job_status(&self, task_id: &str) -> Result<JobStatusResponse, ServiceError>;
}

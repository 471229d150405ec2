use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Lifecycle status the analysis service reports for a submitted job.
///
/// `Completed` and `Failed` are terminal: the service never moves a job out
/// of them, so a client may stop polling once either is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Response to a job submission (`POST /analyze`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub task_id: String,
    pub status: JobStatus,
}

/// Response to a status fetch (`GET /status/{task_id}`).
///
/// `result` is the full report text and is only set once the job completes;
/// `error` is only set when the job itself failed. The service echoes back
/// a few submission fields (`symbol`, `submitted_at`) which are carried as
/// optional passthroughs; unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    /// Submission timestamp as reported by the service: a naive ISO-8601
    /// timestamp with no UTC offset attached.
    #[serde(default)]
    pub submitted_at: Option<NaiveDateTime>,
}

/// Handle for a job the service has accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobHandle {
    /// Opaque identifier assigned by the service; unique per job.
    pub id: String,
    pub symbol: String,
}

use analysis_core::{JobStatus, JobStatusResponse, ServiceError};
use serde::{Deserialize, Serialize};

/// Fallback message when the service reports failure without one.
pub(crate) const GENERIC_FAILURE: &str = "analysis failed";

/// Where the tracker currently is in a job's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerPhase {
    /// No job tracked; ready for a submission.
    Idle,
    /// Create-request in flight.
    Submitting,
    /// Job accepted; status polled on a fixed cadence.
    Polling,
    Completed,
    Failed,
}

impl TrackerPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrackerPhase::Completed | TrackerPhase::Failed)
    }
}

/// Point-in-time view of the tracked job, published on every transition.
///
/// `raw_report` is set iff the phase is `Completed`; `error` iff `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub phase: TrackerPhase,
    pub job_id: Option<String>,
    pub symbol: Option<String>,
    pub raw_report: Option<String>,
    pub error: Option<String>,
}

impl JobSnapshot {
    pub fn idle() -> Self {
        Self {
            phase: TrackerPhase::Idle,
            job_id: None,
            symbol: None,
            raw_report: None,
            error: None,
        }
    }

    pub(crate) fn submitting(symbol: &str) -> Self {
        Self {
            phase: TrackerPhase::Submitting,
            symbol: Some(symbol.to_string()),
            ..Self::idle()
        }
    }

    pub(crate) fn polling(symbol: &str, job_id: &str) -> Self {
        Self {
            phase: TrackerPhase::Polling,
            job_id: Some(job_id.to_string()),
            symbol: Some(symbol.to_string()),
            ..Self::idle()
        }
    }

    pub(crate) fn submission_failed(symbol: &str, error: &ServiceError) -> Self {
        Self {
            phase: TrackerPhase::Failed,
            symbol: Some(symbol.to_string()),
            error: Some(error.to_string()),
            ..Self::idle()
        }
    }
}

/// Fold one status response into the current snapshot.
///
/// Terminal snapshots are never advanced further; pending/running responses
/// leave the snapshot untouched, so the caller can detect "no transition"
/// by equality.
pub(crate) fn advance(current: &JobSnapshot, response: &JobStatusResponse) -> JobSnapshot {
    if current.phase.is_terminal() {
        return current.clone();
    }

    match response.status {
        JobStatus::Pending | JobStatus::Running => current.clone(),
        JobStatus::Completed => JobSnapshot {
            phase: TrackerPhase::Completed,
            raw_report: Some(response.result.clone().unwrap_or_default()),
            error: None,
            ..current.clone()
        },
        JobStatus::Failed => JobSnapshot {
            phase: TrackerPhase::Failed,
            raw_report: None,
            error: Some(
                response
                    .error
                    .clone()
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            ),
            ..current.clone()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: JobStatus, result: Option<&str>, error: Option<&str>) -> JobStatusResponse {
        JobStatusResponse {
            status,
            result: result.map(str::to_string),
            error: error.map(str::to_string),
            symbol: None,
            submitted_at: None,
        }
    }

    #[test]
    fn pending_and_running_leave_snapshot_unchanged() {
        let polling = JobSnapshot::polling("NVDA", "job-1");

        assert_eq!(advance(&polling, &response(JobStatus::Pending, None, None)), polling);
        assert_eq!(advance(&polling, &response(JobStatus::Running, None, None)), polling);
    }

    #[test]
    fn completed_records_report() {
        let polling = JobSnapshot::polling("NVDA", "job-1");
        let next = advance(&polling, &response(JobStatus::Completed, Some("report text"), None));

        assert_eq!(next.phase, TrackerPhase::Completed);
        assert_eq!(next.raw_report.as_deref(), Some("report text"));
        assert_eq!(next.error, None);
        assert_eq!(next.job_id.as_deref(), Some("job-1"));
    }

    #[test]
    fn failed_records_message_with_fallback() {
        let polling = JobSnapshot::polling("NVDA", "job-1");

        let next = advance(&polling, &response(JobStatus::Failed, None, Some("rate limited")));
        assert_eq!(next.phase, TrackerPhase::Failed);
        assert_eq!(next.error.as_deref(), Some("rate limited"));
        assert_eq!(next.raw_report, None);

        let next = advance(&polling, &response(JobStatus::Failed, None, None));
        assert_eq!(next.error.as_deref(), Some(GENERIC_FAILURE));
    }

    #[test]
    fn terminal_snapshots_never_regress() {
        let completed = advance(
            &JobSnapshot::polling("NVDA", "job-1"),
            &response(JobStatus::Completed, Some("report"), None),
        );

        // Late or contradictory responses must not mutate a terminal job.
        for late in [
            response(JobStatus::Pending, None, None),
            response(JobStatus::Running, None, None),
            response(JobStatus::Failed, None, Some("late failure")),
        ] {
            assert_eq!(advance(&completed, &late), completed);
        }
    }
}

//! Wires one user action ("analyze symbol X") to the job tracker and the
//! report extractor, and publishes combined snapshots for the presentation
//! layer to consume.

use std::sync::Arc;
use std::time::Duration;

use analysis_core::{AnalysisService, JobHandle, TrackerError};
use job_tracker::{JobSnapshot, JobTracker, TrackerPhase};
use report_extractor::{ExtractedMetrics, ReportExtractor};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use job_tracker::DEFAULT_POLL_INTERVAL;

/// Externally observable status of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Read-only snapshot published to the presentation layer.
///
/// A completed snapshot always carries the raw report and its extracted
/// metrics together in the same update; a consumer can never observe one
/// without the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub status: AnalysisStatus,
    pub job_id: Option<String>,
    pub symbol: Option<String>,
    pub raw_report: Option<String>,
    pub metrics: Option<ExtractedMetrics>,
    pub error: Option<String>,
}

impl AnalysisSnapshot {
    fn initial() -> Self {
        Self {
            status: AnalysisStatus::Pending,
            job_id: None,
            symbol: None,
            raw_report: None,
            metrics: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            AnalysisStatus::Completed | AnalysisStatus::Failed
        )
    }
}

/// Map a tracker snapshot to its presentation view, running extraction on
/// the final report so report and metrics land atomically.
fn project(snapshot: &JobSnapshot, extractor: &ReportExtractor) -> AnalysisSnapshot {
    let base = AnalysisSnapshot {
        status: AnalysisStatus::Pending,
        job_id: snapshot.job_id.clone(),
        symbol: snapshot.symbol.clone(),
        raw_report: None,
        metrics: None,
        error: None,
    };

    match snapshot.phase {
        TrackerPhase::Idle | TrackerPhase::Submitting => base,
        TrackerPhase::Polling => AnalysisSnapshot {
            status: AnalysisStatus::Running,
            ..base
        },
        TrackerPhase::Completed => {
            let raw = snapshot.raw_report.clone().unwrap_or_default();
            let metrics = extractor.extract(&raw);
            AnalysisSnapshot {
                status: AnalysisStatus::Completed,
                raw_report: Some(raw),
                metrics: Some(metrics),
                ..base
            }
        }
        TrackerPhase::Failed => AnalysisSnapshot {
            status: AnalysisStatus::Failed,
            error: snapshot.error.clone(),
            ..base
        },
    }
}

/// Owns the tracker and the extraction step; the presentation layer only
/// ever sees `AnalysisSnapshot` values and the `analyze` entry point.
pub struct AnalysisOrchestrator {
    tracker: JobTracker,
    snapshot_rx: watch::Receiver<AnalysisSnapshot>,
    forwarder: JoinHandle<()>,
}

impl AnalysisOrchestrator {
    pub fn new(service: Arc<dyn AnalysisService>, poll_interval: Duration) -> Self {
        let tracker = JobTracker::new(service, poll_interval);
        let mut tracker_rx = tracker.subscribe();
        let (tx, snapshot_rx) = watch::channel(AnalysisSnapshot::initial());
        let extractor = ReportExtractor::new();

        // Forward tracker transitions to the presentation channel. Metrics
        // are computed here, exactly once per completed report.
        let forwarder = tokio::spawn(async move {
            while tracker_rx.changed().await.is_ok() {
                let snapshot = tracker_rx.borrow_and_update().clone();
                let projected = project(&snapshot, &extractor);
                if tx.send(projected).is_err() {
                    break;
                }
            }
        });

        Self {
            tracker,
            snapshot_rx,
            forwarder,
        }
    }

    /// Subscribe to presentation snapshots.
    pub fn subscribe(&self) -> watch::Receiver<AnalysisSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> AnalysisSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Start an analysis run for `symbol`. A run already in flight is
    /// superseded first; only the newest submission is ever tracked.
    pub async fn analyze(&mut self, symbol: &str) -> Result<JobHandle, TrackerError> {
        tracing::info!("Starting analysis run for {}", symbol.trim());
        self.tracker.submit(symbol).await
    }

    /// Cancel the in-flight run, if any.
    pub fn cancel(&mut self) {
        self.tracker.cancel();
    }

    /// Submit `symbol` and wait for this run's terminal snapshot.
    pub async fn analyze_to_completion(
        &mut self,
        symbol: &str,
    ) -> Result<AnalysisSnapshot, TrackerError> {
        let mut rx = self.subscribe();
        // Mark whatever a previous run left behind as seen; only snapshots
        // published after this submission count.
        rx.borrow_and_update();

        let handle = self.analyze(symbol).await?;

        loop {
            if rx.changed().await.is_err() {
                return Ok(self.snapshot());
            }
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.is_terminal() && snapshot.job_id.as_deref() == Some(handle.id.as_str()) {
                return Ok(snapshot);
            }
        }
    }
}

impl Drop for AnalysisOrchestrator {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use analysis_core::{JobStatus, JobStatusResponse, ServiceError, SubmitResponse};
    use async_trait::async_trait;

    use super::*;

    const REPORT: &str = "Current Price: $495.22\n\
        ## RECOMMENDATION: BUY\n\
        Confidence Level: 85%\n\
        Price Target: $550.00\n\
        RSI: 62.5\n\
        P/E Ratio: 45.2";

    fn response(status: JobStatus, result: Option<&str>, error: Option<&str>) -> JobStatusResponse {
        JobStatusResponse {
            status,
            result: result.map(str::to_string),
            error: error.map(str::to_string),
            symbol: None,
            submitted_at: None,
        }
    }

    /// Pops one canned status response per poll, repeating the last entry
    /// once the script runs dry. Reports completion per submitted symbol.
    struct ScriptedService {
        script: Mutex<VecDeque<Result<JobStatusResponse, ServiceError>>>,
    }

    impl ScriptedService {
        fn new(script: Vec<Result<JobStatusResponse, ServiceError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
            })
        }
    }

    #[async_trait]
    impl AnalysisService for ScriptedService {
        async fn submit(&self, symbol: &str) -> Result<SubmitResponse, ServiceError> {
            Ok(SubmitResponse {
                task_id: format!("job-{symbol}"),
                status: JobStatus::Pending,
            })
        }

        async fn job_status(&self, _task_id: &str) -> Result<JobStatusResponse, ServiceError> {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script
                    .front()
                    .cloned()
                    .unwrap_or_else(|| Ok(response(JobStatus::Running, None, None)))
            }
        }
    }

    /// Completes every job with a report naming the job id.
    struct EchoService;

    #[async_trait]
    impl AnalysisService for EchoService {
        async fn submit(&self, symbol: &str) -> Result<SubmitResponse, ServiceError> {
            Ok(SubmitResponse {
                task_id: format!("job-{symbol}"),
                status: JobStatus::Pending,
            })
        }

        async fn job_status(&self, task_id: &str) -> Result<JobStatusResponse, ServiceError> {
            Ok(response(
                JobStatus::Completed,
                Some(&format!("report for {task_id}")),
                None,
            ))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completed_snapshot_carries_report_and_metrics_together() {
        let service = ScriptedService::new(vec![
            Ok(response(JobStatus::Pending, None, None)),
            Ok(response(JobStatus::Completed, Some(REPORT), None)),
        ]);
        let mut orchestrator =
            AnalysisOrchestrator::new(service, DEFAULT_POLL_INTERVAL);

        let snapshot = orchestrator.analyze_to_completion("NVDA").await.unwrap();

        assert_eq!(snapshot.status, AnalysisStatus::Completed);
        assert_eq!(snapshot.raw_report.as_deref(), Some(REPORT));

        let metrics = snapshot.metrics.expect("metrics published with report");
        assert_eq!(metrics.current_price.as_deref(), Some("495.22"));
        assert_eq!(metrics.recommendation.as_deref(), Some("BUY"));
        assert_eq!(metrics.confidence.as_deref(), Some("85%"));
        assert_eq!(metrics.price_target.as_deref(), Some("550.00"));
        assert_eq!(metrics.rsi.as_deref(), Some("62.5"));
        assert_eq!(metrics.pe_ratio.as_deref(), Some("45.2"));
    }

    #[tokio::test(start_paused = true)]
    async fn unstructured_report_still_completes_with_raw_text() {
        let service = ScriptedService::new(vec![Ok(response(
            JobStatus::Completed,
            Some("No structured data here."),
            None,
        ))]);
        let mut orchestrator =
            AnalysisOrchestrator::new(service, DEFAULT_POLL_INTERVAL);

        let snapshot = orchestrator.analyze_to_completion("NVDA").await.unwrap();

        assert_eq!(snapshot.status, AnalysisStatus::Completed);
        assert_eq!(snapshot.raw_report.as_deref(), Some("No structured data here."));
        assert!(snapshot.metrics.expect("metrics always published").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_run_reports_service_message() {
        let service = ScriptedService::new(vec![Ok(response(
            JobStatus::Failed,
            None,
            Some("rate limited"),
        ))]);
        let mut orchestrator =
            AnalysisOrchestrator::new(service, DEFAULT_POLL_INTERVAL);

        let snapshot = orchestrator.analyze_to_completion("NVDA").await.unwrap();

        assert_eq!(snapshot.status, AnalysisStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("rate limited"));
        assert_eq!(snapshot.raw_report, None);
        assert_eq!(snapshot.metrics, None);
    }

    #[tokio::test(start_paused = true)]
    async fn latest_submission_wins() {
        let mut orchestrator =
            AnalysisOrchestrator::new(Arc::new(EchoService), DEFAULT_POLL_INTERVAL);

        orchestrator.analyze("AAPL").await.unwrap();
        let snapshot = orchestrator.analyze_to_completion("MSFT").await.unwrap();

        assert_eq!(snapshot.symbol.as_deref(), Some("MSFT"));
        assert_eq!(snapshot.job_id.as_deref(), Some("job-MSFT"));
        assert_eq!(snapshot.raw_report.as_deref(), Some("report for job-MSFT"));
    }

    #[tokio::test(start_paused = true)]
    async fn running_is_observed_before_completion() {
        let service = ScriptedService::new(vec![
            Ok(response(JobStatus::Running, None, None)),
            Ok(response(JobStatus::Completed, Some(REPORT), None)),
        ]);
        let mut orchestrator =
            AnalysisOrchestrator::new(service, DEFAULT_POLL_INTERVAL);
        let mut rx = orchestrator.subscribe();

        orchestrator.analyze("NVDA").await.unwrap();

        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            if seen.last() != Some(&snapshot.status) {
                seen.push(snapshot.status);
            }
            if snapshot.is_terminal() {
                break;
            }
        }

        assert!(seen.contains(&AnalysisStatus::Running));
        assert_eq!(seen.last(), Some(&AnalysisStatus::Completed));
    }

    #[tokio::test(start_paused = true)]
    async fn submission_failure_propagates() {
        struct DownService;

        #[async_trait]
        impl AnalysisService for DownService {
            async fn submit(&self, _symbol: &str) -> Result<SubmitResponse, ServiceError> {
                Err(ServiceError::Transport("connection refused".to_string()))
            }

            async fn job_status(
                &self,
                _task_id: &str,
            ) -> Result<JobStatusResponse, ServiceError> {
                unreachable!("no job was ever accepted")
            }
        }

        let mut orchestrator =
            AnalysisOrchestrator::new(Arc::new(DownService), DEFAULT_POLL_INTERVAL);

        let err = orchestrator.analyze_to_completion("NVDA").await.unwrap_err();
        assert!(matches!(err, TrackerError::Submission(_)));
    }
}

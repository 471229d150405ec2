use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use analysis_core::{AnalysisService, JobHandle, JobStatus, TrackerError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::state::{advance, JobSnapshot, TrackerPhase};

/// Cadence the reference frontend polled at.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Tracks a single in-flight analysis job: submission, fixed-cadence status
/// polling, terminal-state detection and cancellation.
///
/// At most one poll task is alive at a time. A new `submit` supersedes the
/// previous job before any request is issued, and a superseded task can no
/// longer publish (its generation is stale), so responses for an old job
/// cannot leak into the successor's state.
pub struct JobTracker {
    service: Arc<dyn AnalysisService>,
    poll_interval: Duration,
    snapshot_tx: watch::Sender<JobSnapshot>,
    snapshot_rx: watch::Receiver<JobSnapshot>,
    generation: Arc<AtomicU64>,
    poll_task: Option<JoinHandle<()>>,
}

impl JobTracker {
    pub fn new(service: Arc<dyn AnalysisService>, poll_interval: Duration) -> Self {
        let (snapshot_tx, snapshot_rx) = watch::channel(JobSnapshot::idle());
        Self {
            service,
            poll_interval,
            snapshot_tx,
            snapshot_rx,
            generation: Arc::new(AtomicU64::new(0)),
            poll_task: None,
        }
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> JobSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Submit a new analysis job, superseding any job still in flight.
    ///
    /// A submission failure is terminal (`Failed` snapshot + error return)
    /// and is not retried.
    pub async fn submit(&mut self, symbol: &str) -> Result<JobHandle, TrackerError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(TrackerError::EmptySymbol);
        }

        // Supersede before the first await so the previous job can neither
        // poll again nor publish against the new state.
        self.halt_poll_task();

        let _ = self.snapshot_tx.send(JobSnapshot::submitting(symbol));

        match self.service.submit(symbol).await {
            Ok(accepted) => {
                tracing::info!("Job {} accepted for {}", accepted.task_id, symbol);
                let handle = JobHandle {
                    id: accepted.task_id,
                    symbol: symbol.to_string(),
                };
                let _ = self
                    .snapshot_tx
                    .send(JobSnapshot::polling(symbol, &handle.id));
                self.spawn_poll_task(handle.clone());
                Ok(handle)
            }
            Err(err) => {
                tracing::error!("Submission for {} failed: {}", symbol, err);
                let _ = self
                    .snapshot_tx
                    .send(JobSnapshot::submission_failed(symbol, &err));
                Err(TrackerError::Submission(err))
            }
        }
    }

    /// Stop tracking and return to idle, discarding the in-flight job.
    /// Idempotent; safe to call in any phase.
    pub fn cancel(&mut self) {
        self.halt_poll_task();
        let _ = self.snapshot_tx.send(JobSnapshot::idle());
    }

    /// Abort the live poll task (if any) and invalidate its generation.
    fn halt_poll_task(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
    }

    fn spawn_poll_task(&mut self, handle: JobHandle) {
        let service = Arc::clone(&self.service);
        let snapshot_tx = self.snapshot_tx.clone();
        let generation = Arc::clone(&self.generation);
        let my_generation = generation.load(Ordering::Acquire);
        let poll_interval = self.poll_interval;

        self.poll_task = Some(tokio::spawn(poll_loop(
            service,
            snapshot_tx,
            generation,
            my_generation,
            handle,
            poll_interval,
        )));
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        self.halt_poll_task();
    }
}

/// Poll until the job reaches a terminal state.
///
/// One status fetch per tick; the next tick is not awaited until the
/// previous response has been handled, so polls never overlap. A failed
/// status fetch is a network hiccup, not a failed job; it is logged and
/// polling continues.
async fn poll_loop(
    service: Arc<dyn AnalysisService>,
    snapshot_tx: watch::Sender<JobSnapshot>,
    generation: Arc<AtomicU64>,
    my_generation: u64,
    handle: JobHandle,
    poll_interval: Duration,
) {
    let mut ticks = time::interval_at(Instant::now() + poll_interval, poll_interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;

        let response = match service.job_status(&handle.id).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("Status poll for job {} failed: {}", handle.id, err);
                continue;
            }
        };

        if response.status == JobStatus::Completed && response.result.is_none() {
            tracing::warn!("Job {} completed without a report body", handle.id);
        }

        let next = advance(&snapshot_tx.borrow(), &response);
        if next == *snapshot_tx.borrow() {
            // Still pending/running.
            continue;
        }

        let published = snapshot_tx.send_if_modified(|snapshot| {
            // Refuse to publish for a superseded job.
            if generation.load(Ordering::Acquire) != my_generation {
                return false;
            }
            *snapshot = next.clone();
            true
        });

        if !published {
            return;
        }

        if next.phase.is_terminal() {
            match next.phase {
                TrackerPhase::Completed => tracing::info!("Job {} completed", handle.id),
                _ => tracing::warn!(
                    "Job {} failed: {}",
                    handle.id,
                    next.error.as_deref().unwrap_or("unknown")
                ),
            }
            return;
        }
    }
}

//! Adaptive-interval polling loop for server-side jobs
//!
//! Jobs on the play server finish within seconds for small cycles and within
//! minutes for large ones. The loop polls quickly at first (200ms) and backs
//! off to one-second intervals after ten seconds, so short jobs feel instant
//! without hammering the server on long ones.
//!
//! Transient status-read failures are logged and retried on the next tick;
//! only a missing session aborts the loop. Cancellation is cooperative via a
//! shared [`CancelFlag`] checked once per tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use benchlink_client::types::{JobId, JobKind, JobResult, JobStatus};
use benchlink_client::{ClientError, JobApi};

const FAST_INTERVAL: Duration = Duration::from_millis(200);
const SLOW_INTERVAL: Duration = Duration::from_secs(1);
const FAST_WINDOW: Duration = Duration::from_secs(10);

/// Shared cancellation flag, set by signal handlers or UI actions and
/// observed by the polling loop.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Errors that abort a polling run.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("polling cancelled")]
    Cancelled,

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Tuning knobs for one polling run.
#[derive(Debug, Clone, Default)]
pub struct PollOptions {
    /// Advisory upper bound on the run. When it elapses the loop returns the
    /// last status it observed instead of erroring; the job keeps running on
    /// the server.
    pub max_duration: Option<Duration>,
    pub cancel: CancelFlag,
}

/// A progress observation forwarded to the caller's reporter.
///
/// `delta` is the increase over the previously reported percentage, so
/// reporters that accumulate increments (progress bars) can apply it
/// directly. Percentages never decrease within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub delta: u8,
}

fn percent_of(handled: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (handled as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Whether this status is a terminal observation for the given job kind.
///
/// Returns `Some(true)` for success, `Some(false)` for failure and `None`
/// while the job is still running. Report jobs have no failure arm on the
/// server; they are only terminal once an artifact name is present.
fn terminal_outcome(kind: JobKind, status: &JobStatus) -> Option<bool> {
    match (kind, &status.result) {
        (JobKind::Report, Some(JobResult::Report(_))) => Some(true),
        (JobKind::Import, Some(JobResult::ImportSuccess(_))) => Some(true),
        (JobKind::Import, Some(JobResult::ImportFailure(_))) => Some(false),
        _ => None,
    }
}

/// Poll a job until it reaches a terminal state, the run is cancelled, or the
/// advisory time budget elapses.
///
/// Returns `Ok(Some(status))` with the terminal status on success,
/// `Ok(None)` when an import job reports failure, and `Ok(last_observed)`
/// when `max_duration` elapses first. Progress is forwarded to `on_progress`
/// whenever the completed percentage increases.
pub async fn poll_job(
    api: &dyn JobApi,
    project_key: &str,
    kind: JobKind,
    job_id: &JobId,
    options: &PollOptions,
    mut on_progress: impl FnMut(ProgressUpdate),
) -> Result<Option<JobStatus>, PollError> {
    let started = Instant::now();
    let mut last_percent: Option<u8> = None;
    let mut last_status: Option<JobStatus> = None;

    loop {
        if options.cancel.is_cancelled() {
            debug!(%job_id, "polling cancelled");
            return Err(PollError::Cancelled);
        }

        match api.job_status(project_key, kind, job_id).await {
            Ok(status) => {
                if let Some(progress) = status.progress {
                    let percent =
                        percent_of(progress.handled_items_count, progress.total_items_count);
                    let delta = percent.saturating_sub(last_percent.unwrap_or(0));
                    if last_percent.is_none() || delta > 0 {
                        on_progress(ProgressUpdate { percent, delta });
                        last_percent = Some(percent);
                    }
                }

                match terminal_outcome(kind, &status) {
                    Some(true) => {
                        debug!(%job_id, elapsed = ?started.elapsed(), "job completed");
                        return Ok(Some(status));
                    }
                    Some(false) => {
                        if let Some(JobResult::ImportFailure(failure)) = &status.result {
                            warn!(
                                %job_id,
                                code = failure.error.code,
                                message = %failure.error.message,
                                "import job failed"
                            );
                        }
                        return Ok(None);
                    }
                    None => last_status = Some(status),
                }
            }
            Err(err) if err.is_transient() => {
                warn!(%job_id, error = %err, "status read failed, retrying");
            }
            Err(err) => return Err(err.into()),
        }

        let elapsed = started.elapsed();
        if let Some(max) = options.max_duration {
            if elapsed >= max {
                debug!(%job_id, "polling time budget elapsed, job still running");
                return Ok(last_status);
            }
        }

        let interval = if elapsed < FAST_WINDOW {
            FAST_INTERVAL
        } else {
            SLOW_INTERVAL
        };
        tokio::time::sleep(interval).await;
    }
}

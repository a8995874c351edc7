// ── Job poller ──
//
// Bounded wait for an asynchronous device job. The first poll is
// immediate; later polls are spaced by `interval`. Once the remaining
// budget is no larger than one interval the poller sleeps out the rest
// and reports a timeout without polling again.

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use pylo_api::{CommitOutcome, JobId};

use crate::api::FirewallApi;
use crate::config::PollSettings;
use crate::error::CoreError;
use crate::model::{Job, JobStatus};
use crate::progress::Progress;

/// Poll `job_id` until it reaches a terminal status or `poll.timeout` runs out.
///
/// A failed job is returned as `Ok` with [`JobStatus::Failed`]; callers
/// decide what a failure means for them.
pub async fn wait_for_completion<A: FirewallApi>(
    api: &A,
    job_id: JobId,
    poll: &PollSettings,
    progress: &dyn Progress,
) -> Result<Job, CoreError> {
    poll.validate()?;

    let host = api.host();
    let operation = format!("job {job_id}");
    let started = Instant::now();
    let mut last_progress = None;
    let mut polls: u32 = 0;

    loop {
        polls += 1;
        match api.job_status(job_id).await {
            Ok(info) => {
                let job = Job::from(info);
                last_progress = Some(job.progress);
                progress.job_progress(&host, job_id, job.progress);
                debug!(
                    host = %host,
                    job = %job_id,
                    status = %job.status,
                    progress = job.progress,
                    poll = polls,
                    "job polled"
                );
                if job.status.is_terminal() {
                    info!(
                        host = %host,
                        job = %job_id,
                        status = %job.status,
                        elapsed = ?started.elapsed(),
                        "job finished"
                    );
                    return Ok(job);
                }
            }
            Err(e) if e.is_transient() => {
                warn!(host = %host, job = %job_id, error = %e, "job poll failed, retrying");
            }
            Err(e) => return Err(CoreError::from_api(&host, &operation, e)),
        }

        let remaining = poll.timeout.saturating_sub(started.elapsed());
        if remaining <= poll.interval {
            sleep(remaining).await;
            let waited = started.elapsed();
            warn!(host = %host, job = %job_id, ?waited, ?last_progress, "job timed out");
            return Err(CoreError::JobTimeout {
                host,
                operation,
                last_progress,
                waited,
            });
        }
        sleep(poll.interval).await;
    }
}

/// Commit the candidate config on `api` and wait for the job.
///
/// Returns `None` when the device had nothing to commit. A job that
/// finishes with a failure becomes [`CoreError::CommitFailed`].
pub async fn commit_and_wait<A: FirewallApi>(
    api: &A,
    poll: &PollSettings,
    progress: &dyn Progress,
) -> Result<Option<Job>, CoreError> {
    let host = api.host();
    let job_id = match api
        .commit()
        .await
        .map_err(|e| CoreError::from_api(&host, "commit", e))?
    {
        CommitOutcome::Enqueued(id) => id,
        CommitOutcome::NothingToCommit => {
            info!(host = %host, "nothing to commit");
            return Ok(None);
        }
    };
    info!(host = %host, job = %job_id, "commit enqueued");

    let job = wait_for_completion(api, job_id, poll, progress)
        .await
        .map_err(|e| match e {
            CoreError::JobTimeout {
                host,
                last_progress,
                waited,
                ..
            } => CoreError::JobTimeout {
                host,
                operation: format!("commit job {job_id}"),
                last_progress,
                waited,
            },
            other => other,
        })?;

    match job.status {
        JobStatus::Succeeded => Ok(Some(job)),
        _ => Err(CoreError::CommitFailed {
            host,
            job_id,
            details: job.summary(),
        }),
    }
}

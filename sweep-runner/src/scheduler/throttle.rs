//! Submission throttler
//!
//! Submits job scripts one at a time, in order, while keeping the user's
//! outstanding job count under a shared ceiling. The ceiling check is a
//! snapshot taken before each submission and is not atomic with it, so other
//! users of the queue may push the count slightly past the ceiling.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sweep_client::{SchedulerControl, SchedulerError, SchedulerQuery};
use sweep_core::domain::job::{JobDescriptor, SubmittedJob};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Admission state of the descriptor currently being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionState {
    /// About to check the outstanding job count
    Pending,
    /// Over the ceiling, sleeping before the next check
    Waiting,
    /// Under the ceiling, submit in flight
    Submitting,
    /// Accepted by the scheduler
    Submitted,
}

/// Result of a submission run that was not aborted by an error
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmitReport {
    /// Jobs accepted by the scheduler, in submission order
    pub submitted: Vec<SubmittedJob>,
    /// Descriptors never submitted
    pub remaining: usize,
    /// Whether the run stopped because it was cancelled
    pub cancelled: bool,
}

/// Fatal submission errors
///
/// Both variants carry the report of what was submitted before the failure.
#[derive(Debug, Error)]
pub enum ThrottleError {
    #[error("Failed to query outstanding jobs for {user}: {source}")]
    Query {
        user: String,
        source: SchedulerError,
        report: SubmitReport,
    },

    #[error("Failed to submit {}: {source}", .script.display())]
    Submit {
        script: PathBuf,
        source: SchedulerError,
        report: SubmitReport,
    },
}

impl ThrottleError {
    /// What was submitted before the failure
    pub fn report(&self) -> &SubmitReport {
        match self {
            ThrottleError::Query { report, .. } | ThrottleError::Submit { report, .. } => report,
        }
    }
}

enum Admission {
    Admitted,
    Cancelled,
}

/// Serial, admission-controlled submitter
pub struct SubmissionThrottler<S> {
    scheduler: Arc<S>,
    user: String,
    ceiling: usize,
    poll_interval: Duration,
}

impl<S> SubmissionThrottler<S>
where
    S: SchedulerQuery + SchedulerControl,
{
    /// Creates a new throttler
    ///
    /// # Arguments
    /// * `scheduler` - Scheduler to count and submit jobs with
    /// * `user` - User whose outstanding jobs count against the ceiling
    /// * `ceiling` - Submissions wait while the count is above this
    /// * `poll_interval` - Wait between checks while over the ceiling
    pub fn new(scheduler: Arc<S>, user: String, ceiling: usize, poll_interval: Duration) -> Self {
        Self {
            scheduler,
            user,
            ceiling,
            poll_interval,
        }
    }

    /// Submits every descriptor in order
    ///
    /// Stops at the first query or submit error. Cancellation is honoured
    /// before each descriptor and while waiting for headroom; a submit already
    /// in flight completes.
    pub async fn submit_all(
        &self,
        descriptors: &[JobDescriptor],
        cancel: &CancellationToken,
    ) -> Result<SubmitReport, ThrottleError> {
        let mut report = SubmitReport::default();

        info!(
            "Submitting {} job(s) (ceiling: {}, poll interval: {:?})",
            descriptors.len(),
            self.ceiling,
            self.poll_interval
        );

        for (index, descriptor) in descriptors.iter().enumerate() {
            let script = &descriptor.script_path;
            debug!("{} -> {:?}", script.display(), AdmissionState::Pending);

            let admission = match self.await_headroom(cancel).await {
                Ok(admission) => admission,
                Err(source) => {
                    report.remaining = descriptors.len() - index;
                    return Err(ThrottleError::Query {
                        user: self.user.clone(),
                        source,
                        report,
                    });
                }
            };

            if let Admission::Cancelled = admission {
                info!("Submission cancelled with {} job(s) left", descriptors.len() - index);
                report.remaining = descriptors.len() - index;
                report.cancelled = true;
                return Ok(report);
            }

            debug!("{} -> {:?}", script.display(), AdmissionState::Submitting);
            match self.scheduler.submit(script).await {
                Ok(job_id) => {
                    debug!("{} -> {:?}", script.display(), AdmissionState::Submitted);
                    report.submitted.push(SubmittedJob {
                        job_id,
                        script_path: script.clone(),
                    });
                }
                Err(source) => {
                    report.remaining = descriptors.len() - index;
                    return Err(ThrottleError::Submit {
                        script: script.clone(),
                        source,
                        report,
                    });
                }
            }
        }

        info!("Submitted {} job(s)", report.submitted.len());
        Ok(report)
    }

    /// Polls the queue until the outstanding count is at or under the ceiling
    async fn await_headroom(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Admission, SchedulerError> {
        loop {
            if cancel.is_cancelled() {
                return Ok(Admission::Cancelled);
            }

            let outstanding = self.scheduler.outstanding_jobs(&self.user).await?;
            if outstanding <= self.ceiling {
                return Ok(Admission::Admitted);
            }

            info!(
                "{} outstanding job(s) over ceiling {}; waiting {:?} ({:?})",
                outstanding,
                self.ceiling,
                self.poll_interval,
                AdmissionState::Waiting
            );

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => return Ok(Admission::Cancelled),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeScheduler};
    use sweep_core::domain::tier::ResourceTier;

    fn descriptor(name: &str) -> JobDescriptor {
        JobDescriptor {
            canonical_id: format!("org/{}", name),
            task: "T".to_string(),
            output_folder: PathBuf::from("/results"),
            tier: ResourceTier::Standard,
            script_path: PathBuf::from(format!("/jobs/org__{}_T.sh", name)),
        }
    }

    fn throttler(scheduler: &Arc<FakeScheduler>) -> SubmissionThrottler<FakeScheduler> {
        SubmissionThrottler::new(
            Arc::clone(scheduler),
            "alice".to_string(),
            165,
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn test_submits_in_order_under_ceiling() {
        let scheduler = Arc::new(FakeScheduler::new());
        let descriptors = vec![descriptor("a"), descriptor("b"), descriptor("c")];

        let report = throttler(&scheduler)
            .submit_all(&descriptors, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.submitted.len(), 3);
        assert_eq!(report.remaining, 0);
        assert!(!report.cancelled);

        let expected: Vec<PathBuf> = descriptors.iter().map(|d| d.script_path.clone()).collect();
        assert_eq!(scheduler.submitted(), expected);

        // Every submission is preceded by a count
        let calls = scheduler.calls();
        assert_eq!(calls[0], Call::Count);
        assert_eq!(calls[1], Call::Submit(expected[0].clone()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_while_over_ceiling() {
        let scheduler = Arc::new(FakeScheduler::new().with_counts([166, 166, 165]));
        let descriptors = vec![descriptor("a")];

        let started = tokio::time::Instant::now();
        let report = throttler(&scheduler)
            .submit_all(&descriptors, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.submitted.len(), 1);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(20) && waited < Duration::from_secs(21));
        assert_eq!(
            scheduler.calls(),
            vec![
                Call::Count,
                Call::Count,
                Call::Count,
                Call::Submit(descriptors[0].script_path.clone())
            ]
        );
    }

    #[tokio::test]
    async fn test_submit_failure_is_fatal() {
        let scheduler = Arc::new(FakeScheduler::new().failing_submit_after(1));
        let descriptors = vec![descriptor("a"), descriptor("b"), descriptor("c")];

        let err = throttler(&scheduler)
            .submit_all(&descriptors, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ThrottleError::Submit { .. }));
        assert_eq!(err.report().submitted.len(), 1);
        assert_eq!(err.report().remaining, 2);

        // Nothing after the failed script was attempted
        assert_eq!(scheduler.submitted().len(), 2);
    }

    #[tokio::test]
    async fn test_query_failure_is_fatal() {
        let scheduler = Arc::new(FakeScheduler::new().failing_count());
        let descriptors = vec![descriptor("a")];

        let err = throttler(&scheduler)
            .submit_all(&descriptors, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ThrottleError::Query { .. }));
        assert!(scheduler.submitted().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting() {
        let scheduler = Arc::new(FakeScheduler::new().with_counts(std::iter::repeat_n(500, 1000)));
        let descriptors = vec![descriptor("a"), descriptor("b")];
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(35)).await;
            trigger.cancel();
        });

        let report = throttler(&scheduler)
            .submit_all(&descriptors, &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.remaining, 2);
        assert!(scheduler.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_already_cancelled_submits_nothing() {
        let scheduler = Arc::new(FakeScheduler::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = throttler(&scheduler)
            .submit_all(&[descriptor("a")], &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.remaining, 1);
        assert!(scheduler.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let scheduler = Arc::new(FakeScheduler::new());
        let report = throttler(&scheduler)
            .submit_all(&[], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report, SubmitReport::default());
    }
}

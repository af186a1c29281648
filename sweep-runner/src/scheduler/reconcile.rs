//! Duplicate job reconciler
//!
//! Finds jobs in the user's queue that run the same command and cancels every
//! copy but the oldest. This is best-effort housekeeping: when the queue cannot
//! be read the pass does nothing, and one failed cancellation does not stop
//! the others.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use sweep_client::{SchedulerControl, SchedulerError, SchedulerQuery};
use sweep_core::domain::job::{DuplicateGroup, JobId, RunningJob};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Commands seen in the queue and the duplicate groups among them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Every distinct command carrying the namespace marker
    pub all_commands: BTreeSet<String>,
    /// Groups of two or more jobs sharing a command
    pub duplicates: Vec<DuplicateGroup>,
}

/// A cancellation that the scheduler refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCancel {
    pub job_id: JobId,
    pub command: String,
    pub error: String,
}

/// Outcome of cancelling duplicate jobs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CancelReport {
    pub cancelled: Vec<JobId>,
    pub failed: Vec<FailedCancel>,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub taken_at: DateTime<Utc>,
    pub reconciliation: Reconciliation,
    pub cancel: CancelReport,
    pub dry_run: bool,
}

/// Groups jobs by command, keeping only those carrying `marker`
///
/// Pure function of the snapshot: no scheduler access.
pub fn find_duplicates(jobs: &[RunningJob], marker: &str) -> Reconciliation {
    let mut by_command: BTreeMap<&str, Vec<JobId>> = BTreeMap::new();

    for job in jobs.iter().filter(|j| j.command.contains(marker)) {
        by_command
            .entry(job.command.as_str())
            .or_default()
            .push(job.job_id.clone());
    }

    let all_commands = by_command.keys().map(|c| c.to_string()).collect();
    let duplicates = by_command
        .into_iter()
        .filter_map(|(command, ids)| DuplicateGroup::new(command, ids))
        .collect();

    Reconciliation {
        all_commands,
        duplicates,
    }
}

/// Sweeps a user's queue for duplicate jobs
pub struct DuplicateReconciler<S> {
    scheduler: Arc<S>,
    user: String,
    namespace_marker: String,
}

impl<S> DuplicateReconciler<S>
where
    S: SchedulerQuery + SchedulerControl,
{
    /// Creates a new reconciler
    ///
    /// # Arguments
    /// * `scheduler` - Scheduler to read the queue from and cancel jobs with
    /// * `user` - Whose jobs to inspect
    /// * `namespace_marker` - Substring identifying commands this launcher created
    pub fn new(scheduler: Arc<S>, user: String, namespace_marker: String) -> Self {
        Self {
            scheduler,
            user,
            namespace_marker,
        }
    }

    /// Reads the command of every job the user has in the queue
    ///
    /// Jobs that leave the queue between listing and describing are skipped.
    /// Any other scheduler failure is logged and yields an empty snapshot.
    pub async fn snapshot(&self) -> Vec<RunningJob> {
        let job_ids = match self.scheduler.list_jobs(&self.user).await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Failed to list jobs for {}: {}", self.user, e);
                return Vec::new();
            }
        };

        let mut jobs = Vec::with_capacity(job_ids.len());
        for job_id in job_ids {
            match self.scheduler.job_command(&job_id).await {
                Ok(command) => jobs.push(RunningJob { job_id, command }),
                Err(e @ (SchedulerError::NotFound(_) | SchedulerError::Parse(_))) => {
                    debug!("Skipping job {}: {}", job_id, e);
                }
                Err(e) => {
                    error!("Failed to describe job {}: {}", job_id, e);
                    return Vec::new();
                }
            }
        }

        debug!("Snapshot holds {} job(s)", jobs.len());
        jobs
    }

    /// Cancels every job in each group except the oldest
    pub async fn cancel_duplicates(&self, groups: &[DuplicateGroup]) -> CancelReport {
        let mut report = CancelReport::default();

        for group in groups {
            for job_id in group.cancellation_targets() {
                match self.scheduler.cancel(job_id).await {
                    Ok(()) => {
                        info!("Cancelled job {} for {}", job_id, group.command);
                        report.cancelled.push(job_id.clone());
                    }
                    Err(e) => {
                        warn!("Failed to cancel job {}: {}", job_id, e);
                        report.failed.push(FailedCancel {
                            job_id: job_id.clone(),
                            command: group.command.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        report
    }

    /// Runs one reconciliation pass
    ///
    /// With `dry_run` the duplicates are reported but nothing is cancelled.
    pub async fn sweep(&self, dry_run: bool) -> SweepReport {
        let taken_at = Utc::now();
        let jobs = self.snapshot().await;
        let reconciliation = find_duplicates(&jobs, &self.namespace_marker);

        if !reconciliation.duplicates.is_empty() {
            info!(
                "Found {} duplicate group(s) among {} command(s)",
                reconciliation.duplicates.len(),
                reconciliation.all_commands.len()
            );
        }

        let cancel = if dry_run {
            CancelReport::default()
        } else {
            self.cancel_duplicates(&reconciliation.duplicates).await
        };

        SweepReport {
            taken_at,
            reconciliation,
            cancel,
            dry_run,
        }
    }

    /// Repeats [`sweep`](Self::sweep) every `interval` until cancelled
    ///
    /// `on_pass` receives every report as it is produced.
    pub async fn watch<F>(
        &self,
        interval: Duration,
        dry_run: bool,
        cancel: &CancellationToken,
        mut on_pass: F,
    ) where
        F: FnMut(&SweepReport),
    {
        info!("Starting duplicate sweep (interval: {:?})", interval);

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = cancel.cancelled() => {
                    info!("Duplicate sweep stopped");
                    return;
                }
            }

            let report = self.sweep(dry_run).await;
            on_pass(&report);
        }
    }
}

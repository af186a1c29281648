//! Scheduler port
//!
//! The launcher only ever reads queue state and issues submit/cancel commands.
//! Both sides are traits so the Slurm adapter can be swapped for an in-memory
//! scheduler in tests.

use async_trait::async_trait;
use std::path::Path;
use sweep_core::domain::job::JobId;

use crate::error::{Result, SchedulerError};
use crate::parse::parse_command_field;

/// Read-only view of the scheduler queue
#[async_trait]
pub trait SchedulerQuery: Send + Sync {
    /// Lists the ids of every job the user currently has queued or running
    async fn list_jobs(&self, user: &str) -> Result<Vec<JobId>>;

    /// Returns the free-form key/value description of a job
    async fn describe_job(&self, job_id: &JobId) -> Result<String>;

    /// Number of outstanding jobs for the user
    ///
    /// Counts job entries, not lines of scheduler output.
    async fn outstanding_jobs(&self, user: &str) -> Result<usize> {
        Ok(self.list_jobs(user).await?.len())
    }

    /// Full command line a job was started with
    async fn job_command(&self, job_id: &JobId) -> Result<String> {
        let description = self.describe_job(job_id).await?;
        parse_command_field(&description).ok_or_else(|| {
            SchedulerError::Parse(format!("no Command field in description of job {}", job_id))
        })
    }
}

/// Commands that mutate the scheduler queue
#[async_trait]
pub trait SchedulerControl: Send + Sync {
    /// Submits a batch script, returning the id the scheduler assigned
    async fn submit(&self, script_path: &Path) -> Result<JobId>;

    /// Cancels a job
    async fn cancel(&self, job_id: &JobId) -> Result<()>;
}

//! Slurm job commands

use async_trait::async_trait;
use std::path::Path;
use sweep_core::domain::job::JobId;
use tracing::info;

use crate::error::{Result, SchedulerError};
use crate::parse::{parse_job_ids, parse_submitted_job_id};
use crate::scheduler::{SchedulerControl, SchedulerQuery};
use crate::SlurmClient;

/// Message `scontrol` prints for jobs that have already left the queue
const INVALID_JOB_ID: &str = "Invalid job id";

#[async_trait]
impl SchedulerQuery for SlurmClient {
    async fn list_jobs(&self, user: &str) -> Result<Vec<JobId>> {
        let user_arg = format!("--user={}", user);
        let output = self
            .run(
                &self.programs.squeue,
                &[user_arg.as_str(), "--noheader", "--format=%A"],
            )
            .await?;

        Ok(parse_job_ids(&output))
    }

    async fn describe_job(&self, job_id: &JobId) -> Result<String> {
        match self
            .run(&self.programs.scontrol, &["show", "jobid", job_id.as_str()])
            .await
        {
            Err(SchedulerError::CommandFailed { stderr, .. }) if stderr.contains(INVALID_JOB_ID) => {
                Err(SchedulerError::NotFound(job_id.to_string()))
            }
            other => other,
        }
    }
}

#[async_trait]
impl SchedulerControl for SlurmClient {
    async fn submit(&self, script_path: &Path) -> Result<JobId> {
        let script = script_path.to_string_lossy();
        let output = self.run(&self.programs.sbatch, &[script.as_ref()]).await?;

        let job_id = parse_submitted_job_id(&output).ok_or_else(|| {
            SchedulerError::Parse(format!("unexpected sbatch output: {}", output.trim()))
        })?;

        info!("Submitted {} as job {}", script_path.display(), job_id);
        Ok(job_id)
    }

    async fn cancel(&self, job_id: &JobId) -> Result<()> {
        self.run(&self.programs.scancel, &[job_id.as_str()]).await?;
        Ok(())
    }
}

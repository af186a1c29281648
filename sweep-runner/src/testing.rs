//! In-memory scheduler used by unit tests

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use sweep_client::{Result, SchedulerControl, SchedulerError, SchedulerQuery};
use sweep_core::domain::job::{JobId, RunningJob};

/// Calls observed by the fake, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Count,
    List,
    Describe(JobId),
    Submit(PathBuf),
    Cancel(JobId),
}

#[derive(Default)]
pub struct FakeScheduler {
    jobs: Mutex<Vec<RunningJob>>,
    counts: Mutex<VecDeque<usize>>,
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<u64>,
    fail_list: bool,
    fail_count: bool,
    fail_submit_after: Option<usize>,
    fail_cancel: HashSet<JobId>,
    vanished: HashSet<JobId>,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(1000),
            ..Self::default()
        }
    }

    pub fn with_jobs(self, jobs: Vec<RunningJob>) -> Self {
        *self.jobs.lock().unwrap() = jobs;
        self
    }

    /// Outstanding-job counts reported by successive count queries
    ///
    /// Once exhausted, the count falls back to the number of known jobs.
    pub fn with_counts(self, counts: impl IntoIterator<Item = usize>) -> Self {
        *self.counts.lock().unwrap() = counts.into_iter().collect();
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_count(mut self) -> Self {
        self.fail_count = true;
        self
    }

    /// Accept `n` submissions, then fail every following one
    pub fn failing_submit_after(mut self, n: usize) -> Self {
        self.fail_submit_after = Some(n);
        self
    }

    pub fn failing_cancel(mut self, id: impl Into<JobId>) -> Self {
        self.fail_cancel.insert(id.into());
        self
    }

    /// Job that is listed but has left the queue by the time it is described
    pub fn vanishing(mut self, id: impl Into<JobId>) -> Self {
        self.vanished.insert(id.into());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Submit(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn cancelled(&self) -> Vec<JobId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Cancel(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn unavailable() -> SchedulerError {
        SchedulerError::command_failed("squeue", "exit status: 1", "slurm_load_jobs error")
    }
}

#[async_trait]
impl SchedulerQuery for FakeScheduler {
    async fn list_jobs(&self, _user: &str) -> Result<Vec<JobId>> {
        self.record(Call::List);
        if self.fail_list {
            return Err(Self::unavailable());
        }
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .map(|j| j.job_id.clone())
            .collect())
    }

    async fn describe_job(&self, job_id: &JobId) -> Result<String> {
        self.record(Call::Describe(job_id.clone()));
        if self.vanished.contains(job_id) {
            return Err(SchedulerError::NotFound(job_id.to_string()));
        }
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| &j.job_id == job_id)
            .map(|j| format!("JobId={} JobName=sweep\n   Command={}\n   WorkDir=/tmp\n", j.job_id, j.command))
            .ok_or_else(|| SchedulerError::NotFound(job_id.to_string()))
    }

    async fn outstanding_jobs(&self, _user: &str) -> Result<usize> {
        self.record(Call::Count);
        if self.fail_count {
            return Err(Self::unavailable());
        }
        if let Some(count) = self.counts.lock().unwrap().pop_front() {
            return Ok(count);
        }
        Ok(self.jobs.lock().unwrap().len())
    }
}

#[async_trait]
impl SchedulerControl for FakeScheduler {
    async fn submit(&self, script_path: &Path) -> Result<JobId> {
        let accepted = self.submitted().len();
        self.record(Call::Submit(script_path.to_path_buf()));

        if self.fail_submit_after.is_some_and(|n| accepted >= n) {
            return Err(SchedulerError::command_failed(
                "sbatch",
                "exit status: 1",
                "Batch job submission failed",
            ));
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let job_id = JobId::from(*next_id);

        self.jobs.lock().unwrap().push(RunningJob::new(
            job_id.clone(),
            script_path.to_string_lossy().into_owned(),
        ));

        Ok(job_id)
    }

    async fn cancel(&self, job_id: &JobId) -> Result<()> {
        self.record(Call::Cancel(job_id.clone()));
        if self.fail_cancel.contains(job_id) {
            return Err(SchedulerError::command_failed(
                "scancel",
                "exit status: 1",
                "Access/permission denied",
            ));
        }
        self.jobs.lock().unwrap().retain(|j| &j.job_id != job_id);
        Ok(())
    }
}

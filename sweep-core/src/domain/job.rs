//! Job domain types
//!
//! Covers both halves of a job's life: the descriptor rendered and submitted
//! by the launcher, and the snapshot of a running job read back from the
//! scheduler by the reconciler.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

use crate::domain::tier::ResourceTier;

/// Opaque job id assigned by the scheduler
///
/// Ids that are plain integers order numerically, so a lower id means an
/// earlier submission. Anything else sorts after all numeric ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the id, if it is a plain integer
    pub fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for JobId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for JobId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        JobId::new(s)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        JobId(s)
    }
}

impl From<u64> for JobId {
    fn from(n: u64) -> Self {
        JobId(n.to_string())
    }
}

/// Fully rendered submission unit
///
/// The script at `script_path` is self-contained: running it evaluates
/// `canonical_id` on `task` and records a failure marker on error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub canonical_id: String,
    pub task: String,
    pub output_folder: PathBuf,
    pub tier: ResourceTier,
    pub script_path: PathBuf,
}

/// A descriptor accepted by the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedJob {
    pub job_id: JobId,
    pub script_path: PathBuf,
}

/// Snapshot of a job currently known to the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningJob {
    pub job_id: JobId,
    /// Full invoked command line (for batch jobs, the script path)
    pub command: String,
}

impl RunningJob {
    pub fn new(job_id: impl Into<JobId>, command: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            command: command.into(),
        }
    }
}

/// Running jobs that share the same command
///
/// Job ids are kept in ascending order: the first is the oldest submission
/// and the one that survives reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDuplicateGroup")]
pub struct DuplicateGroup {
    pub command: String,
    job_ids: Vec<JobId>,
}

#[derive(Deserialize)]
struct RawDuplicateGroup {
    command: String,
    job_ids: Vec<JobId>,
}

impl TryFrom<RawDuplicateGroup> for DuplicateGroup {
    type Error = String;

    fn try_from(raw: RawDuplicateGroup) -> Result<Self, Self::Error> {
        Self::new(raw.command, raw.job_ids)
            .ok_or_else(|| "a duplicate group needs at least two jobs".to_string())
    }
}

impl DuplicateGroup {
    /// Builds a group, returning `None` unless it holds at least two jobs
    pub fn new(command: impl Into<String>, mut job_ids: Vec<JobId>) -> Option<Self> {
        if job_ids.len() < 2 {
            return None;
        }
        job_ids.sort();
        Some(Self {
            command: command.into(),
            job_ids,
        })
    }

    pub fn job_ids(&self) -> &[JobId] {
        &self.job_ids
    }

    /// The earliest submitted job, which is kept
    pub fn kept(&self) -> &JobId {
        &self.job_ids[0]
    }

    /// Every job except the kept one, oldest first
    pub fn cancellation_targets(&self) -> &[JobId] {
        &self.job_ids[1..]
    }
}

//! Sweep Scheduler Client
//!
//! A narrow, typed interface to the cluster scheduler.
//!
//! The launcher needs exactly four scheduler commands: enumerate a user's
//! jobs, describe one job, submit a batch script and cancel a job. This crate
//! exposes them as two traits ([`SchedulerQuery`] for reads,
//! [`SchedulerControl`] for writes) and implements both for Slurm.
//!
//! # Example
//!
//! ```no_run
//! use sweep_client::{SchedulerQuery, SlurmClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SlurmClient::new();
//!     let outstanding = client.outstanding_jobs("alice").await?;
//!     println!("alice has {} jobs queued", outstanding);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
pub mod parse;
mod scheduler;

// Re-export commonly used types
pub use error::{Result, SchedulerError};
pub use scheduler::{SchedulerControl, SchedulerQuery};

use tokio::process::Command;
use tracing::debug;

/// Names of the Slurm executables
///
/// Overridable for sites that wrap the scheduler commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlurmPrograms {
    pub squeue: String,
    pub scontrol: String,
    pub sbatch: String,
    pub scancel: String,
}

impl Default for SlurmPrograms {
    fn default() -> Self {
        Self {
            squeue: "squeue".to_string(),
            scontrol: "scontrol".to_string(),
            sbatch: "sbatch".to_string(),
            scancel: "scancel".to_string(),
        }
    }
}

/// Slurm implementation of the scheduler port
///
/// Every call spawns the matching Slurm command line tool and parses its
/// standard output.
#[derive(Debug, Clone, Default)]
pub struct SlurmClient {
    programs: SlurmPrograms,
}

impl SlurmClient {
    /// Create a client using the standard Slurm executables on `PATH`
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client with custom executable names
    ///
    /// # Example
    /// ```
    /// use sweep_client::{SlurmClient, SlurmPrograms};
    ///
    /// let client = SlurmClient::with_programs(SlurmPrograms {
    ///     sbatch: "/opt/slurm/bin/sbatch".to_string(),
    ///     ..SlurmPrograms::default()
    /// });
    /// assert_eq!(client.programs().sbatch, "/opt/slurm/bin/sbatch");
    /// ```
    pub fn with_programs(programs: SlurmPrograms) -> Self {
        Self { programs }
    }

    /// Get the configured executable names
    pub fn programs(&self) -> &SlurmPrograms {
        &self.programs
    }

    // =============================================================================
    // Process Handling
    // =============================================================================

    /// Run a scheduler command and return its standard output
    ///
    /// A non-zero exit status becomes [`SchedulerError::CommandFailed`]
    /// carrying the command's stderr.
    async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        debug!("Running {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|source| SchedulerError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(SchedulerError::command_failed(
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

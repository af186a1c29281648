//! Error types for the scheduler client

use thiserror::Error;

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors that can occur when talking to the cluster scheduler
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler command could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The scheduler command ran and reported failure
    #[error("{program} failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The scheduler output could not be understood
    #[error("Failed to parse scheduler output: {0}")]
    Parse(String),

    /// The job is unknown to the scheduler (already finished or never existed)
    #[error("Job not found: {0}")]
    NotFound(String),
}

impl SchedulerError {
    /// Create a command failure from the program name, exit status and stderr
    pub fn command_failed(
        program: impl Into<String>,
        status: impl std::fmt::Display,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            program: program.into(),
            status: status.to_string(),
            stderr: stderr.into().trim().to_string(),
        }
    }

    /// Check if this error means the job no longer exists
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

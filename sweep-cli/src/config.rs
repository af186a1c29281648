//! Configuration module
//!
//! Layers command-line flags over the environment-derived launcher
//! configuration.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use sweep_client::SlurmPrograms;

/// Options shared by every command
///
/// Flags left unset fall back to the SWEEP_* environment variables, then to
/// the built-in defaults.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Scheduler user (default: SWEEP_USER, then USER)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Submissions wait while the user has more outstanding jobs than this
    #[arg(long, global = true)]
    pub ceiling: Option<usize>,

    /// Seconds between queue polls while over the ceiling
    #[arg(long, global = true, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Directory job scripts are written to
    #[arg(long, global = true)]
    pub jobs_dir: Option<PathBuf>,

    /// Directory evaluation results are written to
    #[arg(long, global = true)]
    pub results_dir: Option<PathBuf>,

    /// Directory failure markers are appended to
    #[arg(long, global = true)]
    pub failures_dir: Option<PathBuf>,

    /// Substring that marks a job command as ours
    #[arg(long, global = true)]
    pub namespace_marker: Option<String>,

    /// Command that runs one evaluation
    #[arg(long, global = true)]
    pub runner_command: Option<String>,

    /// JSON file with tier markers and templates
    #[arg(long, global = true)]
    pub tier_policy: Option<PathBuf>,

    /// squeue executable
    #[arg(long, global = true, env = "SWEEP_SQUEUE", default_value = "squeue")]
    pub squeue: String,

    /// scontrol executable
    #[arg(long, global = true, env = "SWEEP_SCONTROL", default_value = "scontrol")]
    pub scontrol: String,

    /// sbatch executable
    #[arg(long, global = true, env = "SWEEP_SBATCH", default_value = "sbatch")]
    pub sbatch: String,

    /// scancel executable
    #[arg(long, global = true, env = "SWEEP_SCANCEL", default_value = "scancel")]
    pub scancel: String,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Launcher settings
    pub runner: sweep_runner::Config,

    /// Slurm executables to call
    pub programs: SlurmPrograms,

    /// Whether reports are printed as JSON
    pub json: bool,
}

impl ConfigArgs {
    /// Builds the validated configuration
    pub fn load(self) -> Result<Config> {
        let mut runner = sweep_runner::Config::from_env_with_user(self.user)?;

        if let Some(ceiling) = self.ceiling {
            runner.ceiling = ceiling;
        }

        if let Some(secs) = self.poll_interval {
            runner.poll_interval = Duration::from_secs(secs);
        }

        if let Some(marker) = self.namespace_marker {
            runner.set_namespace_marker(marker);
        }

        if let Some(dir) = self.jobs_dir {
            runner.jobs_dir = dir;
        }

        if let Some(dir) = self.results_dir {
            runner.results_dir = dir;
        }

        if let Some(dir) = self.failures_dir {
            runner.failures_dir = dir;
        }

        if let Some(command) = self.runner_command {
            runner.runner_command = command;
        }

        if let Some(path) = self.tier_policy {
            runner = runner.with_tier_policy_file(&path)?;
        }

        runner.validate()?;

        Ok(Config {
            runner,
            programs: SlurmPrograms {
                squeue: self.squeue,
                scontrol: self.scontrol,
                sbatch: self.sbatch,
                scancel: self.scancel,
            },
            json: self.json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::parse_from([
            "sweep",
            "--user",
            "alice",
            "--ceiling",
            "10",
            "--poll-interval",
            "3",
            "--namespace-marker",
            "eval",
            "--sbatch",
            "/opt/slurm/bin/sbatch",
        ]);

        let config = cli.config.load().unwrap();
        assert_eq!(config.runner.user, "alice");
        assert_eq!(config.runner.ceiling, 10);
        assert_eq!(config.runner.poll_interval, Duration::from_secs(3));
        assert_eq!(config.runner.namespace_marker, "eval");
        assert_eq!(config.runner.jobs_dir, PathBuf::from("eval_jobs"));
        assert_eq!(config.programs.sbatch, "/opt/slurm/bin/sbatch");
        assert!(!config.json);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = TestCli::parse_from(["sweep", "--user", "alice", "--poll-interval", "0"]);
        assert!(cli.config.load().is_err());
    }
}

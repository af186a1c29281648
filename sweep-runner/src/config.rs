//! Launcher configuration
//!
//! Defines every tunable of the launch pipeline and the duplicate sweep:
//! who we submit as, how full the queue may get, where job scripts, results
//! and failure markers live, and the tier policy.

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sweep_core::domain::tier::TierPolicy;

/// Default admission ceiling (outstanding jobs per user)
pub const DEFAULT_CEILING: usize = 165;

/// Default wait between queue polls while the ceiling is reached
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default substring identifying our jobs
pub const DEFAULT_NAMESPACE_MARKER: &str = "mteb";

/// Default jobs directory for a namespace marker
///
/// Slurm reports a batch job's command as its script path, so the directory
/// name carries the marker for the duplicate sweep to find our jobs.
pub fn default_jobs_dir(namespace_marker: &str) -> PathBuf {
    PathBuf::from(format!("{}_jobs", namespace_marker))
}

/// Launcher configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Scheduler user whose jobs are counted and reconciled
    pub user: String,

    /// Submissions pause while the user has more outstanding jobs than this
    pub ceiling: usize,

    /// How long to wait before re-checking the queue when over the ceiling
    pub poll_interval: Duration,

    /// Directory rendered job scripts are written to
    pub jobs_dir: PathBuf,

    /// Directory the benchmark runner writes results to
    pub results_dir: PathBuf,

    /// Directory failed runs leave their marker files in
    pub failures_dir: PathBuf,

    /// Substring identifying our jobs among everything the user runs
    pub namespace_marker: String,

    /// Command that runs one evaluation (model and task flags are appended)
    pub runner_command: String,

    /// Tier selection rules and per-tier templates
    pub tier_policy: TierPolicy,
}

impl Config {
    /// Creates a new configuration with defaults for the given user
    pub fn new(user: String) -> Self {
        Self {
            user,
            ceiling: DEFAULT_CEILING,
            poll_interval: DEFAULT_POLL_INTERVAL,
            jobs_dir: default_jobs_dir(DEFAULT_NAMESPACE_MARKER),
            results_dir: PathBuf::from("results"),
            failures_dir: PathBuf::from("failures"),
            namespace_marker: DEFAULT_NAMESPACE_MARKER.to_string(),
            runner_command: "mteb run".to_string(),
            tier_policy: TierPolicy::default(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - SWEEP_USER (optional, falls back to USER; one of them is required)
    /// - SWEEP_CEILING (optional, default: 165)
    /// - SWEEP_POLL_INTERVAL (optional, seconds, default: 10)
    /// - SWEEP_JOBS_DIR (optional, default: <marker>_jobs)
    /// - SWEEP_RESULTS_DIR (optional, default: results)
    /// - SWEEP_FAILURES_DIR (optional, default: failures)
    /// - SWEEP_NAMESPACE_MARKER (optional, default: mteb)
    /// - SWEEP_RUNNER_COMMAND (optional, default: "mteb run")
    /// - SWEEP_TIER_POLICY (optional, path to a JSON tier policy)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_env_with_user(None)
    }

    /// Same as [`from_env`](Self::from_env), with the user given explicitly
    ///
    /// An explicit user takes precedence over SWEEP_USER and USER.
    pub fn from_env_with_user(user: Option<String>) -> anyhow::Result<Self> {
        let user = match user {
            Some(user) => user,
            None => std::env::var("SWEEP_USER")
                .or_else(|_| std::env::var("USER"))
                .map_err(|_| anyhow::anyhow!("neither SWEEP_USER nor USER is set"))?,
        };

        let mut config = Self::new(user);

        if let Some(ceiling) = std::env::var("SWEEP_CEILING")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            config.ceiling = ceiling;
        }

        if let Some(poll_interval) = std::env::var("SWEEP_POLL_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
        {
            config.poll_interval = poll_interval;
        }

        if let Ok(dir) = std::env::var("SWEEP_JOBS_DIR") {
            config.jobs_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("SWEEP_RESULTS_DIR") {
            config.results_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("SWEEP_FAILURES_DIR") {
            config.failures_dir = PathBuf::from(dir);
        }

        if let Ok(marker) = std::env::var("SWEEP_NAMESPACE_MARKER") {
            config.set_namespace_marker(marker);
        }

        if let Ok(command) = std::env::var("SWEEP_RUNNER_COMMAND") {
            config.runner_command = command;
        }

        if let Ok(path) = std::env::var("SWEEP_TIER_POLICY") {
            config.tier_policy = load_tier_policy(Path::new(&path))?;
        }

        Ok(config)
    }

    /// Changes the namespace marker
    ///
    /// A jobs directory still at the default for the old marker follows the
    /// new one; an explicitly chosen directory is left alone.
    pub fn set_namespace_marker(&mut self, marker: String) {
        if self.jobs_dir == default_jobs_dir(&self.namespace_marker) {
            self.jobs_dir = default_jobs_dir(&marker);
        }
        self.namespace_marker = marker;
    }

    /// Replaces the tier policy with one read from a JSON file
    pub fn with_tier_policy_file(mut self, path: &Path) -> anyhow::Result<Self> {
        self.tier_policy = load_tier_policy(path)?;
        Ok(self)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.user.is_empty() {
            anyhow::bail!("user cannot be empty");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.namespace_marker.is_empty() {
            anyhow::bail!("namespace_marker cannot be empty");
        }

        if self.runner_command.trim().is_empty() {
            anyhow::bail!("runner_command cannot be empty");
        }

        for tier in [&self.tier_policy.standard, &self.tier_policy.high_capacity] {
            if tier.batch_size == 0 {
                anyhow::bail!("tier batch_size must be greater than 0");
            }
        }

        Ok(())
    }
}

/// Reads a tier policy from a JSON file
pub fn load_tier_policy(path: &Path) -> anyhow::Result<TierPolicy> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tier policy {}", path.display()))?;

    TierPolicy::from_json(&raw)
        .with_context(|| format!("Failed to parse tier policy {}", path.display()))
}

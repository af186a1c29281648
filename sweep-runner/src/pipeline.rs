//! Launch pipeline
//!
//! Runs the one-shot flow from missing work to submitted jobs:
//! resolve model names, pick a tier, write one script per (model, task)
//! pair, then hand the scripts to the throttler in order.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use sweep_client::{SchedulerControl, SchedulerQuery};
use sweep_core::domain::job::JobDescriptor;
use sweep_core::domain::work::WorkItem;
use sweep_core::dto::catalogue::ModelCatalogue;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::scheduler::{SubmissionThrottler, SubmitReport, ThrottleError};
use crate::service::{
    DescriptorBuilder, ModelResolver, Resolution, ResolvedWork, SkippedItem, TierSelector,
};

/// Job scripts written for a batch of work
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub generated_at: DateTime<Utc>,
    /// One descriptor per distinct (model, task) pair, in work order
    pub descriptors: Vec<JobDescriptor>,
    /// Work items whose model could not be resolved
    pub skipped: Vec<SkippedItem>,
    /// Work items that repeated an earlier (model, task) pair
    pub repeated: usize,
}

/// Resolves work items and writes their job scripts
///
/// Result, failure and job directories are made absolute first, since the
/// scripts run on cluster nodes with their own working directory.
///
/// # Errors
/// Returns an error if a directory cannot be resolved or a script cannot be
/// written. Unresolvable models are not errors; they end up in `skipped`.
pub fn plan(config: &Config, catalogue: &ModelCatalogue, items: Vec<WorkItem>) -> Result<PlanReport> {
    info!(
        "Planning {} work item(s) against {} catalogue model(s)",
        items.len(),
        catalogue.len()
    );

    render(config, ModelResolver::new(catalogue).resolve_work(items))
}

/// Writes job scripts for already resolved work
pub fn render(config: &Config, resolution: Resolution) -> Result<PlanReport> {
    let results_dir = std::path::absolute(&config.results_dir)
        .with_context(|| format!("Failed to resolve {}", config.results_dir.display()))?;
    let failures_dir = std::path::absolute(&config.failures_dir)
        .with_context(|| format!("Failed to resolve {}", config.failures_dir.display()))?;
    let jobs_dir = std::path::absolute(&config.jobs_dir)
        .with_context(|| format!("Failed to resolve {}", config.jobs_dir.display()))?;

    if !jobs_dir.to_string_lossy().contains(&config.namespace_marker) {
        warn!(
            "Jobs directory {} does not contain '{}'; the duplicate sweep will not see these jobs",
            jobs_dir.display(),
            config.namespace_marker
        );
    }

    let selector = TierSelector::from_policy(&config.tier_policy);
    let builder = DescriptorBuilder::new(
        jobs_dir,
        failures_dir,
        config.runner_command.clone(),
        config.tier_policy.clone(),
    );

    let mut seen = HashSet::new();
    let mut descriptors = Vec::with_capacity(resolution.resolved.len());
    let mut repeated = 0;

    for ResolvedWork { item, model } in resolution.resolved {
        if !seen.insert((model.canonical_id.clone(), item.task.clone())) {
            debug!("{} repeats an earlier pair; not rendered again", item);
            repeated += 1;
            continue;
        }

        let tier = selector.select(&model.canonical_id, &item.task);
        descriptors.push(builder.build(&model.canonical_id, &item.task, &results_dir, tier)?);
    }

    info!(
        "Wrote {} job script(s), skipped {} work item(s)",
        descriptors.len(),
        resolution.skipped.len()
    );

    Ok(PlanReport {
        generated_at: Utc::now(),
        descriptors,
        skipped: resolution.skipped,
        repeated,
    })
}

/// Submits a plan's scripts through the throttler
pub async fn launch<S>(
    config: &Config,
    scheduler: Arc<S>,
    plan: &PlanReport,
    cancel: &CancellationToken,
) -> std::result::Result<SubmitReport, ThrottleError>
where
    S: SchedulerQuery + SchedulerControl,
{
    let throttler = SubmissionThrottler::new(
        scheduler,
        config.user.clone(),
        config.ceiling,
        config.poll_interval,
    );

    throttler.submit_all(&plan.descriptors, cancel).await
}

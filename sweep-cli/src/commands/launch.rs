//! Launch command handler
//!
//! Turns a missing-results manifest (or an explicit model x task matrix)
//! into job scripts and submits them under the admission ceiling.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sweep_client::SlurmClient;
use sweep_core::domain::work::WorkMatrix;
use sweep_core::dto::catalogue::ModelCatalogue;
use sweep_core::dto::manifest::MissingResults;
use sweep_runner::PlanReport;
use sweep_runner::scheduler::SubmitReport;
use sweep_runner::service::Resolution;

use super::{interrupt_token, print_json};
use crate::config::Config;

/// Launch arguments
#[derive(Args, Debug)]
pub struct LaunchArgs {
    /// Missing-results manifest (benchmark -> model -> tasks, JSON)
    #[arg(short, long, conflicts_with_all = ["models", "tasks"], requires = "catalogue")]
    pub manifest: Option<PathBuf>,

    /// Model catalogue (JSON array or one id per line)
    #[arg(short, long)]
    pub catalogue: Option<PathBuf>,

    /// Models to evaluate (comma-separated), crossed with --tasks
    #[arg(long, value_delimiter = ',', requires = "tasks")]
    pub models: Vec<String>,

    /// Tasks to evaluate (comma-separated), crossed with --models
    #[arg(long, value_delimiter = ',', requires = "models")]
    pub tasks: Vec<String>,

    /// Write job scripts without submitting them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
struct LaunchOutput<'a> {
    plan: &'a PlanReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    submit: Option<&'a SubmitReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Handle the launch command
pub async fn handle_launch_command(args: LaunchArgs, config: &Config) -> Result<()> {
    let plan = build_plan(&args, &config.runner)?;

    if args.dry_run || plan.descriptors.is_empty() {
        if config.json {
            return print_json(&LaunchOutput {
                plan: &plan,
                submit: None,
                error: None,
            });
        }

        print_plan(&plan);
        if args.dry_run {
            println!("{}", "Dry run: nothing submitted.".yellow());
        } else {
            println!("{}", "Nothing to submit.".yellow());
        }
        return Ok(());
    }

    let scheduler = Arc::new(SlurmClient::with_programs(config.programs.clone()));
    let cancel = interrupt_token();
    let outcome = sweep_runner::launch(&config.runner, scheduler, &plan, &cancel).await;

    let report = match &outcome {
        Ok(report) => report,
        Err(e) => e.report(),
    };

    if config.json {
        print_json(&LaunchOutput {
            plan: &plan,
            submit: Some(report),
            error: outcome.as_ref().err().map(|e| e.to_string()),
        })?;
    } else {
        print_plan(&plan);
        print_submit_report(report);
    }

    match outcome {
        Ok(report) if report.cancelled => anyhow::bail!(
            "Launch interrupted with {} job(s) not submitted",
            report.remaining
        ),
        Ok(_) => Ok(()),
        Err(e) => Err(e).context("Launch aborted"),
    }
}

/// Collects work and writes one job script per (model, task) pair
fn build_plan(args: &LaunchArgs, config: &sweep_runner::Config) -> Result<PlanReport> {
    let catalogue = args.catalogue.as_deref().map(read_catalogue).transpose()?;

    if let Some(path) = &args.manifest {
        let catalogue =
            catalogue.ok_or_else(|| anyhow::anyhow!("--manifest requires --catalogue"))?;
        let manifest = read_manifest(path)?;
        return sweep_runner::plan(config, &catalogue, manifest.work_items());
    }

    if args.models.is_empty() || args.tasks.is_empty() {
        anyhow::bail!("Either --manifest or both --models and --tasks are required");
    }

    let items = WorkMatrix::cross(&args.models, &args.tasks).into_items();
    match catalogue {
        Some(catalogue) => sweep_runner::plan(config, &catalogue, items),
        None => sweep_runner::render(config, Resolution::verbatim(items)),
    }
}

fn read_manifest(path: &Path) -> Result<MissingResults> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

    MissingResults::from_json(&raw)
        .with_context(|| format!("Failed to parse manifest: {}", path.display()))
}

fn read_catalogue(path: &Path) -> Result<ModelCatalogue> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalogue: {}", path.display()))?;

    ModelCatalogue::parse(&raw)
        .with_context(|| format!("Failed to parse catalogue: {}", path.display()))
}

/// Print the written scripts and the skipped work
fn print_plan(plan: &PlanReport) {
    if plan.descriptors.is_empty() {
        println!("{}", "No job scripts written.".yellow());
    } else {
        println!(
            "{}",
            format!("Wrote {} job script(s):", plan.descriptors.len()).bold()
        );
        for descriptor in &plan.descriptors {
            println!(
                "  {} {} {} {}",
                "▸".cyan(),
                descriptor.canonical_id,
                descriptor.task,
                format!("[{}]", descriptor.tier).dimmed()
            );
        }
    }

    if plan.repeated > 0 {
        println!(
            "{}",
            format!("{} repeated work item(s) ignored", plan.repeated).dimmed()
        );
    }

    if !plan.skipped.is_empty() {
        println!();
        println!(
            "{}",
            format!("Skipped {} work item(s):", plan.skipped.len())
                .yellow()
                .bold()
        );
        for skipped in &plan.skipped {
            println!("  {} {}: {}", "✗".red(), skipped.item, skipped.reason);
        }
    }
}

/// Print what reached the scheduler
fn print_submit_report(report: &SubmitReport) {
    println!();
    println!(
        "{} Submitted {} job(s)",
        "✓".green(),
        report.submitted.len()
    );
    for job in &report.submitted {
        println!(
            "  {} {} {}",
            "▸".cyan(),
            job.job_id,
            job.script_path.display().to_string().dimmed()
        );
    }

    if report.remaining > 0 {
        println!(
            "{}",
            format!("⚠ {} job(s) not submitted", report.remaining).yellow()
        );
    }
}

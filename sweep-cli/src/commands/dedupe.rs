//! Dedupe command handler
//!
//! Finds jobs of ours that run the same command and cancels every copy but
//! the oldest, once or on a fixed interval.

use anyhow::Result;
use clap::Args;
use colored::*;
use std::sync::Arc;
use std::time::Duration;
use sweep_client::SlurmClient;
use sweep_runner::scheduler::{DuplicateReconciler, SweepReport};
use tracing::error;

use super::{interrupt_token, print_json};
use crate::config::Config;

/// Dedupe arguments
#[derive(Args, Debug)]
pub struct DedupeArgs {
    /// Report duplicates without cancelling them
    #[arg(long)]
    pub dry_run: bool,

    /// Sweep again every SECS seconds until interrupted
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,
}

/// Handle the dedupe command
pub async fn handle_dedupe_command(args: DedupeArgs, config: &Config) -> Result<()> {
    let reconciler = DuplicateReconciler::new(
        Arc::new(SlurmClient::with_programs(config.programs.clone())),
        config.runner.user.clone(),
        config.runner.namespace_marker.clone(),
    );

    let Some(secs) = args.watch else {
        let report = reconciler.sweep(args.dry_run).await;
        return if config.json {
            print_json(&report)
        } else {
            print_sweep_report(&report);
            Ok(())
        };
    };

    if secs == 0 {
        anyhow::bail!("--watch interval must be greater than 0");
    }

    let json = config.json;
    reconciler
        .watch(
            Duration::from_secs(secs),
            args.dry_run,
            &interrupt_token(),
            |report| {
                if !json {
                    print_sweep_report(report);
                    return;
                }
                // One report per line while watching
                match serde_json::to_string(report) {
                    Ok(line) => println!("{}", line),
                    Err(e) => error!("Failed to encode sweep report: {}", e),
                }
            },
        )
        .await;

    Ok(())
}

/// Print one sweep pass
fn print_sweep_report(report: &SweepReport) {
    let reconciliation = &report.reconciliation;

    println!(
        "{}",
        format!(
            "[{}] {} command(s) in the queue",
            report.taken_at.format("%Y-%m-%d %H:%M:%S"),
            reconciliation.all_commands.len()
        )
        .bold()
    );
    for command in &reconciliation.all_commands {
        println!("  {}", command.dimmed());
    }

    if reconciliation.duplicates.is_empty() {
        println!("{}", "No duplicate jobs found.".green());
        println!();
        return;
    }

    println!(
        "{}",
        format!(
            "Found {} duplicate group(s):",
            reconciliation.duplicates.len()
        )
        .yellow()
        .bold()
    );
    for group in &reconciliation.duplicates {
        let targets: Vec<String> = group
            .cancellation_targets()
            .iter()
            .map(|id| id.to_string())
            .collect();
        println!("  {} {}", "▸".cyan(), group.command);
        println!(
            "    Keep:   {}",
            group.kept().to_string().green()
        );
        println!("    Cancel: {}", targets.join(", ").red());
    }

    if report.dry_run {
        println!("{}", "Dry run: nothing cancelled.".yellow());
    } else {
        for job_id in &report.cancel.cancelled {
            println!("{} Cancelled job {}", "✓".green(), job_id);
        }
        for failed in &report.cancel.failed {
            println!(
                "{} Failed to cancel job {}: {}",
                "✗".red(),
                failed.job_id,
                failed.error
            );
        }
    }

    println!();
}

//! Status command handler
//!
//! Shows how many jobs the user has outstanding and how much room is left
//! under the submission ceiling.

use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use sweep_client::{SchedulerQuery, SlurmClient};

use super::print_json;
use crate::config::Config;

#[derive(Debug, Serialize)]
struct QueueStatus<'a> {
    user: &'a str,
    outstanding: usize,
    ceiling: usize,
    headroom: usize,
}

/// Handle the status command
pub async fn handle_status_command(config: &Config) -> Result<()> {
    let client = SlurmClient::with_programs(config.programs.clone());
    let user = config.runner.user.as_str();

    let outstanding = client
        .outstanding_jobs(user)
        .await
        .with_context(|| format!("Failed to count jobs for {}", user))?;

    let status = QueueStatus {
        user,
        outstanding,
        ceiling: config.runner.ceiling,
        headroom: config.runner.ceiling.saturating_sub(outstanding),
    };

    if config.json {
        return print_json(&status);
    }

    println!("{}", format!("Queue status for {}:", status.user).bold());
    println!("  Outstanding: {}", status.outstanding);
    println!("  Ceiling:     {}", status.ceiling);

    if status.outstanding > status.ceiling {
        println!(
            "{}",
            "⚠ Over the ceiling; new submissions would wait".yellow()
        );
    } else {
        println!(
            "{} Within the ceiling; submissions proceed ({} to spare)",
            "✓".green(),
            status.headroom
        );
    }

    Ok(())
}

//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod dedupe;
mod launch;
mod status;

pub use dedupe::DedupeArgs;
pub use launch::LaunchArgs;

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Write job scripts for missing results and submit them
    Launch(LaunchArgs),
    /// Cancel duplicate copies of running jobs
    Dedupe(DedupeArgs),
    /// Show outstanding jobs against the ceiling
    Status,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Launch(args) => launch::handle_launch_command(args, config).await,
        Commands::Dedupe(args) => dedupe::handle_dedupe_command(args, config).await,
        Commands::Status => status::handle_status_command(config).await,
    }
}

/// Token that is cancelled on the first Ctrl-C
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; finishing the current step");
            trigger.cancel();
        }
    });

    token
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

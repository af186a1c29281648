//! Sweep Runner
//!
//! Orchestration layer for launching benchmark evaluations on a shared
//! batch cluster.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Services: Model resolution, tier selection and job script rendering
//! - Scheduler: Admission-controlled submission and duplicate reconciliation
//! - Pipeline: The one-shot resolve → render → submit flow
//!
//! All scheduler access goes through the `sweep-client` traits, so every
//! component can be driven by an in-memory scheduler.

pub mod config;
pub mod pipeline;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use pipeline::{PlanReport, launch, plan, render};

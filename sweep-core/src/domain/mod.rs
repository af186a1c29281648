//! Core domain types
//!
//! This module contains the structures that flow through the launch pipeline
//! (work item → resolved model → tier → job descriptor → submitted job) and the
//! snapshots read back from the cluster scheduler during reconciliation.

pub mod job;
pub mod tier;
pub mod work;

//! Sweep Core
//!
//! Core types shared by the Sweep evaluation launcher.
//!
//! This crate contains:
//! - Domain types: work items, resolved models, resource tiers, job descriptors
//!   and scheduler job snapshots
//! - DTOs: the input documents (missing-results manifest, model catalogue)

pub mod domain;
pub mod dto;

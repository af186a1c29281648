//! Service layer
//!
//! Services contain the pure decision logic of the launch pipeline:
//! resolving model names, choosing a resource tier and rendering job
//! scripts. None of them talk to the scheduler.

mod descriptor;
mod resolver;
mod tier;

pub use descriptor::{DescriptorBuilder, SCRIPT_EXTENSION};
pub use resolver::{
    MatchStrategy, ModelResolver, RESOLUTION_ORDER, ResolveError, Resolution, ResolvedWork,
    SkippedItem,
};
pub use tier::TierSelector;

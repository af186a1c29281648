//! Resource tier domain types
//!
//! A resource tier decides which scheduler template a job is rendered with.
//! The markers that select a tier and the templates themselves are plain data
//! (`TierPolicy`) so a site can replace them with a JSON file.

use serde::{Deserialize, Serialize};

/// Resource class a (model, task) pair is scheduled on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceTier {
    /// Single accelerator
    Standard,

    /// Multiple accelerators, for large models or heavy tasks
    HighCapacity,
}

impl std::fmt::Display for ResourceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceTier::Standard => write!(f, "standard"),
            ResourceTier::HighCapacity => write!(f, "high_capacity"),
        }
    }
}

/// Scheduler template for one tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTemplate {
    /// Script header (shebang and `#SBATCH` directives) placed before the command
    pub prelude: String,

    /// Batch size passed to the benchmark runner
    pub batch_size: u32,

    /// Whether the runner tracks emissions
    #[serde(default = "default_co2_tracker")]
    pub co2_tracker: bool,
}

fn default_co2_tracker() -> bool {
    true
}

/// Tier selection rules and the template of every tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPolicy {
    /// Substrings of a canonical model id that force `HighCapacity`
    #[serde(default)]
    pub large_model_markers: Vec<String>,

    /// Substrings of a task name that force `HighCapacity`
    #[serde(default)]
    pub heavy_task_markers: Vec<String>,

    pub standard: TierTemplate,
    pub high_capacity: TierTemplate,
}

impl TierPolicy {
    /// Returns the template for a tier
    pub fn template(&self, tier: ResourceTier) -> &TierTemplate {
        match tier {
            ResourceTier::Standard => &self.standard,
            ResourceTier::HighCapacity => &self.high_capacity,
        }
    }

    /// Parses a policy from its JSON representation
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }
}

const STANDARD_PRELUDE: &str = "#!/bin/bash
#SBATCH --job-name=sweep
#SBATCH --nodes=1
#SBATCH --partition=a3mixedlow
#SBATCH --gres=gpu:1
#SBATCH --time 30-00:00:00
#SBATCH --output=%x-%j.out";

const HIGH_CAPACITY_PRELUDE: &str = "#!/bin/bash
#SBATCH --job-name=sweep
#SBATCH --nodes=1
#SBATCH --partition=a3low
#SBATCH --gres=gpu:8
#SBATCH --time 30-00:00:00
#SBATCH --output=%x-%j.out";

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            large_model_markers: ["GritLM", "SFR", "gte-Qwen", "e5-mistral-7b-instruct"]
                .into_iter()
                .map(String::from)
                .collect(),
            heavy_task_markers: vec!["MSMARCO".to_string()],
            standard: TierTemplate {
                prelude: STANDARD_PRELUDE.to_string(),
                batch_size: 4,
                co2_tracker: true,
            },
            high_capacity: TierTemplate {
                prelude: HIGH_CAPACITY_PRELUDE.to_string(),
                batch_size: 4,
                co2_tracker: true,
            },
        }
    }
}

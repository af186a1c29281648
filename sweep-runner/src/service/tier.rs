//! Resource tier selection
//!
//! Decides whether a (model, task) pair needs the multi-accelerator template.
//! The decision is a pure function of the ids and the configured markers.

use sweep_core::domain::tier::{ResourceTier, TierPolicy};

/// Classifies work into resource tiers by marker substrings
#[derive(Debug, Clone, Default)]
pub struct TierSelector {
    large_model_markers: Vec<String>,
    heavy_task_markers: Vec<String>,
}

impl TierSelector {
    /// Creates a selector from explicit marker lists
    ///
    /// Empty markers are dropped, since they would match everything.
    pub fn new(large_model_markers: Vec<String>, heavy_task_markers: Vec<String>) -> Self {
        let non_empty = |markers: Vec<String>| -> Vec<String> {
            markers.into_iter().filter(|m| !m.is_empty()).collect()
        };

        Self {
            large_model_markers: non_empty(large_model_markers),
            heavy_task_markers: non_empty(heavy_task_markers),
        }
    }

    pub fn from_policy(policy: &TierPolicy) -> Self {
        Self::new(
            policy.large_model_markers.clone(),
            policy.heavy_task_markers.clone(),
        )
    }

    /// Selects the tier for a canonical model id and task name
    pub fn select(&self, canonical_id: &str, task: &str) -> ResourceTier {
        let large_model = self
            .large_model_markers
            .iter()
            .any(|m| canonical_id.contains(m.as_str()));
        let heavy_task = self
            .heavy_task_markers
            .iter()
            .any(|m| task.contains(m.as_str()));

        if large_model || heavy_task {
            ResourceTier::HighCapacity
        } else {
            ResourceTier::Standard
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_markers() {
        let selector = TierSelector::from_policy(&TierPolicy::default());

        assert_eq!(
            selector.select("GritLM/GritLM-7B", "Banking77Classification"),
            ResourceTier::HighCapacity
        );
        assert_eq!(
            selector.select("intfloat/e5-mistral-7b-instruct", "STS12"),
            ResourceTier::HighCapacity
        );
        assert_eq!(
            selector.select("intfloat/e5-small", "MSMARCO"),
            ResourceTier::HighCapacity
        );
        assert_eq!(
            selector.select("intfloat/e5-small", "STS12"),
            ResourceTier::Standard
        );
    }

    #[test]
    fn test_markers_are_case_sensitive_substrings() {
        let selector = TierSelector::new(vec!["Big".to_string()], vec![]);
        assert_eq!(selector.select("org/Big-1", "t"), ResourceTier::HighCapacity);
        assert_eq!(selector.select("org/big-1", "t"), ResourceTier::Standard);
    }

    #[test]
    fn test_empty_markers_are_ignored() {
        let selector = TierSelector::new(vec![String::new()], vec![String::new()]);
        assert_eq!(selector.select("org/model", "task"), ResourceTier::Standard);
    }

    #[test]
    fn test_no_markers_means_standard() {
        let selector = TierSelector::default();
        assert_eq!(selector.select("GritLM/GritLM-7B", "MSMARCO"), ResourceTier::Standard);
    }
}

//! Work domain types
//!
//! A work item is one (benchmark, model, task) evaluation that still lacks a
//! result. Work items are produced from a missing-results manifest or from an
//! explicit model × task matrix and are never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Benchmark name used for work built from an explicit model × task matrix
pub const ADHOC_BENCHMARK: &str = "adhoc";

/// One unit of missing evaluation work
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    pub benchmark: String,
    /// Symbolic model name as written in the manifest, not yet resolved
    pub model_query: String,
    pub task: String,
}

impl WorkItem {
    pub fn new(
        benchmark: impl Into<String>,
        model_query: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        Self {
            benchmark: benchmark.into(),
            model_query: model_query.into(),
            task: task.into(),
        }
    }
}

impl std::fmt::Display for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.benchmark, self.model_query, self.task)
    }
}

/// A model query resolved against the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedModel {
    pub canonical_id: String,
}

impl ResolvedModel {
    pub fn new(canonical_id: impl Into<String>) -> Self {
        Self {
            canonical_id: canonical_id.into(),
        }
    }

    /// Canonical id made safe for use in a file name (`org/name` → `org__name`)
    pub fn sanitized(&self) -> String {
        sanitize_model_id(&self.canonical_id)
    }
}

impl std::fmt::Display for ResolvedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_id)
    }
}

/// Replaces path separators in a model id with a double underscore
pub fn sanitize_model_id(canonical_id: &str) -> String {
    canonical_id.replace('/', "__")
}

/// Full cross product of models and tasks
///
/// Used when launching a fixed set of models over a fixed set of tasks without
/// a missing-results manifest. Items are ordered model-major, in input order.
#[derive(Debug, Clone, Default)]
pub struct WorkMatrix {
    items: Vec<WorkItem>,
}

impl WorkMatrix {
    pub fn cross<M, T>(models: &[M], tasks: &[T]) -> Self
    where
        M: AsRef<str>,
        T: AsRef<str>,
    {
        let items = models
            .iter()
            .flat_map(|model| {
                tasks
                    .iter()
                    .map(move |task| WorkItem::new(ADHOC_BENCHMARK, model.as_ref(), task.as_ref()))
            })
            .collect();

        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<WorkItem> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_model_id() {
        assert_eq!(sanitize_model_id("GritLM/GritLM-7B"), "GritLM__GritLM-7B");
        assert_eq!(sanitize_model_id("a/b/c"), "a__b__c");
        assert_eq!(sanitize_model_id("plain"), "plain");
    }

    #[test]
    fn test_resolved_model_sanitized() {
        let model = ResolvedModel::new("intfloat/e5-mistral-7b-instruct");
        assert_eq!(model.sanitized(), "intfloat__e5-mistral-7b-instruct");
    }

    #[test]
    fn test_matrix_cross_is_model_major() {
        let matrix = WorkMatrix::cross(&["m1", "m2"], &["t1", "t2", "t3"]);
        assert_eq!(matrix.len(), 6);

        let items = matrix.into_items();
        assert_eq!(items[0], WorkItem::new(ADHOC_BENCHMARK, "m1", "t1"));
        assert_eq!(items[2], WorkItem::new(ADHOC_BENCHMARK, "m1", "t3"));
        assert_eq!(items[3], WorkItem::new(ADHOC_BENCHMARK, "m2", "t1"));
    }

    #[test]
    fn test_matrix_cross_empty_side() {
        let tasks: [&str; 0] = [];
        assert!(WorkMatrix::cross(&["m1"], &tasks).is_empty());
    }
}

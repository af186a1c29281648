//! Missing-results manifest
//!
//! A JSON object of the form `{benchmark: {model_query: [task, ...]}}`.
//! Document order is kept, since it decides submission order.

use serde_json::{Map, Value};

use crate::domain::work::WorkItem;

/// Tasks still missing for one model query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTasks {
    pub model_query: String,
    pub tasks: Vec<String>,
}

/// Models with missing results within one benchmark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkEntry {
    pub benchmark: String,
    pub models: Vec<ModelTasks>,
}

/// Parsed missing-results manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingResults {
    pub benchmarks: Vec<BenchmarkEntry>,
}

impl MissingResults {
    /// Parses a manifest from JSON, keeping document order
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        let root: Map<String, Value> = serde_json::from_str(input)?;

        let mut benchmarks = Vec::with_capacity(root.len());
        for (benchmark, models) in root {
            let models: Map<String, Value> = serde_json::from_value(models)?;

            let mut entries = Vec::with_capacity(models.len());
            for (model_query, tasks) in models {
                let tasks: Vec<String> = serde_json::from_value(tasks)?;
                entries.push(ModelTasks { model_query, tasks });
            }

            benchmarks.push(BenchmarkEntry {
                benchmark,
                models: entries,
            });
        }

        Ok(Self { benchmarks })
    }

    /// Flattens the manifest into work items in document order
    pub fn work_items(&self) -> Vec<WorkItem> {
        self.benchmarks
            .iter()
            .flat_map(|bench| {
                bench.models.iter().flat_map(move |model| {
                    model
                        .tasks
                        .iter()
                        .map(move |task| WorkItem::new(&bench.benchmark, &model.model_query, task))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_keeps_document_order() {
        let json = r#"{
            "MTEB(eng)": { "zeta-model": ["TaskB", "TaskA"], "alpha-model": ["TaskC"] },
            "LongEmbed": { "beta-model": ["TaskD"] }
        }"#;

        let manifest = MissingResults::from_json(json).unwrap();
        assert_eq!(manifest.benchmarks.len(), 2);
        assert_eq!(manifest.benchmarks[0].benchmark, "MTEB(eng)");
        assert_eq!(manifest.benchmarks[0].models[0].model_query, "zeta-model");

        let items = manifest.work_items();
        let tasks: Vec<&str> = items.iter().map(|i| i.task.as_str()).collect();
        assert_eq!(tasks, vec!["TaskB", "TaskA", "TaskC", "TaskD"]);
        assert_eq!(items[3], WorkItem::new("LongEmbed", "beta-model", "TaskD"));
    }

    #[test]
    fn test_manifest_rejects_non_list_tasks() {
        let json = r#"{ "bench": { "model": "TaskA" } }"#;
        assert!(MissingResults::from_json(json).is_err());
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = MissingResults::from_json("{}").unwrap();
        assert!(manifest.work_items().is_empty());
    }
}

//! Model resolver
//!
//! Resolves the symbolic model names used in a missing-results manifest to
//! canonical catalogue ids. Strategies run from strictest to loosest and the
//! first one that matches anything decides the outcome: one match resolves,
//! more than one is rejected as ambiguous, never guessed.

use serde::Serialize;
use std::collections::HashMap;
use sweep_core::domain::work::{ResolvedModel, WorkItem};
use sweep_core::dto::catalogue::ModelCatalogue;
use thiserror::Error;
use tracing::{debug, warn};

/// One way of matching a query against a canonical id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Last path segment equals the query
    Exact,

    /// Last path segment contains the query
    NameSubstring,

    /// Full id (organisation included) contains the query
    FullSubstring,
}

/// Strategies in the order they are tried
pub const RESOLUTION_ORDER: [MatchStrategy; 3] = [
    MatchStrategy::Exact,
    MatchStrategy::NameSubstring,
    MatchStrategy::FullSubstring,
];

impl MatchStrategy {
    /// Checks whether `canonical_id` matches `query` under this strategy
    pub fn matches(self, query: &str, canonical_id: &str) -> bool {
        let name = canonical_id.rsplit('/').next().unwrap_or(canonical_id);
        match self {
            MatchStrategy::Exact => name == query,
            MatchStrategy::NameSubstring => name.contains(query),
            MatchStrategy::FullSubstring => canonical_id.contains(query),
        }
    }
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStrategy::Exact => write!(f, "exact name"),
            MatchStrategy::NameSubstring => write!(f, "name substring"),
            MatchStrategy::FullSubstring => write!(f, "full id substring"),
        }
    }
}

/// Why a model query could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveError {
    #[error("model not found: '{query}'")]
    NotFound { query: String },

    #[error("ambiguous model match for '{query}' ({strategy}): {}", .candidates.join(", "))]
    Ambiguous {
        query: String,
        strategy: MatchStrategy,
        candidates: Vec<String>,
    },
}

/// A work item whose model was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWork {
    pub item: WorkItem,
    pub model: ResolvedModel,
}

/// A work item dropped during resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub item: WorkItem,
    pub reason: ResolveError,
}

/// Outcome of resolving a batch of work items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub resolved: Vec<ResolvedWork>,
    pub skipped: Vec<SkippedItem>,
}

impl Resolution {
    /// Treats every model query as an already canonical id
    ///
    /// Used for explicit model lists, where no catalogue lookup is wanted.
    pub fn verbatim(items: Vec<WorkItem>) -> Self {
        let resolved = items
            .into_iter()
            .map(|item| ResolvedWork {
                model: ResolvedModel::new(item.model_query.as_str()),
                item,
            })
            .collect();

        Self {
            resolved,
            skipped: Vec::new(),
        }
    }
}

/// Resolves model queries against a catalogue
pub struct ModelResolver<'a> {
    catalogue: &'a ModelCatalogue,
}

impl<'a> ModelResolver<'a> {
    pub fn new(catalogue: &'a ModelCatalogue) -> Self {
        Self { catalogue }
    }

    /// Resolves one query to exactly one canonical id
    ///
    /// # Errors
    /// Returns an error if:
    /// - No strategy matches any catalogue entry
    /// - The first strategy with matches finds more than one (ambiguous)
    pub fn resolve(&self, query: &str) -> Result<ResolvedModel, ResolveError> {
        for strategy in RESOLUTION_ORDER {
            let matches: Vec<&String> = self
                .catalogue
                .ids()
                .iter()
                .filter(|id| strategy.matches(query, id))
                .collect();

            match matches.len() {
                0 => {
                    debug!("No {} match for model '{}'", strategy, query);
                    continue;
                }
                1 => return Ok(ResolvedModel::new(matches[0].as_str())),
                _ => {
                    return Err(ResolveError::Ambiguous {
                        query: query.to_string(),
                        strategy,
                        candidates: matches.into_iter().cloned().collect(),
                    });
                }
            }
        }

        Err(ResolveError::NotFound {
            query: query.to_string(),
        })
    }

    /// Resolves a batch of work items, skipping the ones that fail
    ///
    /// Each distinct query is resolved once; work order is preserved.
    pub fn resolve_work(&self, items: Vec<WorkItem>) -> Resolution {
        let mut cache: HashMap<String, Result<ResolvedModel, ResolveError>> = HashMap::new();
        let mut resolution = Resolution::default();

        for item in items {
            let outcome = cache
                .entry(item.model_query.clone())
                .or_insert_with(|| {
                    let outcome = self.resolve(&item.model_query);
                    if let Err(e) = &outcome {
                        warn!("Skipping model '{}': {}", item.model_query, e);
                    }
                    outcome
                })
                .clone();

            match outcome {
                Ok(model) => resolution.resolved.push(ResolvedWork { item, model }),
                Err(reason) => resolution.skipped.push(SkippedItem { item, reason }),
            }
        }

        resolution
    }
}

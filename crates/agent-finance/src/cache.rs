//! Per-kind analyst cache
//!
//! Each key owns a `OnceCell`, so concurrent first users of a kind wait on the
//! same construction instead of racing. A failed construction leaves the cell
//! empty and the next caller retries.

use crate::error::Result;
use agent_core::Analyst;
use agent_llm::{ComplexityTier, Selection};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Cache key: sub-task kind at a routing tier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentKey {
    /// Sub-task kind
    pub kind: String,
    /// Tier the analyst was routed at
    pub tier: ComplexityTier,
}

impl AgentKey {
    /// Create a new key
    pub fn new(kind: impl Into<String>, tier: ComplexityTier) -> Self {
        Self {
            kind: kind.into(),
            tier,
        }
    }
}

impl fmt::Display for AgentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind, self.tier)
    }
}

/// An analyst together with the selection it was built for
#[derive(Clone)]
pub struct CachedAnalyst {
    /// Provider/model the analyst is bound to
    pub selection: Selection,
    /// The analyst
    pub analyst: Arc<dyn Analyst>,
}

impl fmt::Debug for CachedAnalyst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedAnalyst")
            .field("selection", &self.selection)
            .field("analyst", &self.analyst.name())
            .finish()
    }
}

/// Thread-safe cache of analysts
#[derive(Default)]
pub struct AgentCache {
    cells: Mutex<HashMap<AgentKey, Arc<OnceCell<CachedAnalyst>>>>,
}

impl AgentCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the analyst for `key`, building it with `init` on first use
    ///
    /// `init` runs at most once per key unless it fails.
    pub async fn get_or_try_init<F, Fut>(&self, key: &AgentKey, init: F) -> Result<CachedAnalyst>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedAnalyst>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            Arc::clone(cells.entry(key.clone()).or_default())
        };

        if let Some(cached) = cell.get() {
            tracing::debug!(%key, "Analyst cache hit");
            return Ok(cached.clone());
        }

        let cached = cell.get_or_try_init(init).await?;
        Ok(cached.clone())
    }

    /// Whether an analyst has been built for `key`
    pub async fn contains(&self, key: &AgentKey) -> bool {
        let cells = self.cells.lock().await;
        cells.get(key).is_some_and(|cell| cell.initialized())
    }

    /// Number of built analysts
    pub async fn len(&self) -> usize {
        let cells = self.cells.lock().await;
        cells.values().filter(|cell| cell.initialized()).count()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every cached analyst
    pub async fn clear(&self) {
        let mut cells = self.cells.lock().await;
        cells.clear();
    }
}

impl fmt::Debug for AgentCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentCache").finish_non_exhaustive()
    }
}

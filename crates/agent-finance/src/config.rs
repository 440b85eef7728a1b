//! Configuration for analysis coordination

use crate::error::{FinanceError, Result};
use agent_llm::{ProviderId, Selection};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of sub-tasks in flight at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Configuration for the task coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Upper bound on concurrently executing sub-tasks
    pub max_concurrency: usize,

    /// Run sub-tasks concurrently; `false` forces one at a time
    pub parallel: bool,

    /// Time budget for each sub-task once it starts running
    pub task_timeout: Option<Duration>,

    /// Time budget for a whole sub-task batch; each asset in a
    /// batch-of-batches gets its own
    pub batch_timeout: Option<Duration>,

    /// Maximum average cost per 1M tokens when routing
    pub cost_ceiling: Option<f64>,

    /// Provider override applied to every sub-task
    pub default_provider: Option<ProviderId>,

    /// Model override applied to every sub-task
    pub default_model: Option<String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            parallel: true,
            task_timeout: None,
            batch_timeout: None,
            cost_ceiling: None,
            default_provider: None,
            default_model: None,
        }
    }
}

impl CoordinatorConfig {
    /// Create a new configuration builder
    pub fn builder() -> CoordinatorConfigBuilder {
        CoordinatorConfigBuilder::default()
    }

    /// Overlay settings from `AGENT_*` environment variables
    pub fn with_env(self) -> Result<Self> {
        self.with_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay settings from an arbitrary variable lookup
    pub fn with_lookup<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get("AGENT_MAX_CONCURRENCY") {
            self.max_concurrency = value.trim().parse().map_err(|_| {
                FinanceError::ConfigError(format!("AGENT_MAX_CONCURRENCY is not a number: {value}"))
            })?;
        }
        if let Some(value) = get("AGENT_COST_CEILING") {
            let ceiling = value.trim().parse().map_err(|_| {
                FinanceError::ConfigError(format!("AGENT_COST_CEILING is not a number: {value}"))
            })?;
            self.cost_ceiling = Some(ceiling);
        }
        if let Some(value) = get("AGENT_DEFAULT_PROVIDER") {
            self.default_provider = Some(
                value.parse().map_err(|e| {
                    FinanceError::ConfigError(format!("AGENT_DEFAULT_PROVIDER: {e}"))
                })?,
            );
        }
        if let Some(value) = get("AGENT_DEFAULT_MODEL") {
            self.default_model = Some(value);
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(FinanceError::ConfigError(
                "max_concurrency must be greater than 0".to_string(),
            ));
        }

        if let Some(ceiling) = self.cost_ceiling {
            if !ceiling.is_finite() || ceiling < 0.0 {
                return Err(FinanceError::ConfigError(format!(
                    "cost_ceiling must be a non-negative number, got {ceiling}"
                )));
            }
        }

        if self.default_provider.is_some() != self.default_model.is_some() {
            return Err(FinanceError::ConfigError(
                "default_provider and default_model must be set together".to_string(),
            ));
        }

        for (label, timeout) in [
            ("task_timeout", self.task_timeout),
            ("batch_timeout", self.batch_timeout),
        ] {
            if timeout.is_some_and(|t| t.is_zero()) {
                return Err(FinanceError::ConfigError(format!("{label} must be non-zero")));
            }
        }

        Ok(())
    }

    /// Concurrency actually used by the worker pool
    pub fn effective_concurrency(&self) -> usize {
        if self.parallel { self.max_concurrency.max(1) } else { 1 }
    }

    /// Explicit provider/model override, if configured
    pub fn preferred_selection(&self) -> Option<Selection> {
        match (self.default_provider, &self.default_model) {
            (Some(provider), Some(model)) => Some(Selection::new(provider, model.clone())),
            _ => None,
        }
    }
}

/// Builder for CoordinatorConfig
#[derive(Debug, Default)]
pub struct CoordinatorConfigBuilder {
    max_concurrency: Option<usize>,
    parallel: Option<bool>,
    task_timeout: Option<Duration>,
    batch_timeout: Option<Duration>,
    cost_ceiling: Option<f64>,
    default_provider: Option<ProviderId>,
    default_model: Option<String>,
}

impl CoordinatorConfigBuilder {
    /// Set the concurrency cap
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }

    /// Enable or disable parallel execution
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    /// Set the per sub-task timeout
    pub fn task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    /// Set the whole-batch timeout
    pub fn batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = Some(timeout);
        self
    }

    /// Set the routing cost ceiling
    pub fn cost_ceiling(mut self, ceiling: f64) -> Self {
        self.cost_ceiling = Some(ceiling);
        self
    }

    /// Route every sub-task to this provider/model when available
    pub fn default_selection(mut self, provider: ProviderId, model: impl Into<String>) -> Self {
        self.default_provider = Some(provider);
        self.default_model = Some(model.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<CoordinatorConfig> {
        let defaults = CoordinatorConfig::default();

        let config = CoordinatorConfig {
            max_concurrency: self.max_concurrency.unwrap_or(defaults.max_concurrency),
            parallel: self.parallel.unwrap_or(defaults.parallel),
            task_timeout: self.task_timeout,
            batch_timeout: self.batch_timeout,
            cost_ceiling: self.cost_ceiling,
            default_provider: self.default_provider,
            default_model: self.default_model,
        };

        config.validate()?;
        Ok(config)
    }
}

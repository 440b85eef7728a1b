//! Result records produced by the coordinator

use crate::aggregator::ConsensusVerdict;
use crate::task::AssetType;
use agent_llm::ProviderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output of a successful sub-task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// Free-text analysis
    pub analysis: String,
    /// Structured payload from the analyst, passed through untouched
    #[serde(default)]
    pub data: serde_json::Value,
    /// Provider that served the analysis
    pub provider: ProviderId,
    /// Model that served the analysis
    pub model: String,
    /// When the sub-task settled
    pub timestamp: DateTime<Utc>,
}

/// A sub-task that did not produce output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTaskFailure {
    /// Sub-task name
    pub name: String,
    /// Error description
    pub error: String,
}

/// Outcome of one sub-task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubTaskResult {
    /// The analyst returned a report
    Success(AnalysisOutput),
    /// Routing, construction, execution, timeout, or cancellation failed
    Failure(SubTaskFailure),
}

impl SubTaskResult {
    /// Record a failure
    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Failure(SubTaskFailure {
            name: name.into(),
            error: error.into(),
        })
    }

    /// Whether the sub-task succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Analysis text of a success
    pub fn analysis(&self) -> Option<&str> {
        match self {
            Self::Success(output) => Some(&output.analysis),
            Self::Failure(_) => None,
        }
    }

    /// Error description of a failure
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(&failure.error),
        }
    }
}

/// Aggregated result of one asset's batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedAnalysis {
    /// Asset the batch was run for
    pub primary_key: String,
    /// Asset class
    pub asset_type: AssetType,
    /// When aggregation finished
    pub timestamp: DateTime<Utc>,
    /// Every sub-task outcome keyed by name
    pub analyses: BTreeMap<String, SubTaskResult>,
    /// One line per sub-task
    pub summary: String,
    /// Reduced verdict
    pub consensus: ConsensusVerdict,
}

/// Per-asset entry of a batch-of-batches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetOutcome {
    /// The asset's pipeline completed
    Analysis(Box<AggregatedAnalysis>),
    /// The asset's pipeline failed as a whole
    Error {
        /// Error description
        error: String,
    },
}

impl AssetOutcome {
    /// The aggregated analysis, if the pipeline completed
    pub fn analysis(&self) -> Option<&AggregatedAnalysis> {
        match self {
            Self::Analysis(analysis) => Some(&**analysis),
            Self::Error { .. } => None,
        }
    }
}

/// Result of analyzing several assets at once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAnalysis {
    /// Always true; marks the record as a batch
    pub batch: bool,
    /// Asset class of every entry
    pub asset_type: AssetType,
    /// Number of assets requested
    pub total_analyzed: usize,
    /// One outcome per asset
    pub results: BTreeMap<String, AssetOutcome>,
    /// When the batch finished
    pub timestamp: DateTime<Utc>,
}

/// Side-by-side comparison of several assets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetComparison {
    /// Asset class being compared
    pub comparison_type: AssetType,
    /// Assets in request order
    pub assets: Vec<String>,
    /// One sub-task outcome per asset
    pub results: BTreeMap<String, SubTaskResult>,
    /// Verdict across all assets
    pub consensus: ConsensusVerdict,
    /// When the comparison finished
    pub timestamp: DateTime<Utc>,
}

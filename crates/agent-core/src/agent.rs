//! Analyst trait definition

use crate::{Result, TaskArgs};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Output of a single analyst call
///
/// `analysis` is the free-text answer produced by the model; `data` is
/// whatever structured payload the analyst gathered along the way. The
/// coordination layer only ever reads `analysis`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalystReport {
    /// Free-text analysis
    pub analysis: String,
    /// Opaque structured payload
    #[serde(default)]
    pub data: serde_json::Value,
}

impl AnalystReport {
    /// Create a report with no structured payload
    pub fn new(analysis: impl Into<String>) -> Self {
        Self {
            analysis: analysis.into(),
            data: serde_json::Value::Null,
        }
    }

    /// Attach a structured payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Core trait that all analysis agents implement
///
/// An analyst is bound to a single provider/model when it is built and is
/// shared across concurrent calls, so implementations must be `Send + Sync`.
#[async_trait]
pub trait Analyst: Send + Sync {
    /// Analyze one asset
    async fn analyze(&self, asset: &str, args: &TaskArgs) -> Result<AnalystReport>;

    /// Get the analyst's name
    fn name(&self) -> &str;
}

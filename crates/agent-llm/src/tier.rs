//! Task complexity tiers

use crate::RouterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Required reasoning depth for a task
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    /// Quick lookups, simple queries
    Simple,
    /// Standard analysis
    #[default]
    Moderate,
    /// Deep analysis, reasoning
    Complex,
    /// High-stakes decisions
    Critical,
}

impl ComplexityTier {
    /// All tiers, lowest first
    pub const ALL: [ComplexityTier; 4] = [
        ComplexityTier::Simple,
        ComplexityTier::Moderate,
        ComplexityTier::Complex,
        ComplexityTier::Critical,
    ];

    /// Stable lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
            Self::Critical => "critical",
        }
    }

    /// Map a task-type label to a tier
    ///
    /// Unrecognized labels are treated as moderate.
    pub fn from_task_type(task_type: &str) -> Self {
        match task_type {
            "quick_lookup" | "screening" => Self::Simple,
            "comparison" => Self::Moderate,
            "analysis" => Self::Complex,
            "deep_analysis" => Self::Critical,
            _ => Self::Moderate,
        }
    }
}

impl fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplexityTier {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "moderate" => Ok(Self::Moderate),
            "complex" => Ok(Self::Complex),
            "critical" => Ok(Self::Critical),
            other => Err(RouterError::UnknownTier(other.to_string())),
        }
    }
}

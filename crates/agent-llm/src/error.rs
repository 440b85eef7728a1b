//! Error types for provider routing

use crate::ComplexityTier;
use thiserror::Error;

/// Result type for routing operations
pub type Result<T> = std::result::Result<T, RouterError>;

/// Errors that can occur while building a registry or selecting a provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouterError {
    /// No credentialed provider can serve the request
    #[error("No LLM providers available{}. Please configure API keys.", tier_suffix(.tier))]
    NoProviderAvailable {
        /// Tier being routed, if the request was tier-based
        tier: Option<ComplexityTier>,
    },

    /// The registry tables are inconsistent
    #[error("Invalid router configuration: {0}")]
    InvalidConfiguration(String),

    /// Cost ceiling that is negative or not a number
    #[error("Invalid cost ceiling: {0} (expected a non-negative number)")]
    InvalidCostCeiling(f64),

    /// Unrecognized provider identifier
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Unrecognized complexity tier
    #[error("Unknown complexity tier: {0}")]
    UnknownTier(String),
}

fn tier_suffix(tier: &Option<ComplexityTier>) -> String {
    tier.map(|t| format!(" for {t} tasks")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RouterError::NoProviderAvailable {
            tier: Some(ComplexityTier::Critical),
        };
        assert_eq!(
            err.to_string(),
            "No LLM providers available for critical tasks. Please configure API keys."
        );

        let err = RouterError::NoProviderAvailable { tier: None };
        assert_eq!(
            err.to_string(),
            "No LLM providers available. Please configure API keys."
        );

        let err = RouterError::UnknownProvider("mistral".to_string());
        assert_eq!(err.to_string(), "Unknown provider: mistral");

        let err = RouterError::InvalidCostCeiling(-1.5);
        assert_eq!(
            err.to_string(),
            "Invalid cost ceiling: -1.5 (expected a non-negative number)"
        );
    }
}

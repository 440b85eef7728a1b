//! Error types for agent-core

use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// Agent initialization failed
    #[error("Agent initialization failed: {0}")]
    InitializationFailed(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ProcessingFailed("upstream timeout".to_string());
        assert_eq!(err.to_string(), "Agent processing failed: upstream timeout");

        let err = Error::InitializationFailed("missing credentials".to_string());
        assert_eq!(err.to_string(), "Agent initialization failed: missing credentials");
    }
}

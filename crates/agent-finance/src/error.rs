//! Error types for analysis coordination

use agent_llm::RouterError;
use std::time::Duration;
use thiserror::Error;

/// Coordination specific errors
#[derive(Debug, Error)]
pub enum FinanceError {
    /// No provider could be selected for a sub-task
    #[error("Routing error: {0}")]
    Routing(#[from] RouterError),

    /// The agent behind a sub-task failed
    #[error("Sub-task '{name}' failed: {message}")]
    SubTaskExecution {
        name: String,
        message: String,
    },

    /// No handler is registered for a sub-task kind
    #[error("Unknown sub-task type: {0}")]
    UnknownSubTaskType(String),

    /// Two sub-tasks in one batch share a name
    #[error("Duplicate sub-task name: {0}")]
    DuplicateSubTask(String),

    /// A sub-task exceeded its time budget
    #[error("Sub-task '{name}' timed out after {timeout:?}")]
    TimedOut {
        name: String,
        timeout: Duration,
    },

    /// A sub-task was cancelled before it settled
    #[error("Sub-task '{0}' was cancelled")]
    Cancelled(String),

    /// Asset type outside stock/crypto
    #[error("Unsupported asset type: {0}")]
    UnsupportedAssetType(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for coordination operations
pub type Result<T> = std::result::Result<T, FinanceError>;

impl FinanceError {
    /// Whether this error came from cancellation rather than the work itself
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Whether this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

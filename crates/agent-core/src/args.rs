//! Opaque argument bag passed to analysts
//!
//! `TaskArgs` is a flexible key-value store that travels with every sub-task.
//! The coordination layer never interprets it; analysts read the keys they
//! understand and ignore the rest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known argument keys used by the bundled sub-task kinds
pub mod keys {
    /// Whether a crypto analysis should include on-chain metrics
    pub const INCLUDE_ONCHAIN: &str = "include_onchain";
    /// Chart interval for technical analysis (e.g., "1D", "1h")
    pub const INTERVAL: &str = "interval";
}

/// Arguments handed to an [`Analyst`](crate::Analyst) call
///
/// # Example
///
/// ```
/// use agent_core::TaskArgs;
///
/// let args = TaskArgs::new()
///     .with("include_onchain", true)
///     .with("interval", "1D");
///
/// assert_eq!(args.get_bool("include_onchain"), Some(true));
/// assert_eq!(args.get_str("interval"), Some("1D"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskArgs {
    data: BTreeMap<String, serde_json::Value>,
}

impl TaskArgs {
    /// Create an empty argument bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, replacing any previous value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Get a raw value
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Get a string value
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    /// Get a boolean value
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(serde_json::Value::as_bool)
    }

    /// Check if a key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if there are no arguments
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut args = TaskArgs::new();
        assert!(args.is_empty());

        args.insert(keys::INTERVAL, "1W");
        assert_eq!(args.len(), 1);
        assert!(args.contains_key(keys::INTERVAL));
        assert_eq!(args.get_str(keys::INTERVAL), Some("1W"));
        assert_eq!(args.get_bool(keys::INTERVAL), None);
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let args = TaskArgs::new().with(keys::INCLUDE_ONCHAIN, true);
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(json, serde_json::json!({"include_onchain": true}));
    }
}

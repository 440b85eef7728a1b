//! LLM provider routing for agent-rs
//!
//! This crate decides which provider and model should serve a task. It includes:
//!
//! - Provider identifiers and credential checks
//! - Complexity tiers and task-type mapping
//! - A registry of model pricing, tier preferences, and fallbacks
//! - A router applying availability, overrides, and cost ceilings
//!
//! No network calls are made here; callers receive a [`Selection`] and build
//! their client from it.

pub mod error;
pub mod model;
pub mod provider;
pub mod registry;
pub mod router;
pub mod tier;

// Re-export main types
pub use error::{Result, RouterError};
pub use model::ModelSpec;
pub use provider::{CredentialCheck, EnvCredentials, ProviderId, StaticCredentials};
pub use registry::{ProviderRegistry, ProviderRegistryBuilder};
pub use router::{Router, Selection};
pub use tier::ComplexityTier;

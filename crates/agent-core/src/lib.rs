//! Core abstractions for the analysis agents
//!
//! This crate defines the boundary between the coordination layer and the
//! agents that actually talk to an LLM: the [`Analyst`] trait, the opaque
//! [`TaskArgs`] bag handed to every call, and the shared error type.

pub mod agent;
pub mod args;
pub mod error;

pub use agent::{Analyst, AnalystReport};
pub use args::TaskArgs;
pub use error::{Error, Result};

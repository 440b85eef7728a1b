//! Provider identifiers and credential checks

use crate::RouterError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Supported LLM vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// OpenAI (GPT family)
    OpenAI,
    /// Anthropic (Claude family)
    Anthropic,
    /// Groq (hosted Llama)
    Groq,
    /// Google (Gemini family)
    Google,
}

impl ProviderId {
    /// All providers in their canonical order
    pub const ALL: [ProviderId; 4] = [
        ProviderId::OpenAI,
        ProviderId::Anthropic,
        ProviderId::Groq,
        ProviderId::Google,
    ];

    /// Stable lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Groq => "groq",
            Self::Google => "google",
        }
    }

    /// Environment variable holding this provider's API key
    pub fn credential_env_var(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Groq => "GROQ_API_KEY",
            Self::Google => "GOOGLE_API_KEY",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "groq" => Ok(Self::Groq),
            "google" => Ok(Self::Google),
            other => Err(RouterError::UnknownProvider(other.to_string())),
        }
    }
}

/// Answers whether a provider is usable right now
///
/// The router queries this once per provider when it is constructed.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialCheck: Send + Sync {
    /// Whether credentials for `provider` are present
    fn is_available(&self, provider: ProviderId) -> bool;
}

/// Credential check backed by process environment variables
///
/// A provider is available when its API key variable is set and non-empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialCheck for EnvCredentials {
    fn is_available(&self, provider: ProviderId) -> bool {
        std::env::var(provider.credential_env_var()).is_ok_and(|v| !v.trim().is_empty())
    }
}

/// Fixed set of available providers
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    available: HashSet<ProviderId>,
}

impl StaticCredentials {
    /// Mark exactly the given providers as available
    pub fn new(providers: impl IntoIterator<Item = ProviderId>) -> Self {
        Self {
            available: providers.into_iter().collect(),
        }
    }

    /// No provider available
    pub fn none() -> Self {
        Self::default()
    }

    /// Every known provider available
    pub fn all() -> Self {
        Self::new(ProviderId::ALL)
    }
}

impl CredentialCheck for StaticCredentials {
    fn is_available(&self, provider: ProviderId) -> bool {
        self.available.contains(&provider)
    }
}

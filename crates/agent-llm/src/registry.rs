//! Provider registry: pricing, tier preferences, and fallback models
//!
//! The registry is immutable once built. [`ProviderRegistry::standard`] carries
//! the built-in tables; [`ProviderRegistry::builder`] assembles custom ones
//! (synthetic providers in tests, alternative price lists) and validates them.

use crate::{ComplexityTier, ModelSpec, ProviderId, Result, RouterError};
use std::collections::{HashMap, HashSet};

/// Static knowledge of providers, models, and per-tier preferences
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    /// Providers in fallback scan order
    providers: Vec<ProviderId>,
    /// Models keyed by name
    models: HashMap<String, ModelSpec>,
    /// Ranked model names per tier
    preferences: HashMap<ComplexityTier, Vec<String>>,
    /// One default model per provider
    fallbacks: HashMap<ProviderId, String>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ProviderRegistry {
    /// Create a new registry builder
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Built-in pricing and preference tables
    pub fn standard() -> Self {
        use ProviderId::{Anthropic, Google, Groq, OpenAI};

        let models = [
            ModelSpec::new(OpenAI, "gpt-4o", 2.50, 10.00),
            ModelSpec::new(OpenAI, "gpt-4o-mini", 0.15, 0.60),
            ModelSpec::new(OpenAI, "gpt-3.5-turbo", 0.50, 1.50),
            ModelSpec::new(Anthropic, "claude-3-5-sonnet-20241022", 3.00, 15.00),
            ModelSpec::new(Anthropic, "claude-3-5-haiku-20241022", 0.80, 4.00),
            ModelSpec::new(Anthropic, "claude-3-opus-20240229", 15.00, 75.00),
            ModelSpec::new(Groq, "llama-3.3-70b-versatile", 0.59, 0.79),
            ModelSpec::new(Groq, "llama-3.1-8b-instant", 0.05, 0.08),
            // Free tier
            ModelSpec::new(Google, "gemini-2.0-flash-exp", 0.00, 0.00),
            ModelSpec::new(Google, "gemini-1.5-pro", 1.25, 5.00),
        ];

        let preferences = [
            (
                ComplexityTier::Simple,
                vec!["llama-3.1-8b-instant", "gemini-2.0-flash-exp", "gpt-4o-mini"],
            ),
            (
                ComplexityTier::Moderate,
                vec![
                    "gpt-4o-mini",
                    "gemini-2.0-flash-exp",
                    "claude-3-5-haiku-20241022",
                    "llama-3.3-70b-versatile",
                ],
            ),
            (
                ComplexityTier::Complex,
                vec!["gpt-4o", "claude-3-5-sonnet-20241022", "gemini-1.5-pro"],
            ),
            (
                ComplexityTier::Critical,
                vec!["claude-3-opus-20240229", "gpt-4o", "claude-3-5-sonnet-20241022"],
            ),
        ];

        let fallbacks = [
            (OpenAI, "gpt-4o-mini"),
            (Anthropic, "claude-3-5-haiku-20241022"),
            (Groq, "llama-3.1-8b-instant"),
            (Google, "gemini-2.0-flash-exp"),
        ];

        Self {
            providers: ProviderId::ALL.to_vec(),
            models: models.into_iter().map(|m| (m.name.clone(), m)).collect(),
            preferences: preferences
                .into_iter()
                .map(|(tier, names)| (tier, names.into_iter().map(String::from).collect()))
                .collect(),
            fallbacks: fallbacks
                .into_iter()
                .map(|(provider, name)| (provider, name.to_string()))
                .collect(),
        }
    }

    /// Providers in fallback scan order
    pub fn providers(&self) -> &[ProviderId] {
        &self.providers
    }

    /// Look up a model by name
    pub fn model(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    /// Iterate over all known models
    pub fn models(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    /// Ranked candidates for a tier
    pub fn candidates(&self, tier: ComplexityTier) -> impl Iterator<Item = &ModelSpec> {
        self.preferences
            .get(&tier)
            .into_iter()
            .flatten()
            .filter_map(|name| self.models.get(name))
    }

    /// Designated fallback model for a provider
    pub fn fallback_model(&self, provider: ProviderId) -> Option<&ModelSpec> {
        self.fallbacks
            .get(&provider)
            .and_then(|name| self.models.get(name))
    }
}

/// Builder for ProviderRegistry
#[derive(Debug, Default)]
pub struct ProviderRegistryBuilder {
    providers: Vec<ProviderId>,
    models: Vec<ModelSpec>,
    preferences: HashMap<ComplexityTier, Vec<String>>,
    fallbacks: HashMap<ProviderId, String>,
}

impl ProviderRegistryBuilder {
    /// Register a provider; registration order is the fallback scan order
    pub fn provider(mut self, provider: ProviderId) -> Self {
        if !self.providers.contains(&provider) {
            self.providers.push(provider);
        }
        self
    }

    /// Add a model
    pub fn model(mut self, model: ModelSpec) -> Self {
        self.models.push(model);
        self
    }

    /// Set the ranked model list for a tier
    pub fn prefer<I, S>(mut self, tier: ComplexityTier, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferences
            .insert(tier, models.into_iter().map(Into::into).collect());
        self
    }

    /// Set the fallback model for a provider
    pub fn fallback(mut self, provider: ProviderId, model: impl Into<String>) -> Self {
        self.fallbacks.insert(provider, model.into());
        self
    }

    /// Validate and build the registry
    pub fn build(self) -> Result<ProviderRegistry> {
        if self.providers.is_empty() {
            return Err(invalid("at least one provider must be registered"));
        }

        let registered: HashSet<ProviderId> = self.providers.iter().copied().collect();
        let mut models = HashMap::with_capacity(self.models.len());

        for model in self.models {
            if !model.input_cost.is_finite()
                || !model.output_cost.is_finite()
                || model.input_cost < 0.0
                || model.output_cost < 0.0
            {
                return Err(invalid(format!(
                    "model '{}' has an invalid cost ({}, {})",
                    model.name, model.input_cost, model.output_cost
                )));
            }
            if !registered.contains(&model.provider) {
                return Err(invalid(format!(
                    "model '{}' belongs to unregistered provider '{}'",
                    model.name, model.provider
                )));
            }
            if models.contains_key(&model.name) {
                return Err(invalid(format!("model '{}' is defined twice", model.name)));
            }
            models.insert(model.name.clone(), model);
        }

        for (tier, names) in &self.preferences {
            if let Some(missing) = names.iter().find(|name| !models.contains_key(*name)) {
                return Err(invalid(format!(
                    "{tier} preference references unknown model '{missing}'"
                )));
            }
        }

        for provider in &self.providers {
            let Some(name) = self.fallbacks.get(provider) else {
                return Err(invalid(format!("provider '{provider}' has no fallback model")));
            };
            match models.get(name) {
                Some(model) if model.provider == *provider => {}
                Some(model) => {
                    return Err(invalid(format!(
                        "fallback '{name}' for '{provider}' is served by '{}'",
                        model.provider
                    )));
                }
                None => {
                    return Err(invalid(format!(
                        "fallback for '{provider}' references unknown model '{name}'"
                    )));
                }
            }
        }

        Ok(ProviderRegistry {
            providers: self.providers,
            models,
            preferences: self.preferences,
            fallbacks: self.fallbacks,
        })
    }
}

fn invalid(message: impl Into<String>) -> RouterError {
    RouterError::InvalidConfiguration(message.into())
}

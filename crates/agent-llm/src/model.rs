//! Model pricing

use crate::ProviderId;
use serde::{Deserialize, Serialize};

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// A model offered by a provider, with its token pricing in USD per 1M tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Provider serving this model
    pub provider: ProviderId,
    /// Provider-specific model name
    pub name: String,
    /// Cost per million input tokens
    pub input_cost: f64,
    /// Cost per million output tokens
    pub output_cost: f64,
}

impl ModelSpec {
    /// Create a new model spec
    pub fn new(
        provider: ProviderId,
        name: impl Into<String>,
        input_cost: f64,
        output_cost: f64,
    ) -> Self {
        Self {
            provider,
            name: name.into(),
            input_cost,
            output_cost,
        }
    }

    /// Mean of input and output cost, used for budget filtering
    pub fn average_cost(&self) -> f64 {
        (self.input_cost + self.output_cost) / 2.0
    }

    /// Cost in USD for the given token counts
    pub fn estimate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 / TOKENS_PER_MILLION) * self.input_cost
            + (output_tokens as f64 / TOKENS_PER_MILLION) * self.output_cost
    }

    /// Whether this model is free to use
    pub fn is_free(&self) -> bool {
        self.input_cost <= 0.0 && self.output_cost <= 0.0
    }
}

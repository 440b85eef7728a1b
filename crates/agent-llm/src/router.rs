//! Provider/model routing by task complexity, cost, and availability
//!
//! Selection order:
//! 1. An explicit override, when its provider is available
//! 2. The tier's ranked candidates, skipping unavailable providers and
//!    candidates whose average cost exceeds the ceiling
//! 3. The first available provider's fallback model (ceiling ignored)
//!
//! Availability is queried once, when the router is constructed.

use crate::{
    ComplexityTier, CredentialCheck, EnvCredentials, ProviderId, ProviderRegistry, Result,
    RouterError,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A concrete provider/model choice
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    /// Provider to call
    pub provider: ProviderId,
    /// Model name at that provider
    pub model: String,
}

impl Selection {
    /// Create a new selection
    pub fn new(provider: ProviderId, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Router selecting a provider/model for each task
#[derive(Debug, Clone)]
pub struct Router {
    registry: Arc<ProviderRegistry>,
    availability: HashMap<ProviderId, bool>,
    default_selection: Option<Selection>,
    cost_optimization: bool,
}

impl Router {
    /// Create a router over `registry`, checking each provider's credentials once
    pub fn new(registry: Arc<ProviderRegistry>, credentials: &dyn CredentialCheck) -> Self {
        let availability: HashMap<_, _> = registry
            .providers()
            .iter()
            .map(|&provider| (provider, credentials.is_available(provider)))
            .collect();

        debug!(
            available = ?availability
                .iter()
                .filter(|(_, ok)| **ok)
                .map(|(p, _)| p.as_str())
                .collect::<Vec<_>>(),
            "Router initialized"
        );

        Self {
            registry,
            availability,
            default_selection: None,
            cost_optimization: true,
        }
    }

    /// Router over the built-in tables with credentials read from the environment
    pub fn from_env() -> Self {
        Self::new(Arc::new(ProviderRegistry::standard()), &EnvCredentials)
    }

    /// Use `selection` for every request that does not carry its own override
    pub fn with_default_selection(mut self, selection: Selection) -> Self {
        self.default_selection = Some(selection);
        self
    }

    /// Enable or disable cost-ceiling filtering for tier selection
    pub fn with_cost_optimization(mut self, enabled: bool) -> Self {
        self.cost_optimization = enabled;
        self
    }

    /// The registry this router selects from
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Whether a provider had credentials at construction time
    pub fn is_available(&self, provider: ProviderId) -> bool {
        self.availability.get(&provider).copied().unwrap_or(false)
    }

    /// Available providers in registry order
    pub fn available_providers(&self) -> Vec<ProviderId> {
        self.registry
            .providers()
            .iter()
            .copied()
            .filter(|p| self.is_available(*p))
            .collect()
    }

    /// Select a provider/model for a task
    ///
    /// `preferred` wins whenever its provider is available. Otherwise the
    /// router-level default applies, then tier-based selection. A negative or
    /// non-finite ceiling is rejected.
    pub fn select_provider(
        &self,
        tier: ComplexityTier,
        cost_ceiling: Option<f64>,
        preferred: Option<&Selection>,
    ) -> Result<Selection> {
        check_ceiling(cost_ceiling)?;

        if let Some(selection) = preferred.or(self.default_selection.as_ref()) {
            if self.is_available(selection.provider) {
                debug!(%selection, "Using explicit provider override");
                return Ok(selection.clone());
            }
            warn!(%selection, "Override provider unavailable, routing by tier");
        }

        let ceiling = cost_ceiling.filter(|_| self.cost_optimization);
        self.select_for_tier(tier, ceiling)
    }

    /// Recommend a model for a task-type label such as "screening" or "analysis"
    pub fn recommend_model(&self, task_type: &str, budget: Option<f64>) -> Result<Selection> {
        let tier = ComplexityTier::from_task_type(task_type);
        check_ceiling(budget)?;
        debug!(task_type, %tier, "Recommending model");
        self.select_for_tier(tier, budget)
    }

    /// Estimated USD cost for a call; unknown models cost nothing
    pub fn estimate_cost(&self, model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        self.registry
            .model(model)
            .map_or(0.0, |spec| spec.estimate_cost(input_tokens, output_tokens))
    }

    /// Models reachable through tier preferences, grouped by available provider
    pub fn available_models(&self) -> BTreeMap<ProviderId, Vec<String>> {
        let mut grouped: BTreeMap<ProviderId, BTreeSet<String>> = BTreeMap::new();

        for tier in ComplexityTier::ALL {
            for model in self.registry.candidates(tier) {
                if self.is_available(model.provider) {
                    grouped
                        .entry(model.provider)
                        .or_default()
                        .insert(model.name.clone());
                }
            }
        }

        grouped
            .into_iter()
            .map(|(provider, names)| (provider, names.into_iter().collect()))
            .collect()
    }

    fn select_for_tier(&self, tier: ComplexityTier, ceiling: Option<f64>) -> Result<Selection> {
        for candidate in self.registry.candidates(tier) {
            if !self.is_available(candidate.provider) {
                continue;
            }
            if let Some(max) = ceiling {
                if candidate.average_cost() > max {
                    debug!(
                        model = %candidate.name,
                        average_cost = candidate.average_cost(),
                        max,
                        "Candidate over cost ceiling"
                    );
                    continue;
                }
            }

            debug!(
                %tier,
                provider = %candidate.provider,
                model = %candidate.name,
                "Selected tier candidate"
            );
            return Ok(Selection::new(candidate.provider, candidate.name.clone()));
        }

        for &provider in self.registry.providers() {
            if !self.is_available(provider) {
                continue;
            }
            if let Some(fallback) = self.registry.fallback_model(provider) {
                warn!(
                    %tier,
                    %provider,
                    model = %fallback.name,
                    "No tier candidate qualified, using fallback model"
                );
                return Ok(Selection::new(provider, fallback.name.clone()));
            }
        }

        Err(RouterError::NoProviderAvailable { tier: Some(tier) })
    }
}

fn check_ceiling(ceiling: Option<f64>) -> Result<()> {
    match ceiling {
        Some(max) if !max.is_finite() || max < 0.0 => Err(RouterError::InvalidCostCeiling(max)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockCredentialCheck;
    use crate::{ModelSpec, StaticCredentials};

    fn router_with(providers: impl IntoIterator<Item = ProviderId>) -> Router {
        Router::new(
            Arc::new(ProviderRegistry::standard()),
            &StaticCredentials::new(providers),
        )
    }

    #[test]
    fn test_credentials_checked_once_per_provider() {
        let mut creds = MockCredentialCheck::new();
        creds
            .expect_is_available()
            .times(4)
            .returning(|p| p == ProviderId::Anthropic);

        let router = Router::new(Arc::new(ProviderRegistry::standard()), &creds);
        assert_eq!(router.available_providers(), vec![ProviderId::Anthropic]);

        // Selection does not re-query credentials.
        let selection = router.select_provider(ComplexityTier::Critical, None, None).unwrap();
        assert_eq!(selection, Selection::new(ProviderId::Anthropic, "claude-3-opus-20240229"));
    }

    #[test]
    fn test_first_available_candidate_wins() {
        let router = router_with(ProviderId::ALL);
        let selection = router.select_provider(ComplexityTier::Simple, None, None).unwrap();
        assert_eq!(selection, Selection::new(ProviderId::Groq, "llama-3.1-8b-instant"));

        let selection = router.select_provider(ComplexityTier::Complex, None, None).unwrap();
        assert_eq!(selection, Selection::new(ProviderId::OpenAI, "gpt-4o"));
    }

    #[test]
    fn test_skips_unavailable_providers() {
        let router = router_with([ProviderId::Google]);
        let selection = router.select_provider(ComplexityTier::Moderate, None, None).unwrap();
        assert_eq!(selection, Selection::new(ProviderId::Google, "gemini-2.0-flash-exp"));
    }

    #[test]
    fn test_never_returns_unavailable_provider() {
        let subsets: [&[ProviderId]; 5] = [
            &[ProviderId::OpenAI],
            &[ProviderId::Anthropic],
            &[ProviderId::Groq],
            &[ProviderId::Google],
            &[ProviderId::Groq, ProviderId::Anthropic],
        ];

        for subset in subsets {
            let router = router_with(subset.iter().copied());
            for tier in ComplexityTier::ALL {
                for ceiling in [None, Some(0.0), Some(1.0), Some(100.0)] {
                    let selection = router.select_provider(tier, ceiling, None).unwrap();
                    assert!(
                        subset.contains(&selection.provider),
                        "{tier} with {ceiling:?} picked unavailable {selection}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_cost_ceiling_filters_candidates() {
        let router = router_with(ProviderId::ALL);
        // gpt-4o averages 6.25, claude sonnet 9.0, gemini pro 3.125
        let selection = router
            .select_provider(ComplexityTier::Complex, Some(5.0), None)
            .unwrap();
        assert_eq!(selection, Selection::new(ProviderId::Google, "gemini-1.5-pro"));
    }

    #[test]
    fn test_ceiling_below_all_candidates_falls_back() {
        let router = router_with([ProviderId::Anthropic, ProviderId::OpenAI]);
        let selection = router
            .select_provider(ComplexityTier::Critical, Some(0.01), None)
            .unwrap();
        // Fallback scan is registry order, ceiling ignored
        assert_eq!(selection, Selection::new(ProviderId::OpenAI, "gpt-4o-mini"));

        let critical: Vec<_> = router
            .registry()
            .candidates(ComplexityTier::Critical)
            .map(|m| m.name.clone())
            .collect();
        assert!(!critical.contains(&selection.model));
    }

    #[test]
    fn test_zero_ceiling_admits_free_tier() {
        let router = router_with(ProviderId::ALL);
        let selection = router
            .select_provider(ComplexityTier::Simple, Some(0.0), None)
            .unwrap();
        assert_eq!(selection, Selection::new(ProviderId::Google, "gemini-2.0-flash-exp"));
    }

    #[test]
    fn test_cost_optimization_disabled_ignores_ceiling() {
        let router = router_with(ProviderId::ALL).with_cost_optimization(false);
        let selection = router
            .select_provider(ComplexityTier::Critical, Some(0.01), None)
            .unwrap();
        assert_eq!(selection.model, "claude-3-opus-20240229");
    }

    #[test]
    fn test_rejects_invalid_ceiling() {
        let router = router_with(ProviderId::ALL);
        for ceiling in [f64::NAN, f64::INFINITY, -0.5] {
            assert!(matches!(
                router.select_provider(ComplexityTier::Critical, Some(ceiling), None),
                Err(RouterError::InvalidCostCeiling(_))
            ));
            assert!(matches!(
                router.recommend_model("deep_analysis", Some(ceiling)),
                Err(RouterError::InvalidCostCeiling(_))
            ));
        }
    }

    #[test]
    fn test_no_provider_available() {
        let router = router_with([]);
        let err = router
            .select_provider(ComplexityTier::Moderate, None, None)
            .unwrap_err();
        assert_eq!(
            err,
            RouterError::NoProviderAvailable {
                tier: Some(ComplexityTier::Moderate)
            }
        );
    }

    #[test]
    fn test_override_wins_when_available() {
        let router = router_with([ProviderId::Groq, ProviderId::OpenAI]);
        let preferred = Selection::new(ProviderId::Groq, "llama-3.3-70b-versatile");

        let selection = router
            .select_provider(ComplexityTier::Critical, Some(0.01), Some(&preferred))
            .unwrap();
        assert_eq!(selection, preferred);
    }

    #[test]
    fn test_override_ignored_when_unavailable() {
        let router = router_with([ProviderId::OpenAI]);
        let preferred = Selection::new(ProviderId::Anthropic, "claude-3-opus-20240229");

        let selection = router
            .select_provider(ComplexityTier::Complex, None, Some(&preferred))
            .unwrap();
        assert_eq!(selection, Selection::new(ProviderId::OpenAI, "gpt-4o"));
    }

    #[test]
    fn test_call_override_beats_default_selection() {
        let router = router_with(ProviderId::ALL)
            .with_default_selection(Selection::new(ProviderId::Google, "gemini-1.5-pro"));

        let selection = router.select_provider(ComplexityTier::Simple, None, None).unwrap();
        assert_eq!(selection.model, "gemini-1.5-pro");

        let preferred = Selection::new(ProviderId::OpenAI, "gpt-3.5-turbo");
        let selection = router
            .select_provider(ComplexityTier::Simple, None, Some(&preferred))
            .unwrap();
        assert_eq!(selection, preferred);
    }

    #[test]
    fn test_estimate_cost() {
        let router = router_with(ProviderId::ALL);
        for model in router.registry().models() {
            let cost = router.estimate_cost(&model.name, 1_000_000, 1_000_000);
            assert!((cost - (model.input_cost + model.output_cost)).abs() < 1e-9);
        }
        assert!(router.estimate_cost("unknown-model", 1_000_000, 1_000_000).abs() < f64::EPSILON);
    }

    #[test]
    fn test_recommend_model() {
        let router = router_with(ProviderId::ALL);

        let selection = router.recommend_model("screening", None).unwrap();
        assert_eq!(selection.model, "llama-3.1-8b-instant");

        let selection = router.recommend_model("deep_analysis", None).unwrap();
        assert_eq!(selection.model, "claude-3-opus-20240229");

        let selection = router.recommend_model("deep_analysis", Some(7.0)).unwrap();
        assert_eq!(selection.model, "gpt-4o");

        // Unrecognized task type routes as moderate
        let selection = router.recommend_model("poetry", None).unwrap();
        assert_eq!(selection.model, "gpt-4o-mini");
    }

    #[test]
    fn test_recommend_model_ignores_default_selection() {
        let router = router_with(ProviderId::ALL)
            .with_default_selection(Selection::new(ProviderId::Google, "gemini-1.5-pro"));
        let selection = router.recommend_model("analysis", None).unwrap();
        assert_eq!(selection.model, "gpt-4o");
    }

    #[test]
    fn test_recommend_model_fails_without_providers() {
        let router = router_with([]);
        assert!(matches!(
            router.recommend_model("analysis", Some(1.0)),
            Err(RouterError::NoProviderAvailable { .. })
        ));
    }

    #[test]
    fn test_available_models() {
        let router = router_with([ProviderId::Groq, ProviderId::Google]);
        let models = router.available_models();

        assert_eq!(models.len(), 2);
        assert_eq!(
            models[&ProviderId::Groq],
            vec!["llama-3.1-8b-instant".to_string(), "llama-3.3-70b-versatile".to_string()]
        );
        assert_eq!(
            models[&ProviderId::Google],
            vec!["gemini-1.5-pro".to_string(), "gemini-2.0-flash-exp".to_string()]
        );
    }

    #[test]
    fn test_synthetic_registry() {
        let registry = ProviderRegistry::builder()
            .provider(ProviderId::Groq)
            .model(ModelSpec::new(ProviderId::Groq, "cheap", 0.1, 0.1))
            .model(ModelSpec::new(ProviderId::Groq, "pricey", 50.0, 50.0))
            .prefer(ComplexityTier::Critical, ["pricey", "cheap"])
            .fallback(ProviderId::Groq, "cheap")
            .build()
            .unwrap();
        let router = Router::new(Arc::new(registry), &StaticCredentials::all());

        let selection = router
            .select_provider(ComplexityTier::Critical, Some(1.0), None)
            .unwrap();
        assert_eq!(selection.model, "cheap");

        // No preferences for this tier at all: straight to fallback
        let selection = router.select_provider(ComplexityTier::Simple, None, None).unwrap();
        assert_eq!(selection.model, "cheap");
    }
}

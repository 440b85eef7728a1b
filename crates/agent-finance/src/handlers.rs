//! Sub-task handler registry
//!
//! Maps a sub-task kind to the complexity tier it is routed at and the
//! factory that builds its analyst. Adding a kind is a registration, not a
//! change to dispatch.

use crate::task::kinds;
use agent_core::Analyst;
use agent_llm::{ComplexityTier, Selection};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds analysts bound to a routed provider/model
#[async_trait]
pub trait AnalystFactory: Send + Sync {
    /// Build an analyst for `kind` served by `selection`
    async fn create(
        &self,
        kind: &str,
        selection: &Selection,
    ) -> agent_core::Result<Arc<dyn Analyst>>;
}

/// [`AnalystFactory`] backed by a synchronous closure
pub struct FnFactory<F>(F);

/// Wrap a closure as an [`AnalystFactory`]
pub fn factory_fn<F>(f: F) -> FnFactory<F>
where
    F: Fn(&str, &Selection) -> agent_core::Result<Arc<dyn Analyst>> + Send + Sync,
{
    FnFactory(f)
}

#[async_trait]
impl<F> AnalystFactory for FnFactory<F>
where
    F: Fn(&str, &Selection) -> agent_core::Result<Arc<dyn Analyst>> + Send + Sync,
{
    async fn create(
        &self,
        kind: &str,
        selection: &Selection,
    ) -> agent_core::Result<Arc<dyn Analyst>> {
        (self.0)(kind, selection)
    }
}

/// Routing tier and factory for one sub-task kind
#[derive(Clone)]
pub struct Handler {
    /// Tier used when the sub-task does not override it
    pub tier: ComplexityTier,
    /// Analyst factory
    pub factory: Arc<dyn AnalystFactory>,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("tier", &self.tier).finish_non_exhaustive()
    }
}

/// Registry of sub-task kinds
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the bundled finance kinds, all at moderate complexity
    pub fn finance(factory: Arc<dyn AnalystFactory>) -> Self {
        kinds::ALL.into_iter().fold(Self::new(), |registry, kind| {
            registry.register(kind, ComplexityTier::Moderate, Arc::clone(&factory))
        })
    }

    /// Register (or replace) a kind
    pub fn register(
        mut self,
        kind: impl Into<String>,
        tier: ComplexityTier,
        factory: Arc<dyn AnalystFactory>,
    ) -> Self {
        self.handlers.insert(kind.into(), Handler { tier, factory });
        self
    }

    /// Look up the handler for a kind
    pub fn get(&self, kind: &str) -> Option<&Handler> {
        self.handlers.get(kind)
    }

    /// Whether a kind is registered
    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<_> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no kind is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{AnalystReport, TaskArgs};
    use agent_llm::ProviderId;

    struct Named(String);

    #[async_trait]
    impl Analyst for Named {
        async fn analyze(
            &self,
            _asset: &str,
            _args: &TaskArgs,
        ) -> agent_core::Result<AnalystReport> {
            Ok(AnalystReport::new(self.0.clone()))
        }

        fn name(&self) -> &str {
            &self.0
        }
    }

    fn named_factory() -> Arc<dyn AnalystFactory> {
        Arc::new(factory_fn(|kind, selection| {
            Ok(Arc::new(Named(format!("{kind}:{selection}"))) as Arc<dyn Analyst>)
        }))
    }

    #[test]
    fn test_finance_registry() {
        let registry = HandlerRegistry::finance(named_factory());
        assert_eq!(
            registry.kinds(),
            vec!["crypto_analyst", "fundamental", "stock_analyst", "technical"]
        );
        for kind in kinds::ALL {
            assert_eq!(registry.get(kind).unwrap().tier, ComplexityTier::Moderate);
        }
        assert!(registry.get("sentiment").is_none());
    }

    #[test]
    fn test_register_new_kind() {
        let registry = HandlerRegistry::finance(named_factory()).register(
            "macro",
            ComplexityTier::Critical,
            named_factory(),
        );
        assert_eq!(registry.len(), 5);
        assert!(registry.contains("macro"));
        assert_eq!(registry.get("macro").unwrap().tier, ComplexityTier::Critical);
    }

    #[tokio::test]
    async fn test_factory_fn() {
        let factory = named_factory();
        let selection = Selection::new(ProviderId::Groq, "llama-3.1-8b-instant");
        let analyst = factory.create("technical", &selection).await.unwrap();
        assert_eq!(analyst.name(), "technical:groq/llama-3.1-8b-instant");
    }
}

//! Explicitly passed resolution state: the provider chain and the active-configuration stack.

use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

use siphon_types::{ConfigProvider, ProviderError};
use siphon_util::ProviderChain;
use tracing::debug;

use crate::resolver::ResolvedConfiguration;

#[derive(Debug, Clone)]
struct ActiveConfiguration {
    schema_name: String,
    configuration: Arc<ResolvedConfiguration>,
}

/// State threaded through one logical call tree.
///
/// Independent call trees use independent contexts (see [`fork`](Self::fork)), so their
/// active configurations never leak into each other.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    chain: ProviderChain,
    active: Vec<ActiveConfiguration>,
    namespace_fallback: bool,
}

impl ResolutionContext {
    pub fn new(chain: ProviderChain) -> Self {
        Self {
            chain,
            active: Vec::new(),
            namespace_fallback: true,
        }
    }

    /// Context over the default provider chain (environment, files, keychain).
    pub fn from_environment() -> Result<Self, ProviderError> {
        Ok(Self::new(ProviderChain::from_environment()?))
    }

    /// Only look fields up in their exact namespace instead of also walking up to the root.
    pub fn without_namespace_fallback(mut self) -> Self {
        self.namespace_fallback = false;
        self
    }

    pub fn namespace_fallback(&self) -> bool {
        self.namespace_fallback
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut ProviderChain {
        &mut self.chain
    }

    /// Adds a provider that takes precedence over every existing one, e.g. contextual state.
    pub fn push_front_provider(&mut self, provider: impl ConfigProvider + 'static) {
        self.chain.push_front(provider);
    }

    /// A context sharing this chain with an empty active-configuration stack.
    pub fn fork(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            active: Vec::new(),
            namespace_fallback: self.namespace_fallback,
        }
    }

    /// Innermost active configuration of the given schema type.
    pub fn active(&self, schema_name: &str) -> Option<&Arc<ResolvedConfiguration>> {
        self.active
            .iter()
            .rev()
            .find(|active| active.schema_name == schema_name)
            .map(|active| &active.configuration)
    }

    pub fn active_depth(&self) -> usize {
        self.active.len()
    }

    /// Makes `configuration` visible to nested calls until the returned scope is dropped.
    pub fn enter(&mut self, schema_name: impl Into<String>, configuration: Arc<ResolvedConfiguration>) -> ActiveScope<'_> {
        let depth = self.active.len();
        let schema_name = schema_name.into();
        debug!(schema = %schema_name, depth, "active configuration pushed");
        self.active.push(ActiveConfiguration {
            schema_name,
            configuration,
        });
        ActiveScope { context: self, depth }
    }
}

/// Guard returned by [`ResolutionContext::enter`]; pops the configuration on drop,
/// including when the scope is left through an error or a panic.
#[derive(Debug)]
pub struct ActiveScope<'a> {
    context: &'a mut ResolutionContext,
    depth: usize,
}

impl Deref for ActiveScope<'_> {
    type Target = ResolutionContext;

    fn deref(&self) -> &Self::Target {
        &*self.context
    }
}

impl DerefMut for ActiveScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.context
    }
}

impl Drop for ActiveScope<'_> {
    fn drop(&mut self) {
        self.context.active.truncate(self.depth);
        debug!(depth = self.depth, "active configuration popped");
    }
}

#[cfg(test)]
mod tests {
    use siphon_types::Namespace;

    use super::*;

    fn configuration(name: &str) -> Arc<ResolvedConfiguration> {
        Arc::new(ResolvedConfiguration::new(name, Namespace::root()))
    }

    #[test]
    fn scope_pops_on_drop() {
        let mut context = ResolutionContext::new(ProviderChain::new());
        {
            let mut scope = context.enter("Spec", configuration("Spec"));
            assert!(scope.active("Spec").is_some());
            let nested = scope.enter("Other", configuration("Other"));
            assert_eq!(nested.active_depth(), 2);
        }
        assert_eq!(context.active_depth(), 0);
        assert!(context.active("Spec").is_none());
    }

    #[test]
    fn fork_starts_with_empty_stack() {
        let mut context = ResolutionContext::new(ProviderChain::new());
        let scope = context.enter("Spec", configuration("Spec"));
        let forked = scope.fork();
        assert!(forked.active("Spec").is_none());
        assert!(scope.active("Spec").is_some());
    }
}

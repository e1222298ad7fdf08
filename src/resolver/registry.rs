// Provider registry - strategy identifiers to provider instances

use std::collections::HashMap;
use std::sync::Arc;

use super::traits::StrategyProvider;

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<&'static str, Arc<dyn StrategyProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own name, replacing any previous one
    pub fn add_provider(&mut self, provider: Arc<dyn StrategyProvider>) {
        self.providers.insert(provider.name(), provider);
    }

    pub fn with_provider(mut self, provider: Arc<dyn StrategyProvider>) -> Self {
        self.add_provider(provider);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn StrategyProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.providers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

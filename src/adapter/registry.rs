//! Provider-tag to adapter resolution with allow-list gating.
//!
//! Adapters are registered once during startup; afterwards the registry is
//! read-only and shared. Resolution refuses providers outside the policy's
//! allow-list before even looking for an adapter, so a misconfigured
//! deployment fails closed.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::PolicyConfig;
use crate::error::{GatewayError, Result};
use crate::items::Provider;

use super::ProviderAdapter;

/// Holds one adapter instance per provider tag.
pub struct AdapterRegistry {
    allowed: Vec<Provider>,
    adapters: HashMap<Provider, Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    /// Creates a registry gated by the given allow-list.
    pub fn new(allowed: Vec<Provider>) -> Self {
        Self {
            allowed,
            adapters: HashMap::new(),
        }
    }

    /// Creates a registry gated by the policy's allow-list.
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.agnostic_settings.allowed_providers.clone())
    }

    /// Registers the adapter for a provider tag, replacing any previous one.
    pub fn register(&mut self, provider: Provider, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(provider, adapter);
    }

    /// Resolves the adapter for a provider tag.
    ///
    /// Fails with `ProviderNotAllowed` when the tag is outside the
    /// allow-list, and with `AdapterNotRegistered` when the tag is allowed
    /// but nothing was registered for it.
    pub fn resolve(&self, provider: Provider) -> Result<Arc<dyn ProviderAdapter>> {
        if !self.allowed.contains(&provider) {
            return Err(GatewayError::ProviderNotAllowed {
                provider: provider.to_string(),
                allowed: self.allowed.iter().map(|p| p.to_string()).collect(),
            });
        }
        self.adapters
            .get(&provider)
            .cloned()
            .ok_or(GatewayError::AdapterNotRegistered {
                provider: provider.to_string(),
            })
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("allowed", &self.allowed)
            .field("registered", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}

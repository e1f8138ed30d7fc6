// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

// Provider Registry - Adapter constructors keyed by provider type
//
// Maps a provider type name to the closure that builds its adapter and the
// defaults merged under every user configuration of that type. Registration
// is an idempotent upsert; removal of an unknown type is a no-op.

use crate::domain::provider::{ProviderAdapter, ProviderError};
use crate::domain::provider_config::{ProviderConfiguration, ProviderDefaults};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds a live adapter from a merged configuration
pub type AdapterConstructor =
    Arc<dyn Fn(&ProviderConfiguration) -> Result<Arc<dyn ProviderAdapter>, ProviderError> + Send + Sync>;

#[derive(Clone)]
pub struct ProviderRegistration {
    pub provider_type: String,
    pub constructor: AdapterConstructor,
    pub defaults: ProviderDefaults,
}

impl fmt::Debug for ProviderRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistration")
            .field("provider_type", &self.provider_type)
            .field("defaults", &self.defaults)
            .finish()
    }
}

/// Registry of adapter constructors
#[derive(Default)]
pub struct ProviderRegistry {
    registrations: BTreeMap<String, ProviderRegistration>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the constructor for `provider_type`
    pub fn register<F>(&mut self, provider_type: &str, constructor: F, defaults: ProviderDefaults)
    where
        F: Fn(&ProviderConfiguration) -> Result<Arc<dyn ProviderAdapter>, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        let replaced = self
            .registrations
            .insert(
                provider_type.to_string(),
                ProviderRegistration {
                    provider_type: provider_type.to_string(),
                    constructor: Arc::new(constructor),
                    defaults,
                },
            )
            .is_some();

        if replaced {
            info!("Replaced registration for provider type '{}'", provider_type);
        } else {
            info!("Registered provider type '{}'", provider_type);
        }
    }

    /// Remove a registration; returns whether one existed
    pub fn unregister(&mut self, provider_type: &str) -> bool {
        let removed = self.registrations.remove(provider_type).is_some();
        if removed {
            info!("Unregistered provider type '{}'", provider_type);
        } else {
            debug!("Unregister of unknown provider type '{}' ignored", provider_type);
        }
        removed
    }

    pub fn get(&self, provider_type: &str) -> Option<&ProviderRegistration> {
        self.registrations.get(provider_type)
    }

    pub fn contains(&self, provider_type: &str) -> bool {
        self.registrations.contains_key(provider_type)
    }

    /// Registered provider types, sorted by name
    pub fn registered_types(&self) -> Vec<String> {
        self.registrations.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl ProviderRegistration {
    /// Construct an adapter with `config` layered over this registration's defaults
    pub fn build(&self, config: &ProviderConfiguration) -> Result<Arc<dyn ProviderAdapter>, ProviderError> {
        let merged = config.merged_over(&self.defaults);
        (self.constructor)(&merged)
    }
}

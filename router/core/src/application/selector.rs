// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

// Provider Selector - three-tier fallback selection
//
// Works on snapshots of the configured providers so the same logic serves the
// live router and offline dry-runs. Tiers, in order:
//   1. task-specific: on the task's preference list, declares the required
//      capability, available
//   2. generic: first available provider of the generic fallback list,
//      capabilities ignored
//   3. last resort: the configured last-resort provider, if available

use crate::domain::capability::CapabilitySet;
use crate::domain::error::{RouterError, RouterResult};
use crate::domain::router_config::SelectionConfig;
use crate::domain::selection::{ProviderSelection, SelectionOrder, SelectionTier};
use crate::domain::task::TaskType;
use tracing::debug;

/// Point-in-time view of one configured provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCandidate {
    pub provider_type: String,
    /// Effective capabilities (configuration override, else the instance's)
    pub capabilities: CapabilitySet,
    pub available: bool,
}

impl ProviderCandidate {
    pub fn new(provider_type: impl Into<String>, capabilities: CapabilitySet, available: bool) -> Self {
        Self {
            provider_type: provider_type.into(),
            capabilities,
            available,
        }
    }

    /// Capability negotiation: task types without a required flag never match
    pub fn supports_task(&self, task_type: &TaskType) -> bool {
        task_type
            .required_capability()
            .map(|capability| self.capabilities.supports(capability))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProviderSelector {
    config: SelectionConfig,
}

impl ProviderSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Pick a provider for `task_type`.
    ///
    /// `candidates` must be in activation order; `preferences` is the task's
    /// entry from the task-to-provider map.
    pub fn select(
        &self,
        task_type: &TaskType,
        preferences: &[String],
        candidates: &[ProviderCandidate],
    ) -> RouterResult<ProviderSelection> {
        if let Some(candidate) = self.task_specific(task_type, preferences, candidates) {
            return Ok(Self::selected(task_type, candidate, SelectionTier::TaskSpecific));
        }

        let generic = self
            .config
            .generic_fallback
            .iter()
            .find_map(|name| Self::available(candidates, name));
        if let Some(candidate) = generic {
            return Ok(Self::selected(task_type, candidate, SelectionTier::Generic));
        }

        if let Some(candidate) = Self::available(candidates, &self.config.last_resort) {
            return Ok(Self::selected(task_type, candidate, SelectionTier::LastResort));
        }

        debug!("No provider available for task '{}'", task_type);
        Err(RouterError::NoProviderAvailable(task_type.clone()))
    }

    fn task_specific<'a>(
        &self,
        task_type: &TaskType,
        preferences: &[String],
        candidates: &'a [ProviderCandidate],
    ) -> Option<&'a ProviderCandidate> {
        let eligible = |c: &&ProviderCandidate| c.available && c.supports_task(task_type);

        match self.config.order {
            SelectionOrder::Preference => preferences.iter().find_map(|name| {
                candidates
                    .iter()
                    .filter(|c| &c.provider_type == name)
                    .find(eligible)
            }),
            SelectionOrder::Activation => candidates
                .iter()
                .filter(|c| preferences.contains(&c.provider_type))
                .find(eligible),
        }
    }

    fn available<'a>(candidates: &'a [ProviderCandidate], name: &str) -> Option<&'a ProviderCandidate> {
        candidates
            .iter()
            .find(|c| c.provider_type == name && c.available)
    }

    fn selected(task_type: &TaskType, candidate: &ProviderCandidate, tier: SelectionTier) -> ProviderSelection {
        debug!(
            "Selected provider '{}' for task '{}' ({} tier)",
            candidate.provider_type, task_type, tier
        );
        ProviderSelection {
            provider_type: candidate.provider_type.clone(),
            tier,
        }
    }
}

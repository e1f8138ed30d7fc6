// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Provider Router
//!
//! The router service object: owns registrations, user configurations, lazily
//! built adapter instances, the task-to-provider map, metrics and health.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Public entry point for provider management, selection and execution
//!
//! # Concurrency
//!
//! The router is `Send + Sync` and meant to be shared behind an `Arc`.
//! Registry, configurations and task map sit behind `parking_lot` locks that
//! are never held across an `.await`; instances, metrics and health live in
//! sharded maps. Concurrent executions may share one adapter instance.
//!
//! Adapters are built without any lock held. Each provider type carries a
//! generation that is bumped whenever its configuration or constructor
//! changes; a build started under an older generation is discarded instead
//! of cached.

use crate::application::executor::TaskExecutor;
use crate::application::selector::{ProviderCandidate, ProviderSelector};
use crate::application::task_mapping::TaskProviderMap;
use crate::domain::capability::CapabilitySet;
use crate::domain::error::{RouterError, RouterResult};
use crate::domain::events::RouterEvent;
use crate::domain::execution::{
    CompleteHandler, ExecutionOptions, StreamArgument, StreamExecution, StreamHandlers,
    TaskExecution, TaskPayload,
};
use crate::domain::health::HealthStatus;
use crate::domain::metrics::MetricsSnapshot;
use crate::domain::provider::{ProviderAdapter, ProviderError};
use crate::domain::provider_config::{ProviderConfiguration, ProviderDefaults};
use crate::domain::router_config::RouterConfig;
use crate::domain::selection::ProviderSelection;
use crate::domain::task::TaskType;
use crate::infrastructure::event_bus::{EventBus, EventReceiver};
use crate::infrastructure::health_monitor::HealthMonitor;
use crate::infrastructure::metrics_recorder::MetricsRecorder;
use crate::infrastructure::registry::ProviderRegistry;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ProviderRouter {
    registry: RwLock<ProviderRegistry>,
    /// User configurations in activation order
    configurations: RwLock<Vec<ProviderConfiguration>>,
    instances: DashMap<String, Arc<dyn ProviderAdapter>>,
    /// Bumped on every change that makes a cached instance stale
    generations: DashMap<String, u64>,
    task_map: RwLock<TaskProviderMap>,
    selector: ProviderSelector,
    metrics: Arc<MetricsRecorder>,
    health: HealthMonitor,
    executor: TaskExecutor,
    event_bus: EventBus,
    startup_providers: Vec<ProviderConfiguration>,
    initialized: AtomicBool,
}

impl ProviderRouter {
    /// Router with built-in defaults and no configured providers
    pub fn new() -> Self {
        Self::from_config(&RouterConfig::default())
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        let spec = &config.spec;
        let event_bus = EventBus::with_default_capacity();
        let metrics = Arc::new(MetricsRecorder::new(spec.metrics.clone()).with_event_bus(event_bus.clone()));

        Self {
            registry: RwLock::new(ProviderRegistry::new()),
            configurations: RwLock::new(Vec::new()),
            instances: DashMap::new(),
            generations: DashMap::new(),
            task_map: RwLock::new(TaskProviderMap::with_overrides(&spec.task_mapping)),
            selector: ProviderSelector::new(spec.selection.clone()),
            metrics: metrics.clone(),
            health: HealthMonitor::new(&spec.health).with_event_bus(event_bus.clone()),
            executor: TaskExecutor::new(metrics, spec.retry.clone(), event_bus.clone()),
            event_bus,
            startup_providers: spec.providers.clone(),
            initialized: AtomicBool::new(false),
        }
    }

    /// Add the providers listed in the router configuration.
    ///
    /// Runs once; later calls are no-ops returning 0. Providers that cannot
    /// be added (unregistered type, missing key) are skipped with a warning.
    /// Register adapter constructors before calling this.
    pub fn initialize(&self) -> usize {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("Router already initialized");
            return 0;
        }

        let mut added = 0;
        for config in &self.startup_providers {
            match self.add_user_provider(config.clone()) {
                Ok(()) => added += 1,
                Err(e) => warn!("Skipping configured provider '{}': {}", config.provider_type, e),
            }
        }

        info!(
            "Router initialized: {} of {} configured providers added",
            added,
            self.startup_providers.len()
        );
        added
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register (or replace) the adapter constructor for `provider_type`
    pub fn register_provider<F>(&self, provider_type: &str, constructor: F, defaults: ProviderDefaults)
    where
        F: Fn(&ProviderConfiguration) -> Result<Arc<dyn ProviderAdapter>, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        self.registry.write().register(provider_type, constructor, defaults);
        self.invalidate(provider_type);

        self.event_bus.publish(RouterEvent::ProviderRegistered {
            provider_type: provider_type.to_string(),
            registered_at: Utc::now(),
        });
    }

    /// Remove a registration. Refused while a user configuration uses it.
    pub fn unregister_provider(&self, provider_type: &str) -> RouterResult<bool> {
        if self.configuration(provider_type).is_some() {
            return Err(RouterError::ProviderInUse(provider_type.to_string()));
        }

        let removed = self.registry.write().unregister(provider_type);
        if removed {
            self.event_bus.publish(RouterEvent::ProviderUnregistered {
                provider_type: provider_type.to_string(),
                unregistered_at: Utc::now(),
            });
        }
        Ok(removed)
    }

    pub fn get_registered_providers(&self) -> Vec<String> {
        self.registry.read().registered_types()
    }

    // ========================================================================
    // User configurations
    // ========================================================================

    /// Add or replace the user configuration for a registered provider type.
    ///
    /// An `env:VAR` API key is resolved here. A replaced configuration keeps
    /// its activation position and drops the cached instance.
    pub fn add_user_provider(&self, mut config: ProviderConfiguration) -> RouterResult<()> {
        if !self.registry.read().contains(&config.provider_type) {
            return Err(RouterError::UnregisteredProvider(config.provider_type));
        }

        config.resolve_api_key();
        if config.is_active && !config.has_api_key() {
            return Err(RouterError::MissingApiKey(config.provider_type));
        }

        let provider_type = config.provider_type.clone();
        let is_active = config.is_active;
        {
            let mut configurations = self.configurations.write();
            match configurations
                .iter_mut()
                .find(|c| c.provider_type == provider_type)
            {
                Some(existing) => *existing = config,
                None => configurations.push(config),
            }
        }

        self.invalidate(&provider_type);
        self.health.forget(&provider_type);

        info!("Added user provider '{}' (active: {})", provider_type, is_active);
        self.event_bus.publish(RouterEvent::UserProviderAdded {
            provider_type,
            is_active,
            added_at: Utc::now(),
        });
        Ok(())
    }

    /// Remove a user configuration and its cached instance; false when absent
    pub fn remove_user_provider(&self, provider_type: &str) -> bool {
        let removed = {
            let mut configurations = self.configurations.write();
            let before = configurations.len();
            configurations.retain(|c| c.provider_type != provider_type);
            configurations.len() != before
        };

        if !removed {
            debug!("No user provider '{}' to remove", provider_type);
            return false;
        }

        self.invalidate(provider_type);
        self.health.forget(provider_type);

        info!("Removed user provider '{}'", provider_type);
        self.event_bus.publish(RouterEvent::UserProviderRemoved {
            provider_type: provider_type.to_string(),
            removed_at: Utc::now(),
        });
        true
    }

    /// Toggle participation in selection. Activation moves the provider to
    /// the end of the activation order.
    pub fn set_provider_active(&self, provider_type: &str, active: bool) -> RouterResult<()> {
        {
            let mut configurations = self.configurations.write();
            let index = configurations
                .iter()
                .position(|c| c.provider_type == provider_type)
                .ok_or_else(|| RouterError::ProviderNotConfigured(provider_type.to_string()))?;

            if active && !configurations[index].has_api_key() {
                return Err(RouterError::MissingApiKey(provider_type.to_string()));
            }
            if configurations[index].is_active == active {
                return Ok(());
            }

            let mut config = configurations.remove(index);
            config.is_active = active;
            if active {
                configurations.push(config);
            } else {
                configurations.insert(index, config);
            }
        }

        info!(
            "Provider '{}' {}",
            provider_type,
            if active { "activated" } else { "deactivated" }
        );
        self.event_bus.publish(RouterEvent::UserProviderActivationChanged {
            provider_type: provider_type.to_string(),
            is_active: active,
            changed_at: Utc::now(),
        });
        Ok(())
    }

    /// Types of active user providers, in activation order
    pub fn get_active_providers(&self) -> Vec<String> {
        self.configurations
            .read()
            .iter()
            .filter(|c| c.is_active)
            .map(|c| c.provider_type.clone())
            .collect()
    }

    // ========================================================================
    // Task mapping
    // ========================================================================

    pub fn get_task_mapping(&self) -> BTreeMap<TaskType, Vec<String>> {
        self.task_map.read().all().clone()
    }

    /// Replace the preference list of `task_type`
    pub fn set_task_mapping(&self, task_type: impl Into<TaskType>, providers: Vec<String>) {
        let task_type = task_type.into();
        self.task_map.write().set(task_type.clone(), providers.clone());

        info!("Task mapping for '{}' set to {:?}", task_type, providers);
        self.event_bus.publish(RouterEvent::TaskMappingChanged {
            task_type,
            providers,
            changed_at: Utc::now(),
        });
    }

    // ========================================================================
    // Selection and execution
    // ========================================================================

    pub fn select_provider_for_task(&self, task_type: impl Into<TaskType>) -> RouterResult<ProviderSelection> {
        self.select(&task_type.into())
    }

    /// Select a provider for `task_type` and run the task on it
    pub async fn execute_task(
        &self,
        task_type: impl Into<TaskType>,
        payload: impl Into<TaskPayload>,
        options: ExecutionOptions,
    ) -> RouterResult<TaskExecution> {
        let task_type = task_type.into();
        let payload = payload.into();

        let (selection, adapter) = self.prepare(&task_type)?;
        self.executor
            .execute(&task_type, &selection, adapter, &payload, &options)
            .await
    }

    /// Streaming variant of [`execute_task`](Self::execute_task).
    ///
    /// `argument` is either a chunk handler (`StreamArgument::on_chunk`) or a
    /// [`StreamOptions`](crate::domain::execution::StreamOptions) carrying
    /// every handler. Fails with `StreamingUnsupported` before any chunk is
    /// delivered when the selected provider cannot stream.
    pub async fn execute_task_stream(
        &self,
        task_type: impl Into<TaskType>,
        prompt: &str,
        argument: impl Into<StreamArgument>,
        on_complete: Option<CompleteHandler>,
        options: Option<ExecutionOptions>,
    ) -> RouterResult<StreamExecution> {
        let task_type = task_type.into();
        let handlers = StreamHandlers::normalize(argument.into(), on_complete, options);

        let (selection, adapter) = self.prepare(&task_type)?;
        let capabilities = self.effective_capabilities(&selection.provider_type, adapter.as_ref());
        self.executor
            .execute_stream(&task_type, &selection, adapter, &capabilities, prompt, handlers)
            .await
    }

    /// Selection plus instance lookup; failures are booked before returning
    fn prepare(&self, task_type: &TaskType) -> RouterResult<(ProviderSelection, Arc<dyn ProviderAdapter>)> {
        let selection = match self.select(task_type) {
            Ok(selection) => selection,
            Err(e) => {
                self.executor.record_rejected(task_type, None, &e);
                return Err(e);
            }
        };

        match self.instance(&selection.provider_type) {
            Ok(adapter) => Ok((selection, adapter)),
            Err(e) => {
                self.executor
                    .record_rejected(task_type, Some(&selection.provider_type), &e);
                Err(e)
            }
        }
    }

    fn select(&self, task_type: &TaskType) -> RouterResult<ProviderSelection> {
        let candidates = self.candidates();
        let preferences = self.task_map.read().get(task_type).to_vec();

        let selection = self.selector.select(task_type, &preferences, &candidates)?;
        self.event_bus.publish(RouterEvent::ProviderSelected {
            task_type: task_type.clone(),
            provider_type: selection.provider_type.clone(),
            tier: selection.tier,
            selected_at: Utc::now(),
        });
        Ok(selection)
    }

    /// Snapshot every configured provider in activation order.
    ///
    /// Adapters are only built for providers whose configuration is
    /// available; a construction failure marks the provider unavailable.
    pub fn candidates(&self) -> Vec<ProviderCandidate> {
        let configurations = self.configurations.read().clone();

        configurations
            .into_iter()
            .map(|config| {
                if !config.is_available() {
                    let capabilities = config.capabilities.clone().unwrap_or_default();
                    return ProviderCandidate::new(config.provider_type, capabilities, false);
                }

                match self.instance(&config.provider_type) {
                    Ok(adapter) => {
                        let capabilities = config
                            .capabilities
                            .clone()
                            .unwrap_or_else(|| adapter.capabilities().clone());
                        ProviderCandidate::new(config.provider_type, capabilities, adapter.is_available())
                    }
                    Err(e) => {
                        warn!("Provider '{}' treated as unavailable: {}", config.provider_type, e);
                        let capabilities = config.capabilities.clone().unwrap_or_default();
                        ProviderCandidate::new(config.provider_type, capabilities, false)
                    }
                }
            })
            .collect()
    }

    /// Cached instance for `provider_type`, built on first use.
    ///
    /// A build that raced with a configuration or constructor change is
    /// dropped and redone from the current state.
    fn instance(&self, provider_type: &str) -> RouterResult<Arc<dyn ProviderAdapter>> {
        loop {
            if let Some(adapter) = self.instances.get(provider_type) {
                return Ok(adapter.clone());
            }

            // Read before the configuration so a concurrent change is always seen
            let generation = self.generation(provider_type);

            let config = self
                .configuration(provider_type)
                .ok_or_else(|| RouterError::ProviderNotConfigured(provider_type.to_string()))?;
            let registration = self
                .registry
                .read()
                .get(provider_type)
                .cloned()
                .ok_or_else(|| RouterError::UnregisteredProvider(provider_type.to_string()))?;

            let adapter = registration
                .build(&config)
                .map_err(|source| RouterError::AdapterConstruction {
                    provider: provider_type.to_string(),
                    source,
                })?;

            match self.instances.entry(provider_type.to_string()) {
                Entry::Occupied(existing) => return Ok(existing.get().clone()),
                Entry::Vacant(slot) if self.generation(provider_type) == generation => {
                    debug!("Built adapter instance for provider '{}'", provider_type);
                    return Ok(slot.insert(adapter).clone());
                }
                Entry::Vacant(_) => {
                    debug!(
                        "Discarding adapter for provider '{}' built from a replaced configuration",
                        provider_type
                    );
                }
            }
        }
    }

    fn generation(&self, provider_type: &str) -> u64 {
        self.generations.get(provider_type).map(|g| *g).unwrap_or(0)
    }

    /// Mark any cached or in-flight instance of `provider_type` as stale
    fn invalidate(&self, provider_type: &str) {
        *self.generations.entry(provider_type.to_string()).or_insert(0) += 1;
        self.instances.remove(provider_type);
    }

    fn configuration(&self, provider_type: &str) -> Option<ProviderConfiguration> {
        self.configurations
            .read()
            .iter()
            .find(|c| c.provider_type == provider_type)
            .cloned()
    }

    /// Configuration override wins over the instance's declared set
    fn effective_capabilities(&self, provider_type: &str, adapter: &dyn ProviderAdapter) -> CapabilitySet {
        self.configuration(provider_type)
            .and_then(|c| c.capabilities)
            .unwrap_or_else(|| adapter.capabilities().clone())
    }

    // ========================================================================
    // Health and metrics
    // ========================================================================

    /// Probe `provider_type`. Without a built instance the result is
    /// `unavailable` and no probe runs.
    pub async fn get_provider_health(&self, provider_type: &str) -> HealthStatus {
        let adapter = self.instances.get(provider_type).map(|a| a.clone());
        self.health.check(provider_type, adapter).await
    }

    /// Probe every active provider concurrently
    pub async fn check_all_health(&self) -> BTreeMap<String, HealthStatus> {
        let active = self.get_active_providers();
        let checks = active.iter().map(|provider_type| async move {
            let adapter = self.instance(provider_type).ok();
            let status = self.health.check(provider_type, adapter).await;
            (provider_type.clone(), status)
        });

        futures::future::join_all(checks).await.into_iter().collect()
    }

    /// Most recent cached health result, without probing
    pub fn last_health(&self, provider_type: &str) -> Option<HealthStatus> {
        self.health.latest(provider_type)
    }

    pub fn get_provider_metrics(&self, provider_type: &str) -> Option<MetricsSnapshot> {
        self.metrics.snapshot(provider_type)
    }

    pub fn get_all_provider_metrics(&self) -> BTreeMap<String, MetricsSnapshot> {
        self.metrics.all()
    }

    /// Combined view of registrations, configurations, health and metrics
    pub fn status_report(&self) -> RouterStatusReport {
        let registered = self.get_registered_providers();
        let configurations = self.configurations.read().clone();

        let providers = configurations
            .iter()
            .map(|config| ProviderStatus {
                provider_type: config.provider_type.clone(),
                registered: registered.contains(&config.provider_type),
                is_active: config.is_active,
                available: config.is_available(),
                instantiated: self.instances.contains_key(&config.provider_type),
                health: self.health.latest(&config.provider_type),
                metrics: self.metrics.snapshot(&config.provider_type),
            })
            .collect();

        RouterStatusReport {
            generated_at: Utc::now(),
            registered,
            providers,
            task_mapping: self.get_task_mapping(),
        }
    }

    pub fn subscribe_events(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }
}

impl Default for ProviderRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RouterStatusReport {
    pub generated_at: chrono::DateTime<Utc>,
    pub registered: Vec<String>,
    pub providers: Vec<ProviderStatus>,
    pub task_mapping: BTreeMap<TaskType, Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub provider_type: String,
    pub registered: bool,
    pub is_active: bool,
    pub available: bool,
    pub instantiated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unbuildable(_config: &ProviderConfiguration) -> Result<Arc<dyn ProviderAdapter>, ProviderError> {
        Err(ProviderError::Authentication("rejected key".to_string()))
    }

    #[test]
    fn test_add_user_provider_requires_registration() {
        let router = ProviderRouter::new();
        let err = router
            .add_user_provider(ProviderConfiguration::new("gemini").with_api_key("k"))
            .unwrap_err();
        assert!(matches!(err, RouterError::UnregisteredProvider(ref p) if p == "gemini"));
    }

    #[test]
    fn test_active_provider_requires_key() {
        let router = ProviderRouter::new();
        router.register_provider("zai", unbuildable, ProviderDefaults::default());

        let err = router
            .add_user_provider(ProviderConfiguration::new("zai"))
            .unwrap_err();
        assert!(matches!(err, RouterError::MissingApiKey(_)));

        router
            .add_user_provider(ProviderConfiguration::new("zai").inactive())
            .unwrap();
        assert!(router.get_active_providers().is_empty());
    }

    #[test]
    fn test_unregister_refused_while_configured() {
        let router = ProviderRouter::new();
        router.register_provider("zai", unbuildable, ProviderDefaults::default());
        router
            .add_user_provider(ProviderConfiguration::new("zai").inactive())
            .unwrap();

        let err = router.unregister_provider("zai").unwrap_err();
        assert!(matches!(err, RouterError::ProviderInUse(_)));
        assert_eq!(
            err.to_string(),
            "Provider 'zai' is referenced by a user configuration"
        );
        assert!(router.remove_user_provider("zai"));
        assert!(router.unregister_provider("zai").unwrap());
        assert!(!router.unregister_provider("zai").unwrap());
    }

    #[test]
    fn test_construction_failure_marks_candidate_unavailable() {
        let router = ProviderRouter::new();
        router.register_provider("gemini", unbuildable, ProviderDefaults::default());
        router
            .add_user_provider(ProviderConfiguration::new("gemini").with_api_key("k"))
            .unwrap();

        let candidates = router.candidates();
        assert_eq!(candidates.len(), 1);
        assert!(!candidates[0].available);
        assert!(matches!(
            router.select_provider_for_task(TaskType::TextGeneration),
            Err(RouterError::NoProviderAvailable(_))
        ));
    }

    #[test]
    fn test_initialize_runs_once() {
        let mut config = RouterConfig::default();
        config.spec.providers = vec![ProviderConfiguration::new("ghost").with_api_key("k")];

        let router = ProviderRouter::from_config(&config);
        assert_eq!(router.initialize(), 0);
        assert_eq!(router.initialize(), 0);
        assert!(router.get_active_providers().is_empty());
    }

    #[test]
    fn test_set_task_mapping_replaces_entry() {
        let router = ProviderRouter::new();
        router.set_task_mapping("vision", vec!["local".to_string()]);
        assert_eq!(
            router.get_task_mapping().get(&TaskType::Vision),
            Some(&vec!["local".to_string()])
        );
    }
}

// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

// Health Monitor - on-demand liveness probes with a per-provider cache
//
// A probe only runs against an already-built adapter instance. Providers
// without one report `unavailable` without touching the network. The most
// recent result per provider type overwrites the previous one.

use crate::domain::events::RouterEvent;
use crate::domain::health::HealthStatus;
use crate::domain::provider::ProviderAdapter;
use crate::domain::router_config::HealthConfig;
use crate::infrastructure::event_bus::EventBus;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct HealthMonitor {
    statuses: DashMap<String, HealthStatus>,
    probe_timeout: Duration,
    event_bus: Option<EventBus>,
}

impl HealthMonitor {
    pub fn new(config: &HealthConfig) -> Self {
        Self {
            statuses: DashMap::new(),
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Probe `adapter` (if any) and cache the result under `provider_type`
    pub async fn check(
        &self,
        provider_type: &str,
        adapter: Option<Arc<dyn ProviderAdapter>>,
    ) -> HealthStatus {
        let status = match adapter {
            None => {
                debug!("No instance for provider '{}', skipping probe", provider_type);
                HealthStatus::unavailable()
            }
            Some(adapter) => self.probe(provider_type, adapter.as_ref()).await,
        };

        self.statuses.insert(provider_type.to_string(), status.clone());

        if let Some(bus) = &self.event_bus {
            bus.publish(RouterEvent::HealthChecked {
                provider_type: provider_type.to_string(),
                status: status.status,
                latency_ms: status.latency_ms,
                checked_at: Utc::now(),
            });
        }

        status
    }

    async fn probe(&self, provider_type: &str, adapter: &dyn ProviderAdapter) -> HealthStatus {
        let start = Instant::now();
        let outcome = tokio::time::timeout(self.probe_timeout, adapter.health_check()).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(())) => {
                debug!("Provider '{}' healthy ({}ms)", provider_type, latency_ms);
                HealthStatus::healthy(latency_ms)
            }
            Ok(Err(e)) => {
                warn!("Provider '{}' health check failed: {}", provider_type, e);
                HealthStatus::unhealthy(latency_ms, e.to_string())
            }
            Err(_) => {
                warn!(
                    "Provider '{}' health check timed out after {}ms",
                    provider_type,
                    self.probe_timeout.as_millis()
                );
                HealthStatus::unhealthy(
                    latency_ms,
                    format!(
                        "Health check timed out after {}ms",
                        self.probe_timeout.as_millis()
                    ),
                )
            }
        }
    }

    /// Most recent cached result for `provider_type`
    pub fn latest(&self, provider_type: &str) -> Option<HealthStatus> {
        self.statuses.get(provider_type).map(|s| s.clone())
    }

    pub fn all(&self) -> BTreeMap<String, HealthStatus> {
        self.statuses
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Drop the cached result, e.g. when the provider's configuration goes away
    pub fn forget(&self, provider_type: &str) {
        self.statuses.remove(provider_type);
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new(&HealthConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::health::HealthState;

    #[tokio::test]
    async fn test_missing_instance_is_unavailable() {
        let monitor = HealthMonitor::default();
        let status = monitor.check("zai", None).await;

        assert_eq!(status.status, HealthState::Unavailable);
        assert_eq!(status.latency_ms, 0);
        assert_eq!(monitor.latest("zai").unwrap().status, HealthState::Unavailable);
    }

    #[tokio::test]
    async fn test_check_publishes_event() {
        let bus = EventBus::new(8);
        let mut receiver = bus.subscribe();
        let monitor = HealthMonitor::default().with_event_bus(bus);

        monitor.check("gemini", None).await;

        match receiver.recv().await.unwrap() {
            RouterEvent::HealthChecked {
                provider_type,
                status,
                ..
            } => {
                assert_eq!(provider_type, "gemini");
                assert_eq!(status, HealthState::Unavailable);
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_forget_clears_cache() {
        let monitor = HealthMonitor::default();
        tokio_test::block_on(monitor.check("local", None));
        monitor.forget("local");
        assert!(monitor.latest("local").is_none());
        assert!(monitor.all().is_empty());
    }
}

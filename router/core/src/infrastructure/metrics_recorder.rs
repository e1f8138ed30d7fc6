// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

// Metrics Recorder - per-provider rolling success/error/latency tracking
//
// Records live in a sharded concurrent map so concurrent executions against
// the same provider serialize only on that provider's entry. Every record is
// mirrored to the `metrics` facade for whatever exporter the host installs.
// Threshold warnings are observational only and never influence selection.

use crate::domain::events::RouterEvent;
use crate::domain::metrics::{MetricsSnapshot, Outcome, ProviderMetrics};
use crate::domain::router_config::MetricsConfig;
use crate::infrastructure::event_bus::EventBus;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::BTreeMap;
use tracing::warn;

pub const UNKNOWN_PROVIDER: &str = "unknown";

pub struct MetricsRecorder {
    records: DashMap<String, ProviderMetrics>,
    config: MetricsConfig,
    event_bus: Option<EventBus>,
}

impl MetricsRecorder {
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            records: DashMap::new(),
            config,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Record one execution outcome. Latency is only kept for successes.
    pub fn record(&self, provider: &str, outcome: Outcome, latency_ms: Option<u64>) -> MetricsSnapshot {
        let snapshot = {
            let mut entry = self
                .records
                .entry(provider.to_string())
                .or_insert_with(|| ProviderMetrics::new(self.config.window_size));

            match outcome {
                Outcome::Success => entry.record_success(latency_ms.unwrap_or(0)),
                Outcome::Error => entry.record_error(),
            }
            entry.snapshot()
        };

        let outcome_label = match outcome {
            Outcome::Success => "success",
            Outcome::Error => "error",
        };
        metrics::counter!(
            "router_task_total",
            "provider" => provider.to_string(),
            "outcome" => outcome_label
        )
        .increment(1);
        if let (Outcome::Success, Some(latency)) = (outcome, latency_ms) {
            metrics::histogram!("router_task_latency_ms", "provider" => provider.to_string())
                .record(latency as f64);
        }

        self.check_thresholds(provider, &snapshot);
        snapshot
    }

    fn check_thresholds(&self, provider: &str, snapshot: &MetricsSnapshot) {
        let error_rate_exceeded = snapshot.error_rate > self.config.error_rate_threshold;
        let latency_exceeded = snapshot.average_latency_ms > self.config.latency_threshold_ms;

        if !(error_rate_exceeded || latency_exceeded) {
            return;
        }

        if error_rate_exceeded {
            warn!(
                provider,
                error_rate = snapshot.error_rate,
                threshold = self.config.error_rate_threshold,
                "Provider error rate above threshold"
            );
        }
        if latency_exceeded {
            warn!(
                provider,
                average_latency_ms = snapshot.average_latency_ms,
                threshold_ms = self.config.latency_threshold_ms,
                "Provider average latency above threshold"
            );
        }

        if let Some(bus) = &self.event_bus {
            bus.publish(RouterEvent::MetricsThresholdExceeded {
                provider_type: provider.to_string(),
                error_rate: snapshot.error_rate,
                average_latency_ms: snapshot.average_latency_ms,
                detected_at: Utc::now(),
            });
        }
    }

    pub fn snapshot(&self, provider: &str) -> Option<MetricsSnapshot> {
        self.records.get(provider).map(|m| m.snapshot())
    }

    /// Mean of the provider's rolling window (0 when nothing recorded)
    pub fn average_latency(&self, provider: &str) -> f64 {
        self.records
            .get(provider)
            .map(|m| m.average_latency())
            .unwrap_or(0.0)
    }

    /// Snapshots for every provider with at least one recorded event
    pub fn all(&self) -> BTreeMap<String, MetricsSnapshot> {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}

// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::health::HealthState;
use crate::domain::selection::SelectionTier;
use crate::domain::task::TaskType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Observability events emitted by the router
///
/// Published on the router's event bus for dashboards and audit logs. None of
/// them feed back into selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouterEvent {
    ProviderRegistered {
        provider_type: String,
        registered_at: DateTime<Utc>,
    },
    ProviderUnregistered {
        provider_type: String,
        unregistered_at: DateTime<Utc>,
    },
    UserProviderAdded {
        provider_type: String,
        is_active: bool,
        added_at: DateTime<Utc>,
    },
    UserProviderRemoved {
        provider_type: String,
        removed_at: DateTime<Utc>,
    },
    UserProviderActivationChanged {
        provider_type: String,
        is_active: bool,
        changed_at: DateTime<Utc>,
    },
    TaskMappingChanged {
        task_type: TaskType,
        providers: Vec<String>,
        changed_at: DateTime<Utc>,
    },
    ProviderSelected {
        task_type: TaskType,
        provider_type: String,
        tier: SelectionTier,
        selected_at: DateTime<Utc>,
    },
    TaskCompleted {
        execution_id: Uuid,
        task_type: TaskType,
        provider_type: String,
        latency_ms: u64,
        attempts: u32,
        completed_at: DateTime<Utc>,
    },
    TaskFailed {
        execution_id: Uuid,
        task_type: TaskType,
        provider_type: String,
        error: String,
        attempts: u32,
        failed_at: DateTime<Utc>,
    },
    HealthChecked {
        provider_type: String,
        status: HealthState,
        latency_ms: u64,
        checked_at: DateTime<Utc>,
    },
    MetricsThresholdExceeded {
        provider_type: String,
        error_rate: f64,
        average_latency_ms: f64,
        detected_at: DateTime<Utc>,
    },
}

// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
    /// No provider instance exists, so no probe was attempted
    Unavailable,
}

/// Result of the most recent liveness probe for one provider type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub latency_ms: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn healthy(latency_ms: u64) -> Self {
        Self {
            status: HealthState::Healthy,
            latency_ms,
            timestamp: Utc::now(),
            error: None,
        }
    }

    pub fn unhealthy(latency_ms: u64, error: impl Into<String>) -> Self {
        Self {
            status: HealthState::Unhealthy,
            latency_ms,
            timestamp: Utc::now(),
            error: Some(error.into()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            status: HealthState::Unavailable,
            latency_ms: 0,
            timestamp: Utc::now(),
            error: None,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthState::Healthy
    }
}

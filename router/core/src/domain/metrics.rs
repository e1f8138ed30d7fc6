// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

// Provider Metrics - rolling success/error accounting for one provider
//
// Latency samples live in a bounded FIFO window: once full, every new sample
// evicts the oldest one.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_LATENCY_WINDOW: usize = 100;

#[derive(Debug, Clone)]
pub struct ProviderMetrics {
    success_count: u64,
    error_count: u64,
    rolling_latencies: VecDeque<u64>,
    window: usize,
    error_rate: f64,
}

impl ProviderMetrics {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            success_count: 0,
            error_count: 0,
            rolling_latencies: VecDeque::with_capacity(window),
            window,
            error_rate: 0.0,
        }
    }

    pub fn record_success(&mut self, latency_ms: u64) {
        self.success_count += 1;
        if self.rolling_latencies.len() == self.window {
            self.rolling_latencies.pop_front();
        }
        self.rolling_latencies.push_back(latency_ms);
        self.recompute_error_rate();
    }

    pub fn record_error(&mut self) {
        self.error_count += 1;
        self.recompute_error_rate();
    }

    fn recompute_error_rate(&mut self) {
        let total = self.success_count + self.error_count;
        self.error_rate = if total == 0 {
            0.0
        } else {
            self.error_count as f64 / total as f64
        };
    }

    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Arithmetic mean of the current window, 0 when empty
    pub fn average_latency(&self) -> f64 {
        if self.rolling_latencies.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.rolling_latencies.iter().sum();
        sum as f64 / self.rolling_latencies.len() as f64
    }

    pub fn rolling_latencies(&self) -> impl Iterator<Item = u64> + '_ {
        self.rolling_latencies.iter().copied()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            success_count: self.success_count,
            error_count: self.error_count,
            error_rate: self.error_rate,
            average_latency_ms: self.average_latency(),
            samples: self.rolling_latencies.len(),
        }
    }
}

impl Default for ProviderMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY_WINDOW)
    }
}

/// Point-in-time copy of a provider's metrics, for reports and dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub success_count: u64,
    pub error_count: u64,
    pub error_rate: f64,
    pub average_latency_ms: f64,
    pub samples: usize,
}

/// Outcome of one execution, as seen by the metrics recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_strict_fifo() {
        let mut metrics = ProviderMetrics::new(3);
        for latency in [10, 20, 30, 40] {
            metrics.record_success(latency);
        }
        assert_eq!(metrics.rolling_latencies().collect::<Vec<_>>(), vec![20, 30, 40]);
        assert_eq!(metrics.average_latency(), 30.0);
    }

    #[test]
    fn test_errors_do_not_touch_latency() {
        let mut metrics = ProviderMetrics::default();
        metrics.record_success(100);
        metrics.record_error();
        assert_eq!(metrics.rolling_latencies().count(), 1);
        assert_eq!(metrics.error_rate(), 0.5);
        assert_eq!(metrics.average_latency(), 100.0);
    }

    #[test]
    fn test_empty_average_is_zero() {
        assert_eq!(ProviderMetrics::default().average_latency(), 0.0);
    }
}

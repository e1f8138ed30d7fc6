// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure
//!
//! Stateful building blocks the router composes: the adapter registry,
//! per-provider metrics and health caches, and the event bus.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Concurrent state behind the application services

pub mod event_bus;
pub mod health_monitor;
pub mod metrics_recorder;
pub mod registry;

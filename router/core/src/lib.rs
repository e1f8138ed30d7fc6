// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Glassy Router
//!
//! Routes AI tasks to external provider adapters: capability negotiation,
//! three-tier fallback selection, execution, rolling metrics and health.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Library entry point; re-exports the domain vocabulary

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use application::router::{ProviderRouter, ProviderStatus, RouterStatusReport};
pub use domain::*;

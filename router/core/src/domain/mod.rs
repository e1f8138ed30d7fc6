// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Value objects, the provider adapter contract and the router's error and
//! event vocabularies.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Vendor-independent routing vocabulary

pub mod capability;
pub mod task;
pub mod provider;
pub mod provider_config;
pub mod selection;
pub mod execution;
pub mod metrics;
pub mod health;
pub mod events;
pub mod error;
pub mod router_config;

// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Application
//!
//! Use cases built on the domain and infrastructure layers: task mapping,
//! provider selection, task execution and the router service object.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Orchestrates selection and execution for callers

pub mod executor;
pub mod router;
pub mod selector;
pub mod task_mapping;

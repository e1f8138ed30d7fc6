// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Glassy router CLI

pub mod config;
pub mod route;

pub use self::config::ConfigCommand;
pub use self::route::RouteCommand;

// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the three fallback tiers produced a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionTier {
    /// Preferred for the task and capable of it
    TaskSpecific,
    /// Any available provider from the generic-purpose list
    Generic,
    /// The hardcoded provider of last resort
    LastResort,
}

impl fmt::Display for SelectionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SelectionTier::TaskSpecific => "task-specific",
            SelectionTier::Generic => "generic",
            SelectionTier::LastResort => "last-resort",
        };
        f.write_str(name)
    }
}

/// Order in which the task-specific tier walks candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionOrder {
    /// Walk the task's preference list, most preferred first
    #[default]
    Preference,
    /// Walk the active providers in the order they were activated
    Activation,
}

/// Outcome of provider selection for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSelection {
    pub provider_type: String,
    pub tier: SelectionTier,
}

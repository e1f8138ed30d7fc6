// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Capability Descriptor Value Object
//!
//! A [`CapabilitySet`] declares what a provider adapter can do. It always
//! carries an entry for every [`Capability`] flag, so a provider can never
//! declare an empty descriptor: flags it does not mention are `false`.
//!
//! ## Serialized Form
//!
//! Sets serialize as a map of `SCREAMING_SNAKE_CASE` flag names to booleans:
//!
//! ```yaml
//! capabilities:
//!   TEXT: true
//!   STREAMING: true
//!   IMAGES: false
//! ```
//!
//! Missing keys deserialize as `false`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single capability flag a provider may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    Text,
    Audio,
    Images,
    Streaming,
    StructuredOutput,
    SystemInstructions,
    Tools,
    Embeddings,
    FunctionCalling,
    Multimodal,
    CodeExecution,
}

impl Capability {
    /// Every flag, in declaration order.
    pub const ALL: [Capability; 11] = [
        Capability::Text,
        Capability::Audio,
        Capability::Images,
        Capability::Streaming,
        Capability::StructuredOutput,
        Capability::SystemInstructions,
        Capability::Tools,
        Capability::Embeddings,
        Capability::FunctionCalling,
        Capability::Multimodal,
        Capability::CodeExecution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Text => "TEXT",
            Capability::Audio => "AUDIO",
            Capability::Images => "IMAGES",
            Capability::Streaming => "STREAMING",
            Capability::StructuredOutput => "STRUCTURED_OUTPUT",
            Capability::SystemInstructions => "SYSTEM_INSTRUCTIONS",
            Capability::Tools => "TOOLS",
            Capability::Embeddings => "EMBEDDINGS",
            Capability::FunctionCalling => "FUNCTION_CALLING",
            Capability::Multimodal => "MULTIMODAL",
            Capability::CodeExecution => "CODE_EXECUTION",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Capability::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("Unknown capability: {}", s))
    }
}

/// Immutable capability descriptor: one boolean per [`Capability`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Capability, bool>", into = "BTreeMap<Capability, bool>")]
pub struct CapabilitySet {
    flags: BTreeMap<Capability, bool>,
}

impl CapabilitySet {
    /// A descriptor with every flag declared and set to `false`.
    pub fn none() -> Self {
        Self {
            flags: Capability::ALL.iter().map(|c| (*c, false)).collect(),
        }
    }

    /// Build a descriptor where exactly the given flags are `true`.
    pub fn from_flags(enabled: impl IntoIterator<Item = Capability>) -> Self {
        let mut set = Self::none();
        for capability in enabled {
            set.flags.insert(capability, true);
        }
        set
    }

    /// Builder-style toggle, consuming `self`.
    pub fn with(mut self, capability: Capability, enabled: bool) -> Self {
        self.flags.insert(capability, enabled);
        self
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.flags.get(&capability).copied().unwrap_or(false)
    }

    /// Flags currently set to `true`.
    pub fn enabled(&self) -> Vec<Capability> {
        self.flags
            .iter()
            .filter(|(_, on)| **on)
            .map(|(c, _)| *c)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Capability, bool)> + '_ {
        self.flags.iter().map(|(c, on)| (*c, *on))
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::none()
    }
}

impl From<BTreeMap<Capability, bool>> for CapabilitySet {
    fn from(declared: BTreeMap<Capability, bool>) -> Self {
        let mut set = Self::none();
        set.flags.extend(declared);
        set
    }
}

impl From<CapabilitySet> for BTreeMap<Capability, bool> {
    fn from(set: CapabilitySet) -> Self {
        set.flags
    }
}

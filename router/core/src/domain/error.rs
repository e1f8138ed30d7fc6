// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

// Router Errors
//
// Every variant names the provider and/or task type involved so callers can
// log or display a specific message without further context.

use crate::domain::capability::Capability;
use crate::domain::provider::ProviderError;
use crate::domain::task::TaskType;

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("Provider type '{0}' is not registered")]
    UnregisteredProvider(String),

    #[error("Provider '{0}' has no API key configured")]
    MissingApiKey(String),

    #[error("Provider '{0}' is referenced by a user configuration")]
    ProviderInUse(String),

    #[error("Provider '{0}' is not configured")]
    ProviderNotConfigured(String),

    #[error("Failed to construct adapter for provider '{provider}': {source}")]
    AdapterConstruction {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("Provider '{provider}' lacks {capability} required by task '{task_type}'")]
    CapabilityUnsupported {
        provider: String,
        task_type: TaskType,
        capability: Capability,
    },

    #[error("Provider '{provider}' lacks STREAMING required to stream task '{task_type}'")]
    StreamingUnsupported { provider: String, task_type: TaskType },

    #[error("Task type '{0}' has no adapter operation")]
    UnsupportedTask(TaskType),

    #[error("Invalid payload for task '{task_type}': {reason}")]
    InvalidPayload { task_type: TaskType, reason: String },

    #[error("No provider available for task '{0}'")]
    NoProviderAvailable(TaskType),

    #[error("Provider '{provider}' failed task '{task_type}': {source}")]
    Provider {
        provider: String,
        task_type: TaskType,
        #[source]
        source: ProviderError,
    },

    #[error("Task '{task_type}' on provider '{provider}' was cancelled")]
    Cancelled { provider: String, task_type: TaskType },

    #[error("Task '{task_type}' on provider '{provider}' timed out after {timeout_ms}ms")]
    TimedOut {
        provider: String,
        task_type: TaskType,
        timeout_ms: u64,
    },
}

impl RouterError {
    /// Provider the error is attributed to, when one was identified
    pub fn provider(&self) -> Option<&str> {
        match self {
            RouterError::UnregisteredProvider(p)
            | RouterError::MissingApiKey(p)
            | RouterError::ProviderInUse(p)
            | RouterError::ProviderNotConfigured(p) => Some(p),
            RouterError::AdapterConstruction { provider, .. }
            | RouterError::CapabilityUnsupported { provider, .. }
            | RouterError::StreamingUnsupported { provider, .. }
            | RouterError::Provider { provider, .. }
            | RouterError::Cancelled { provider, .. }
            | RouterError::TimedOut { provider, .. } => Some(provider),
            RouterError::UnsupportedTask(_)
            | RouterError::InvalidPayload { .. }
            | RouterError::NoProviderAvailable(_) => None,
        }
    }

    /// Underlying adapter error, if this wraps one
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            RouterError::Provider { source, .. } | RouterError::AdapterConstruction { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

pub type RouterResult<T> = Result<T, RouterError>;

// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

// Provider Configuration - per-user/tenant settings for one provider type
//
// Owned by the caller's settings store; the router keeps a read-through copy
// keyed by provider type.

use crate::domain::capability::CapabilitySet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfiguration {
    /// Provider type; must match a registered adapter (e.g., "gemini", "zai")
    #[serde(rename = "type")]
    pub provider_type: String,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model identifier override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Capability override; wins over the adapter's declared set when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<CapabilitySet>,

    /// Whether this provider participates in selection
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ProviderConfiguration {
    pub fn new(provider_type: impl Into<String>) -> Self {
        Self {
            provider_type: provider_type.into(),
            api_key: None,
            base_url: None,
            model: None,
            capabilities: None,
            is_active: true,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_capabilities(mut self, capabilities: CapabilitySet) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }

    /// Availability as far as configuration goes: active and keyed
    pub fn is_available(&self) -> bool {
        self.is_active && self.has_api_key()
    }

    /// Layer `self` over registration defaults; fields set here win
    pub fn merged_over(&self, defaults: &ProviderDefaults) -> Self {
        Self {
            provider_type: self.provider_type.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone().or_else(|| defaults.base_url.clone()),
            model: self.model.clone().or_else(|| defaults.model.clone()),
            capabilities: self.capabilities.clone(),
            is_active: self.is_active,
        }
    }

    /// Resolve the "env:VAR_NAME" indirection in `api_key`.
    ///
    /// An unset variable resolves to no key, which leaves the provider
    /// unavailable rather than failing configuration loading.
    pub fn resolve_api_key(&mut self) {
        if let Some(var_name) = self.api_key.as_deref().and_then(|k| k.strip_prefix("env:")) {
            match std::env::var(var_name) {
                Ok(value) => self.api_key = Some(value),
                Err(_) => {
                    tracing::warn!(
                        "Environment variable not set: {} (provider '{}')",
                        var_name,
                        self.provider_type
                    );
                    self.api_key = None;
                }
            }
        }
    }
}

/// Defaults a provider registration contributes to every configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_blank_key_is_unavailable() {
        assert!(!ProviderConfiguration::new("gemini").is_available());
        assert!(!ProviderConfiguration::new("gemini").with_api_key("   ").is_available());
        assert!(!ProviderConfiguration::new("gemini").with_api_key("k").inactive().is_available());
        assert!(ProviderConfiguration::new("gemini").with_api_key("k").is_available());
    }

    #[test]
    fn test_merge_prefers_user_settings() {
        let defaults = ProviderDefaults {
            base_url: Some("https://default.example".to_string()),
            model: Some("default-model".to_string()),
        };
        let merged = ProviderConfiguration::new("zai")
            .with_model("glm-4.6")
            .merged_over(&defaults);

        assert_eq!(merged.model.as_deref(), Some("glm-4.6"));
        assert_eq!(merged.base_url.as_deref(), Some("https://default.example"));
    }

    #[test]
    fn test_env_key_resolution() {
        std::env::set_var("GLASSY_TEST_PROVIDER_KEY", "secret");
        let mut config = ProviderConfiguration::new("gemini").with_api_key("env:GLASSY_TEST_PROVIDER_KEY");
        config.resolve_api_key();
        assert_eq!(config.api_key.as_deref(), Some("secret"));

        let mut missing = ProviderConfiguration::new("gemini").with_api_key("env:GLASSY_TEST_UNSET_KEY_XYZ");
        missing.resolve_api_key();
        assert_eq!(missing.api_key, None);
    }
}

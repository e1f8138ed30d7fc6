// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

// Router Configuration Types
//
// Defines the configuration schema for the AI provider router:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - User provider configurations (BYOK api keys, capability overrides)
// - Task-to-provider preference overrides
// - Fallback tiers and selection order
// - Retry policy (global and per task type)
// - Metrics thresholds and observability settings

use crate::domain::provider_config::ProviderConfiguration;
use crate::domain::selection::SelectionOrder;
use crate::domain::task::TaskType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_VERSION: &str = "glassy.dev/v1";
pub const KIND: &str = "RouterConfig";

/// Top-level Kubernetes-style router configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfigManifest {
    /// API version (must be "glassy.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "RouterConfig")
    pub kind: String,

    /// Router metadata (name, labels, version)
    pub metadata: ManifestMetadata,

    /// Router configuration specification
    pub spec: RouterConfigSpec,
}

pub type RouterConfig = RouterConfigManifest;

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable deployment name
    pub name: String,

    /// Optional: Configuration version for tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Optional: Labels for categorization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Router configuration specification (content under spec:)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RouterConfigSpec {
    /// User provider configurations, in activation order
    #[serde(default)]
    pub providers: Vec<ProviderConfiguration>,

    /// Task type -> preference list overrides (merged over built-in defaults)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub task_mapping: BTreeMap<TaskType, Vec<String>>,

    /// Fallback tiers and selection order
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Retry policy for adapter calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Rolling metrics window and warning thresholds
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Liveness probe settings
    #[serde(default)]
    pub health: HealthConfig,

    /// Observability configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Candidate order for the task-specific tier
    #[serde(default)]
    pub order: SelectionOrder,

    /// Generic-purpose providers tried (in order) when no task-specific match exists
    #[serde(default = "default_generic_fallback")]
    pub generic_fallback: Vec<String>,

    /// Provider of last resort
    #[serde(default = "default_last_resort")]
    pub last_resort: String,
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = no retry)
    #[serde(default)]
    pub max_retries: u32,

    /// Initial delay between attempts in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Upper bound for the backoff delay in milliseconds
    #[serde(default = "default_max_retry_delay")]
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RetryConfig {
    /// Policy applied to every task type without an override
    #[serde(flatten)]
    pub default: RetryPolicy,

    /// Per-task-type overrides
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub per_task: BTreeMap<TaskType, RetryPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Number of latency samples kept per provider
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Warn when a provider's error rate exceeds this fraction
    #[serde(default = "default_error_rate_threshold")]
    pub error_rate_threshold: f64,

    /// Warn when a provider's average latency exceeds this many milliseconds
    #[serde(default = "default_latency_threshold")]
    pub latency_threshold_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Deadline for a single liveness probe in milliseconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Logging configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_generic_fallback() -> Vec<String> {
    vec!["gemini".to_string(), "zai".to_string(), "local".to_string()]
}

fn default_last_resort() -> String {
    "gemini".to_string()
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_max_retry_delay() -> u64 {
    30_000
}

fn default_window_size() -> usize {
    crate::domain::metrics::DEFAULT_LATENCY_WINDOW
}

fn default_error_rate_threshold() -> f64 {
    0.10
}

fn default_latency_threshold() -> f64 {
    10_000.0
}

fn default_probe_timeout() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

const LOG_FORMATS: [&str; 2] = ["text", "json"];

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl RouterConfigSpec {
    /// Logging settings, when the manifest carries any
    pub fn logging(&self) -> Option<&LoggingConfig> {
        self.observability.as_ref().and_then(|o| o.logging.as_ref())
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            order: SelectionOrder::default(),
            generic_fallback: default_generic_fallback(),
            last_resort: default_last_resort(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_delay_ms: default_retry_delay(),
            max_delay_ms: default_max_retry_delay(),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (0-based): delay * 2^attempt, capped
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt);
        let delay = self.retry_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

impl RetryConfig {
    pub fn policy_for(&self, task_type: &TaskType) -> &RetryPolicy {
        self.per_task.get(task_type).unwrap_or(&self.default)
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            error_rate_threshold: default_error_rate_threshold(),
            latency_threshold_ms: default_latency_threshold(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

impl Default for RouterConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "glassy-router".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: RouterConfigSpec::default(),
        }
    }
}

impl RouterConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. GLASSY_ROUTER_CONFIG_PATH environment variable
    /// 2. ./glassy-router.yaml (working directory)
    /// 3. ~/.glassy/router.yaml (user home)
    /// 4. /etc/glassy/router.yaml (system, Unix) or C:\ProgramData\Glassy\router.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("GLASSY_ROUTER_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./glassy-router.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".glassy").join("router.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/glassy/router.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Glassy\\router.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // 1. Explicit CLI path (Fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        // 2. Discovery (Env -> Cwd -> Home -> System)
        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using empty defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GLASSY_ROUTER_SELECTION_ORDER") {
            match val.to_lowercase().as_str() {
                "preference" => {
                    tracing::info!("Environment override: GLASSY_ROUTER_SELECTION_ORDER=preference");
                    self.spec.selection.order = SelectionOrder::Preference;
                }
                "activation" => {
                    tracing::info!("Environment override: GLASSY_ROUTER_SELECTION_ORDER=activation");
                    self.spec.selection.order = SelectionOrder::Activation;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for GLASSY_ROUTER_SELECTION_ORDER: '{}'. Expected preference/activation. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("GLASSY_ROUTER_MAX_RETRIES") {
            match val.parse::<u32>() {
                Ok(retries) => {
                    tracing::info!("Environment override: GLASSY_ROUTER_MAX_RETRIES={}", retries);
                    self.spec.retry.default.max_retries = retries;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for GLASSY_ROUTER_MAX_RETRIES: '{}'. Expected an integer. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let mut seen = HashSet::new();
        for provider in &self.spec.providers {
            if provider.provider_type.trim().is_empty() {
                anyhow::bail!("Provider type cannot be empty");
            }
            if !seen.insert(provider.provider_type.as_str()) {
                anyhow::bail!("Provider '{}' is configured more than once", provider.provider_type);
            }
        }

        for (task_type, providers) in &self.spec.task_mapping {
            if providers.iter().any(|p| p.trim().is_empty()) {
                anyhow::bail!("Task mapping for '{}' contains an empty provider type", task_type);
            }
        }

        if self.spec.selection.last_resort.trim().is_empty() {
            anyhow::bail!("selection.last_resort cannot be empty");
        }

        if self.spec.metrics.window_size == 0 {
            anyhow::bail!("metrics.window_size must be at least 1");
        }

        if !(0.0..=1.0).contains(&self.spec.metrics.error_rate_threshold) {
            anyhow::bail!(
                "metrics.error_rate_threshold must be between 0.0 and 1.0, got {}",
                self.spec.metrics.error_rate_threshold
            );
        }

        if let Some(logging) = self.spec.logging() {
            if !LOG_FORMATS.iter().any(|f| logging.format.eq_ignore_ascii_case(f)) {
                anyhow::bail!(
                    "observability.logging.format must be one of {:?}, got '{}'",
                    LOG_FORMATS,
                    logging.format
                );
            }
        }

        Ok(())
    }
}

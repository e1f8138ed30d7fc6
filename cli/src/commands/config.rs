// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use glassy_router::capability::Capability;
use glassy_router::router_config::RouterConfig;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./glassy-router.yaml")]
        output: PathBuf,

        /// Include every section with comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(&output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = RouterConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. GLASSY_ROUTER_CONFIG_PATH: {}",
            std::env::var("GLASSY_ROUTER_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./glassy-router.yaml");
        println!("  4. ~/.glassy/router.yaml");
        println!("  5. /etc/glassy/router.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    let spec = &config.spec;

    println!("{}", "Providers:".bold());
    if spec.providers.is_empty() {
        println!("  {}", "(none configured)".dimmed());
    }
    for provider in &spec.providers {
        let state = if provider.is_active {
            "active".green()
        } else {
            "inactive".yellow()
        };
        println!("  {} ({})", provider.provider_type.bold(), state);
        if let Some(model) = &provider.model {
            println!("    Model: {}", model);
        }
        if let Some(base_url) = &provider.base_url {
            println!("    Endpoint: {}", base_url);
        }
        println!("    API key: {}", describe_key(provider.api_key.as_deref()));
        if let Some(capabilities) = &provider.capabilities {
            let enabled: Vec<&str> = capabilities.enabled().iter().map(Capability::as_str).collect();
            println!("    Capabilities (override): {}", enabled.join(", "));
        }
    }
    println!();

    println!("{}", "Selection:".bold());
    println!("  Order: {:?}", spec.selection.order);
    println!("  Generic fallback: {}", spec.selection.generic_fallback.join(" → "));
    println!("  Last resort: {}", spec.selection.last_resort);
    println!();

    println!("{}", "Retry:".bold());
    println!(
        "  Max retries: {} (delay {}ms, cap {}ms)",
        spec.retry.default.max_retries, spec.retry.default.retry_delay_ms, spec.retry.default.max_delay_ms
    );
    for (task_type, policy) in &spec.retry.per_task {
        println!("    {}: {} retries", task_type, policy.max_retries);
    }
    println!();

    println!("{}", "Metrics:".bold());
    println!("  Window: {} samples", spec.metrics.window_size);
    println!(
        "  Warn above: {:.0}% errors or {}ms average latency",
        spec.metrics.error_rate_threshold * 100.0,
        spec.metrics.latency_threshold_ms
    );
    println!("  Health probe timeout: {}ms", spec.health.probe_timeout_ms);

    if let Some(logging) = spec.logging() {
        println!();
        println!("{}", "Logging:".bold());
        println!("  Level: {} ({})", logging.level, logging.format);
    }

    Ok(())
}

/// Never print key material
fn describe_key(api_key: Option<&str>) -> String {
    match api_key {
        None => "(missing)".red().to_string(),
        Some(key) if key.trim().is_empty() => "(missing)".red().to_string(),
        Some(key) => match key.strip_prefix("env:") {
            Some(var) if std::env::var(var).is_ok() => format!("from ${}", var),
            Some(var) => format!("from ${} {}", var, "(not set)".red()),
            None => "(set)".to_string(),
        },
    }
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = RouterConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: &Path, with_examples: bool) -> Result<()> {
    std::fs::write(output, sample(with_examples))
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

fn sample(with_examples: bool) -> &'static str {
    if with_examples {
        include_str!("../../templates/router-with-examples.yaml")
    } else {
        include_str!("../../templates/router-minimal.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_valid_manifests() {
        for with_examples in [false, true] {
            let config = RouterConfig::from_yaml_str(sample(with_examples)).unwrap();
            config.validate().unwrap();
        }
    }

    #[tokio::test]
    async fn test_generate_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("router.yaml");

        generate(&output, true).await.unwrap();

        let config = RouterConfig::from_yaml_file(&output).unwrap();
        assert_eq!(config.spec.providers.len(), 3);
    }

    #[test]
    fn test_describe_key_hides_secrets() {
        assert!(!describe_key(Some("sk-secret")).contains("sk-secret"));
        assert!(describe_key(Some("env:GLASSY_CLI_TEST_UNSET")).contains("not set"));
    }
}

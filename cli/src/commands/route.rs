// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Routing inspection commands
//!
//! Commands: tasks, explain
//!
//! Both run offline against the configuration. `explain` feeds the configured
//! providers to the selector using their capability overrides, since no
//! adapter is instantiated here.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use glassy_router::application::selector::{ProviderCandidate, ProviderSelector};
use glassy_router::application::task_mapping::TaskProviderMap;
use glassy_router::router_config::RouterConfig;
use glassy_router::task::TaskType;

#[derive(Subcommand)]
pub enum RouteCommand {
    /// Print the effective task-to-provider map
    Tasks,

    /// Dry-run provider selection for a task type
    Explain {
        /// Task type (e.g. text-generation, vision)
        #[arg(short, long)]
        task: String,

        /// Print the selection as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_command(command: RouteCommand, config_override: Option<PathBuf>) -> Result<()> {
    let config = RouterConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;

    match command {
        RouteCommand::Tasks => tasks(&config),
        RouteCommand::Explain { task, json } => explain(&config, TaskType::from(task), json),
    }
}

fn tasks(config: &RouterConfig) -> Result<()> {
    let map = TaskProviderMap::with_overrides(&config.spec.task_mapping);

    println!("{}", "Task mapping:".bold());
    for (task_type, providers) in map.all() {
        let required = task_type
            .required_capability()
            .map(|c| c.as_str())
            .unwrap_or("-");
        println!(
            "  {:<22} {:<18} {}",
            task_type.to_string().bold(),
            required.dimmed(),
            providers.join(" → ")
        );
    }

    Ok(())
}

/// Candidates as the live router would see them before any adapter is built
fn candidates(config: &RouterConfig) -> Vec<ProviderCandidate> {
    config
        .spec
        .providers
        .iter()
        .map(|provider| {
            let mut provider = provider.clone();
            provider.resolve_api_key();
            let available = provider.is_available();
            ProviderCandidate::new(
                provider.provider_type,
                provider.capabilities.unwrap_or_default(),
                available,
            )
        })
        .collect()
}

fn explain(config: &RouterConfig, task_type: TaskType, json: bool) -> Result<()> {
    let map = TaskProviderMap::with_overrides(&config.spec.task_mapping);
    let preferences = map.get(&task_type);
    let candidates = candidates(config);
    let selector = ProviderSelector::new(config.spec.selection.clone());

    let selection = selector
        .select(&task_type, preferences, &candidates)
        .with_context(|| format!("No route for task '{}'", task_type))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&selection)?);
        return Ok(());
    }

    println!("{} {}", "Task:".bold(), task_type);
    match task_type.required_capability() {
        Some(capability) => println!("  Requires: {}", capability),
        None => println!("  Requires: {}", "(unknown task type, task tier skipped)".dimmed()),
    }
    println!("  Preferences: {}", preferences.join(" → "));
    println!();

    println!("{}", "Candidates (activation order):".bold());
    for candidate in &candidates {
        let availability = if candidate.available {
            "available".green()
        } else {
            "unavailable".red()
        };
        let capability = if candidate.supports_task(&task_type) {
            "capable".green()
        } else {
            "not capable".yellow()
        };
        println!(
            "  {:<12} {:<12} {}",
            candidate.provider_type, availability, capability
        );
    }
    println!();

    println!(
        "{} {} ({} tier)",
        "Selected:".bold(),
        selection.provider_type.green().bold(),
        selection.tier
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glassy_router::selection::SelectionTier;

    const MANIFEST: &str = r#"
apiVersion: glassy.dev/v1
kind: RouterConfig
metadata:
  name: cli-test
spec:
  providers:
    - type: zai
      api_key: k
      capabilities:
        TEXT: true
    - type: gemini
      is_active: false
"#;

    #[test]
    fn test_candidates_use_overrides_and_keys() {
        let config = RouterConfig::from_yaml_str(MANIFEST).unwrap();
        let candidates = candidates(&config);

        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].available);
        assert!(candidates[0].supports_task(&TaskType::TextGeneration));
        assert!(!candidates[1].available);
    }

    #[test]
    fn test_explain_selects_like_the_router() {
        let config = RouterConfig::from_yaml_str(MANIFEST).unwrap();
        let selector = ProviderSelector::new(config.spec.selection.clone());
        let map = TaskProviderMap::with_overrides(&config.spec.task_mapping);

        let selection = selector
            .select(&TaskType::TextGeneration, map.get(&TaskType::TextGeneration), &candidates(&config))
            .unwrap();
        assert_eq!(selection.provider_type, "zai");
        assert_eq!(selection.tier, SelectionTier::TaskSpecific);

        assert!(explain(&config, TaskType::Vision, false).is_ok());
    }
}

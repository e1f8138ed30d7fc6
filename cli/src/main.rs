// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

//! # Glassy Router CLI
//!
//! The `glassy-router` binary inspects router configuration and explains
//! routing decisions without contacting any provider.
//!
//! ## Commands
//!
//! - `glassy-router config show|validate|generate` - Configuration management
//! - `glassy-router route tasks|explain` - Task mapping and dry-run selection

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use glassy_router::router_config::{LoggingConfig, RouterConfig};
use std::path::PathBuf;

mod commands;

use commands::{ConfigCommand, RouteCommand};

/// Glassy Router - task-aware AI provider routing
#[derive(Parser)]
#[command(name = "glassy-router")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "GLASSY_ROUTER_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error) [default: configured level, else warn]
    #[arg(long, global = true, env = "GLASSY_ROUTER_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Task mapping and selection inspection
    #[command(name = "route")]
    Route {
        #[command(subcommand)]
        command: RouteCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // A broken config is reported by the command itself
    let logging = RouterConfig::load_or_default(cli.config.clone())
        .ok()
        .and_then(|config| config.spec.logging().cloned());
    init_logging(cli.log_level.as_deref(), logging.as_ref())?;

    match cli.command {
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Route { command }) => {
            commands::route::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Level used when `RUST_LOG` is unset: `--log-level`, then the config file
fn log_level<'a>(flag: Option<&'a str>, logging: Option<&'a LoggingConfig>) -> &'a str {
    flag.or(logging.map(|l| l.level.as_str()))
        .unwrap_or(DEFAULT_LOG_LEVEL)
}

/// Initialize tracing subscriber for logging
fn init_logging(flag: Option<&str>, logging: Option<&LoggingConfig>) -> Result<()> {
    let level = log_level(flag, logging);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if logging.is_some_and(LoggingConfig::is_json) {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(level: &str) -> LoggingConfig {
        LoggingConfig {
            level: level.to_string(),
            format: "json".to_string(),
        }
    }

    #[test]
    fn test_flag_wins_over_config() {
        let logging = configured("debug");
        assert_eq!(log_level(Some("error"), Some(&logging)), "error");
        assert_eq!(log_level(None, Some(&logging)), "debug");
        assert_eq!(log_level(None, None), DEFAULT_LOG_LEVEL);
    }
}

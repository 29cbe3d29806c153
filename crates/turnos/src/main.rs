// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turnos - turn numbering and queue ordering for public service points.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod queue;
mod seed;
mod serve;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use turnos_config::{ConfigError, TurnosConfig};
use turnos_core::TurnosError;

/// Turnos - turn numbering and queue ordering for public service points.
#[derive(Parser, Debug)]
#[command(name = "turnos", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API.
    Serve,
    /// Register the sample service points in the database.
    Seed,
    /// Print the dispatch order of one service point.
    Queue {
        /// Service point id.
        service_point: i64,
        /// Day to show (YYYY-MM-DD); today when omitted.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Inspect the effective configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the merged configuration as TOML, secrets redacted.
    Show,
    /// Load and validate the configuration, then exit.
    Validate,
}

fn load_config(path: Option<&std::path::Path>) -> Result<TurnosConfig, Vec<ConfigError>> {
    match path {
        Some(path) => turnos_config::load_and_validate_path(path),
        None => turnos_config::load_and_validate(),
    }
}

/// Render the configuration as TOML with the bearer token masked.
fn redacted_toml(config: &TurnosConfig) -> Result<String, TurnosError> {
    let mut shown = config.clone();
    if shown.gateway.bearer_token.is_some() {
        shown.gateway.bearer_token = Some("[redacted]".to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| TurnosError::Internal(format!("failed to render configuration: {e}")))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            turnos_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Seed) => {
            serve::init_tracing(&config.service.log_level);
            seed::run_seed(&config).await
        }
        Some(Commands::Queue {
            service_point,
            date,
        }) => {
            serve::init_tracing(&config.service.log_level);
            queue::run_queue(&config, service_point, date).await
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => redacted_toml(&config).map(|text| print!("{text}")),
            ConfigAction::Validate => {
                println!("turnos: configuration is valid");
                Ok(())
            }
        },
        None => {
            println!("turnos: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

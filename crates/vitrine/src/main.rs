// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vitrine - a resilient dashboard display client.
//!
//! This is the binary entry point for the Vitrine client.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use vitrine_config::VitrineConfig;

mod doctor;
mod run;

/// Vitrine - a resilient dashboard display client.
#[derive(Parser, Debug)]
#[command(name = "vitrine", version, about, long_about = None)]
struct Cli {
    /// Path to a config file (overrides the XDG search path).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the display client (default).
    Run,
    /// Check configuration, backend reachability, and the local cache.
    Doctor,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("vitrine: {message}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Some(Commands::Doctor) => doctor::run_doctor(&config).await,
        Some(Commands::Run) | None => run::run(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("vitrine: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<VitrineConfig, String> {
    let config = match path {
        Some(path) => vitrine_config::load_config_from_path(path),
        None => vitrine_config::load_config(),
    }
    .map_err(|e| format!("config error: {e}"))?;

    vitrine_config::validate(&config).map_err(|e| format!("invalid config: {e}"))?;
    Ok(config)
}

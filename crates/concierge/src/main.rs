// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concierge - a multilingual real estate chat assistant.
//!
//! This is the binary entry point: an interactive shell, a one-shot `ask`
//! command and a `doctor` health check.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod ask;
mod bootstrap;
mod doctor;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Concierge - a multilingual real estate chat assistant.
#[derive(Parser, Debug)]
#[command(name = "concierge", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat interactively in a terminal session.
    Shell {
        /// Language of the opening introduction.
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// Answer a single message and exit.
    Ask {
        /// The user's message.
        message: String,
        /// Print the full turn response as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run diagnostic checks against the configured services.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => concierge_config::load_and_validate_path(path),
        None => concierge_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            concierge_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Some(Commands::Shell { language }) => shell::run_shell(&config, &language).await,
        Some(Commands::Ask { message, json }) => ask::run_ask(&config, &message, json).await,
        Some(Commands::Doctor { plain }) => doctor::run_doctor(&config, plain).await,
        None => {
            println!("concierge: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Installs the fmt subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("concierge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flowershop - a Telegram flower shop bot.
//!
//! This is the binary entry point: it loads configuration, sets up logging,
//! and runs one of the subcommands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod assignments;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flowershop_config::FlowershopConfig;

/// Flowershop - a Telegram flower shop bot.
#[derive(Parser, Debug)]
#[command(name = "flowershop", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot (default).
    Serve,
    /// Load and validate configuration, then exit.
    CheckConfig,
    /// List worker assignments awaiting acknowledgment and paid orders
    /// still waiting for a courier.
    Assignments {
        /// Include acknowledged assignments.
        #[arg(long)]
        all: bool,
        /// Send the worker notification for this assignment again.
        #[arg(long, value_name = "ID", conflicts_with_all = ["all", "assign_order"])]
        renotify: Option<i64>,
        /// Retry courier assignment for an order that has none.
        #[arg(long, value_name = "ORDER_ID", conflicts_with = "all")]
        assign_order: Option<i64>,
    },
}

fn load_config(path: Option<&std::path::Path>) -> Option<FlowershopConfig> {
    let result = match path {
        Some(path) => flowershop_config::load_and_validate_path(path),
        None => flowershop_config::load_and_validate(),
    };
    match result {
        Ok(config) => Some(config),
        Err(errors) => {
            flowershop_config::render_errors(&errors);
            None
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(config) = load_config(cli.config.as_deref()) else {
        std::process::exit(1);
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            init_tracing(&config.bot.log_level);
            serve::run_serve(config).await
        }
        Commands::CheckConfig => {
            println!(
                "flowershop: config ok (bot.name={}, storage.database_path={})",
                config.bot.name, config.storage.database_path
            );
            Ok(())
        }
        Commands::Assignments {
            all,
            renotify,
            assign_order,
        } => {
            init_tracing(&config.bot.log_level);
            match (renotify, assign_order) {
                (Some(id), _) => assignments::run_renotify(&config, id).await,
                (None, Some(id)) => assignments::run_assign_order(&config, id).await,
                (None, None) => assignments::run_list(&config, all).await,
            }
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flowershop={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

//! Pressure Bot - Stacks address monitor with automated reaction trades
//!
//! # WARNING
//! - This bot trades with real money. Only use funds you can afford to lose.
//! - Auto-trading reacts to on-chain activity you do not control.
//! - Keep the quota ceiling below your indexer plan's real limit.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// Use the library crate
use pressure_bot::cli::commands;
use pressure_bot::config::Config;

/// Pressure Bot - Stacks address monitor with automated reaction trades
#[derive(Parser)]
#[command(name = "pressure")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the pressure monitor
    Start {
        /// Run in dry-run mode (no real trades)
        #[arg(long)]
        dry_run: bool,
    },

    /// Show current configuration
    Config,

    /// List an address's pending (mempool) transactions
    Pending {
        /// Stacks address to check
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pressure_bot=info".parse().unwrap()),
        )
        .with_target(true)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Start { dry_run } => commands::start(&config, dry_run).await,
        Commands::Config => commands::show_config(&config),
        Commands::Pending { address } => commands::pending(&config, &address).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

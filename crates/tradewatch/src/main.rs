//! tradewatch - background monitor host
//!
//! Runs the order-condition and stop-loss watchers under one orchestrator and
//! manages which of them are enabled.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod config;
mod monitors;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::from_default_env()
        .add_directive("tradewatch=info".parse()?)
        .add_directive("tradewatch_core=info".parse()?);
    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| fmt::layer().json()))
        .with((!cli.json_logs).then(|| fmt::layer()))
        .init();

    // Load configuration
    let config = config::Config::load()?;

    // Execute command
    match cli.command {
        Commands::Run => commands::run::execute(&config).await,
        Commands::Status { json } => commands::options::status(&config, json).await,
        Commands::Enable { monitor } => {
            commands::options::set_enabled(&config, monitor, true).await
        }
        Commands::Disable { monitor } => {
            commands::options::set_enabled(&config, monitor, false).await
        }
        Commands::Exclusive { monitor } => commands::options::exclusive(&config, monitor).await,
        Commands::Reset => commands::options::reset(&config).await,
        Commands::Init => commands::init::execute(&config::Config::config_path()),
        Commands::Version => {
            println!("tradewatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

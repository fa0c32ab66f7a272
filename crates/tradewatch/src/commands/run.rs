//! Host process: run the enabled monitors until interrupted.
//!
//! - Ctrl-C / SIGTERM: dispose the orchestrator (stops every monitor once)
//! - SIGHUP: reload `monitors.json` and restart, so `tradewatch enable`,
//!   `disable` and `exclusive` can be applied without a full restart. An
//!   unreadable file leaves the running monitors and options alone.

use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

use tradewatch_core::{JsonConfigStore, Orchestrator, StartReport};

use crate::config::Config;
use crate::monitors::build_resolver;

pub async fn execute(config: &Config) -> Result<()> {
    config.ensure_dirs()?;

    let store = Arc::new(JsonConfigStore::new(config.options_path()));
    let orchestrator = Orchestrator::load(Arc::new(build_resolver(config)), store.clone())
        .with_settings(config.orchestrator_settings());

    println!("{}", "Starting monitors...".cyan());
    println!("  Options: {}", store.path().display());

    let report = orchestrator.start_all_enabled().await;
    print_report(&report);

    let waited = wait_for_shutdown(&orchestrator).await;

    println!("{}", "Shutting down...".cyan());
    orchestrator.dispose().await;
    println!("{}", "✓ All monitors stopped".green());

    waited
}

/// Re-read the persisted options and restart onto them.
///
/// Returns `None` when the options could not be loaded; nothing is restarted
/// and the file is left as it is.
#[cfg_attr(not(unix), allow(dead_code))]
async fn reload(orchestrator: &Orchestrator) -> Option<StartReport> {
    match orchestrator.reload_options().await {
        Ok(_) => Some(orchestrator.restart_all_services().await),
        Err(e) => {
            println!(
                "{} Could not reload monitor options: {}",
                "✗".red(),
                e
            );
            None
        }
    }
}

fn print_report(report: &StartReport) {
    for kind in &report.started {
        println!("  {} {}", "✓".green(), kind);
    }
    for kind in &report.unavailable {
        println!("  {} {} (not available)", "-".dimmed(), kind);
    }
    for kind in &report.failed {
        println!("  {} {} (failed to start, see logs)", "✗".red(), kind);
    }
    if report.started.is_empty() {
        println!("{}", "⚠ No monitors running".yellow());
        println!("  Run `tradewatch status` to check which monitors are enabled");
    }
}

#[cfg(unix)]
async fn wait_for_shutdown(orchestrator: &Orchestrator) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};
    use tracing::info;

    let mut hangup = signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                return result.context("Failed to listen for Ctrl-C");
            }
            _ = terminate.recv() => {
                info!("SIGTERM received");
                return Ok(());
            }
            _ = hangup.recv() => {
                info!("SIGHUP received, reloading monitor options");
                if let Some(report) = reload(orchestrator).await {
                    print_report(&report);
                }
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_orchestrator: &Orchestrator) -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")
}

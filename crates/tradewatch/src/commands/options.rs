//! Monitor enablement commands.
//!
//! These edit `monitors.json` through an orchestrator that has no monitors
//! bound, so every change goes through the same update / exclusive-mode paths
//! a running host uses. A running host picks the change up on SIGHUP or on its
//! next start.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::sync::Arc;

use tradewatch_core::{EnablementConfig, JsonConfigStore, MonitorFactories, MonitorKind, Orchestrator};

use crate::config::Config;

/// Options view for JSON output.
#[derive(Debug, Serialize)]
struct OptionsStatus {
    path: String,
    persisted: bool,
    monitors: EnablementConfig,
}

fn open(config: &Config) -> (Orchestrator, Arc<JsonConfigStore>) {
    let store = Arc::new(JsonConfigStore::new(config.options_path()));
    let orchestrator = Orchestrator::load(Arc::new(MonitorFactories::new()), store.clone());
    (orchestrator, store)
}

pub async fn status(config: &Config, json: bool) -> Result<()> {
    let (orchestrator, store) = open(config);
    let options = orchestrator.get_current_options().await;
    let persisted = store.path().exists();

    if json {
        let status = OptionsStatus {
            path: store.path().display().to_string(),
            persisted,
            monitors: options,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&status).context("Failed to serialize status")?
        );
        return Ok(());
    }

    println!("{}", "Monitor options".bold());
    println!("  File: {}", store.path().display());
    if !persisted {
        println!("  {}", "(not saved yet, showing defaults)".dimmed());
    }
    println!();
    for (kind, enabled) in options.iter() {
        if enabled {
            println!("  {} {:<16} {}", "●".green(), kind.to_string(), "enabled".green());
        } else {
            println!("  {} {:<16} {}", "○".dimmed(), kind.to_string(), "disabled".dimmed());
        }
    }

    Ok(())
}

pub async fn set_enabled(config: &Config, kind: MonitorKind, enabled: bool) -> Result<()> {
    let (orchestrator, _) = open(config);
    let options = orchestrator.get_current_options().await.with(kind, enabled);

    orchestrator
        .update_options(options)
        .await
        .context("Failed to save monitor options")?;

    let state = if enabled { "enabled".green() } else { "disabled".yellow() };
    println!("✓ {} {}", kind, state);
    print_apply_hint();
    Ok(())
}

pub async fn exclusive(config: &Config, kind: MonitorKind) -> Result<()> {
    let (orchestrator, _) = open(config);

    orchestrator
        .switch_to_exclusive_mode(kind)
        .await
        .context("Failed to save monitor options")?;

    println!("✓ Exclusive mode: only {} is enabled", kind.to_string().green());
    print_apply_hint();
    Ok(())
}

pub async fn reset(config: &Config) -> Result<()> {
    let (orchestrator, _) = open(config);

    orchestrator
        .update_options(EnablementConfig::all_enabled())
        .await
        .context("Failed to save monitor options")?;

    println!("✓ All monitors enabled");
    print_apply_hint();
    Ok(())
}

fn print_apply_hint() {
    println!(
        "  {}",
        "Send SIGHUP to a running `tradewatch run` (or restart it) to apply".dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;
    use tempfile::tempdir;
    use tradewatch_core::ConfigStore;

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            paths: PathsConfig {
                data_dir: dir.to_path_buf(),
            },
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_disable_then_reset() {
        let temp = tempdir().expect("Failed to create temp dir");
        let config = config_in(temp.path());
        let store = JsonConfigStore::new(config.options_path());

        set_enabled(&config, MonitorKind::OrderCondition, false).await.unwrap();
        let saved = store.load().unwrap().unwrap();
        assert!(!saved.is_enabled(MonitorKind::OrderCondition));
        assert!(saved.is_enabled(MonitorKind::StopLoss));

        reset(&config).await.unwrap();
        assert_eq!(store.load().unwrap(), Some(EnablementConfig::all_enabled()));
    }

    #[tokio::test]
    async fn test_exclusive_persists() {
        let temp = tempdir().expect("Failed to create temp dir");
        let config = config_in(temp.path());

        exclusive(&config, MonitorKind::StopLoss).await.unwrap();

        let store = JsonConfigStore::new(config.options_path());
        assert_eq!(
            store.load().unwrap(),
            Some(EnablementConfig::exclusive(MonitorKind::StopLoss))
        );
    }

    #[tokio::test]
    async fn test_status_without_saved_options() {
        let temp = tempdir().expect("Failed to create temp dir");
        let config = config_in(temp.path());

        status(&config, true).await.unwrap();
        status(&config, false).await.unwrap();
        assert!(!config.options_path().exists());
    }
}

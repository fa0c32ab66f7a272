//! Configuration management for the tradewatch host.
//!
//! Configuration is loaded with precedence:
//! 1. Config file named by `TRADEWATCH_CONFIG`
//! 2. Config file (`<data dir>/config.toml`)
//! 3. Default values
//!
//! Which monitors run is not part of this file; those toggles live in
//! `monitors.json` next to it and are managed through the orchestrator.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tradewatch_core::{MonitorKind, OrchestratorSettings};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Paths
    #[serde(default)]
    pub paths: PathsConfig,

    /// Orchestrator settings
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Per-monitor polling settings
    #[serde(default)]
    pub monitors: MonitorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Base directory for tradewatch data
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Upper bound for each monitor start call, in seconds
    #[serde(default = "default_start_timeout")]
    pub start_timeout_secs: u64,

    /// Upper bound for each monitor stop/release call, in seconds
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorsConfig {
    /// Order-condition watcher poll interval in seconds
    #[serde(default = "default_order_condition_interval")]
    pub order_condition_interval_secs: u64,

    /// Stop-loss watcher poll interval in seconds
    #[serde(default = "default_stop_loss_interval")]
    pub stop_loss_interval_secs: u64,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "tradewatch", "tradewatch") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tradewatch")
    }
}

fn default_start_timeout() -> u64 {
    30
}

fn default_stop_timeout() -> u64 {
    10
}

fn default_order_condition_interval() -> u64 {
    5
}

fn default_stop_loss_interval() -> u64 {
    2 // stop-loss reacts faster than conditional orders
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            start_timeout_secs: default_start_timeout(),
            stop_timeout_secs: default_stop_timeout(),
        }
    }
}

impl Default for MonitorsConfig {
    fn default() -> Self {
        Self {
            order_condition_interval_secs: default_order_condition_interval(),
            stop_loss_interval_secs: default_stop_loss_interval(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            monitors: MonitorsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("TRADEWATCH_CONFIG") {
            PathBuf::from(path)
        } else {
            default_data_dir().join("config.toml")
        }
    }

    /// Where the monitor enablement options are persisted.
    pub fn options_path(&self) -> PathBuf {
        self.paths.data_dir.join("monitors.json")
    }

    /// Orchestrator settings derived from this config.
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            start_timeout: Duration::from_secs(self.orchestrator.start_timeout_secs.max(1)),
            stop_timeout: Duration::from_secs(self.orchestrator.stop_timeout_secs.max(1)),
        }
    }

    /// Poll interval for a monitor kind.
    pub fn poll_interval(&self, kind: MonitorKind) -> Duration {
        let secs = match kind {
            MonitorKind::OrderCondition => self.monitors.order_condition_interval_secs,
            MonitorKind::StopLoss => self.monitors.stop_loss_interval_secs,
        };
        Duration::from_secs(secs)
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.paths.data_dir)
            .context("Failed to create data directory")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.orchestrator.stop_timeout_secs, 10);
        assert_eq!(config.orchestrator.start_timeout_secs, 30);
        assert_eq!(config.monitors.order_condition_interval_secs, 5);
        assert_eq!(config.monitors.stop_loss_interval_secs, 2);
        assert_eq!(
            config.poll_interval(MonitorKind::StopLoss),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_options_path_lives_in_data_dir() {
        let temp = tempdir().expect("Failed to create temp dir");
        let config = Config {
            paths: PathsConfig {
                data_dir: temp.path().to_path_buf(),
            },
            ..Config::default()
        };

        assert_eq!(config.options_path(), temp.path().join("monitors.json"));
    }

    #[test]
    fn test_save_and_load() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("config.toml");

        let mut config = Config::default();
        config.orchestrator.stop_timeout_secs = 3;
        config.monitors.stop_loss_interval_secs = 1;
        config.save_to(&path).expect("Failed to save config");

        let loaded = Config::load_from(&path).expect("Failed to load config");
        assert_eq!(loaded.orchestrator.stop_timeout_secs, 3);
        assert_eq!(loaded.monitors.stop_loss_interval_secs, 1);
        assert_eq!(
            loaded.orchestrator_settings().stop_timeout,
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[monitors]\nstop_loss_interval_secs = 7\n").unwrap();

        let loaded = Config::load_from(&path).expect("Failed to load config");
        assert_eq!(loaded.monitors.stop_loss_interval_secs, 7);
        assert_eq!(loaded.monitors.order_condition_interval_secs, 5);
        assert_eq!(loaded.orchestrator.stop_timeout_secs, 10);
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp = tempdir().expect("Failed to create temp dir");
        let loaded = Config::load_from(&temp.path().join("missing.toml")).unwrap();
        assert_eq!(loaded.orchestrator.stop_timeout_secs, 10);
    }
}

//! Enablement options: which monitors should run.
//!
//! `EnablementConfig` is an immutable value. Changes produce a new value that
//! the orchestrator swaps in wholesale; nothing here performs I/O.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::monitor::MonitorKind;

/// Per-kind "should run" toggles.
///
/// Kinds missing from the map count as enabled, so a monitor added in a newer
/// release starts by default even against an older options file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, bool>", into = "BTreeMap<String, bool>")]
pub struct EnablementConfig {
    toggles: BTreeMap<MonitorKind, bool>,
}

impl Default for EnablementConfig {
    fn default() -> Self {
        Self {
            toggles: MonitorKind::ALL.iter().map(|kind| (*kind, true)).collect(),
        }
    }
}

impl EnablementConfig {
    /// Every monitor enabled
    pub fn all_enabled() -> Self {
        Self::default()
    }

    /// Every monitor disabled
    pub fn all_disabled() -> Self {
        Self {
            toggles: MonitorKind::ALL.iter().map(|kind| (*kind, false)).collect(),
        }
    }

    /// Exactly `target` enabled, everything else disabled
    pub fn exclusive(target: MonitorKind) -> Self {
        Self::all_disabled().with(target, true)
    }

    /// Copy of this config with one toggle changed
    pub fn with(mut self, kind: MonitorKind, enabled: bool) -> Self {
        self.toggles.insert(kind, enabled);
        self
    }

    pub fn is_enabled(&self, kind: MonitorKind) -> bool {
        self.toggles.get(&kind).copied().unwrap_or(true)
    }

    /// Enabled kinds, in declaration order
    pub fn enabled_kinds(&self) -> Vec<MonitorKind> {
        MonitorKind::ALL
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }

    /// Every known kind with its effective toggle
    pub fn iter(&self) -> impl Iterator<Item = (MonitorKind, bool)> + '_ {
        MonitorKind::ALL
            .into_iter()
            .map(|kind| (kind, self.is_enabled(kind)))
    }
}

impl From<BTreeMap<String, bool>> for EnablementConfig {
    fn from(raw: BTreeMap<String, bool>) -> Self {
        let mut config = Self::default();
        for (name, enabled) in raw {
            match name.parse::<MonitorKind>() {
                Ok(kind) => config = config.with(kind, enabled),
                Err(_) => tracing::debug!(monitor = %name, "Ignoring unknown monitor in options"),
            }
        }
        config
    }
}

impl From<EnablementConfig> for BTreeMap<String, bool> {
    fn from(config: EnablementConfig) -> Self {
        config
            .iter()
            .map(|(kind, enabled)| (kind.as_str().to_string(), enabled))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_everything() {
        let config = EnablementConfig::default();
        assert_eq!(config.enabled_kinds(), MonitorKind::ALL.to_vec());
    }

    #[test]
    fn test_exclusive() {
        let config = EnablementConfig::exclusive(MonitorKind::StopLoss);
        assert!(config.is_enabled(MonitorKind::StopLoss));
        assert!(!config.is_enabled(MonitorKind::OrderCondition));
        assert_eq!(config.enabled_kinds(), vec![MonitorKind::StopLoss]);
    }

    #[test]
    fn test_with_leaves_original_untouched() {
        let original = EnablementConfig::default();
        let changed = original.clone().with(MonitorKind::OrderCondition, false);

        assert!(original.is_enabled(MonitorKind::OrderCondition));
        assert!(!changed.is_enabled(MonitorKind::OrderCondition));
    }

    #[test]
    fn test_deserialize_fills_missing_and_skips_unknown() {
        let config: EnablementConfig =
            serde_json::from_str(r#"{"stopLoss": false, "trailingStop": true}"#).unwrap();

        assert!(!config.is_enabled(MonitorKind::StopLoss));
        assert!(config.is_enabled(MonitorKind::OrderCondition));
    }

    #[test]
    fn test_serializes_every_kind() {
        let config = EnablementConfig::exclusive(MonitorKind::OrderCondition);
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["orderCondition"], true);
        assert_eq!(json["stopLoss"], false);
    }
}

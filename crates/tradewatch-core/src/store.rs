//! Durable persistence for [`EnablementConfig`].

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::options::EnablementConfig;

/// Loads and saves the enablement options.
///
/// Calls are synchronous; the orchestrator invokes them inline and logs any
/// failure without undoing the in-memory change.
pub trait ConfigStore: Send + Sync {
    /// Load persisted options. `Ok(None)` means nothing has been saved yet.
    fn load(&self) -> StoreResult<Option<EnablementConfig>>;

    /// Persist options, replacing whatever was stored.
    fn save(&self, config: &EnablementConfig) -> StoreResult<()>;
}

/// Load options from `store`, falling back to all-enabled defaults.
///
/// An unreadable store is logged and treated like an empty one so the host can
/// always start.
pub fn load_or_default(store: &dyn ConfigStore) -> EnablementConfig {
    match store.load() {
        Ok(Some(config)) => config,
        Ok(None) => {
            debug!("No persisted monitor options, using defaults");
            EnablementConfig::default()
        }
        Err(e) => {
            warn!(error = %e, "Failed to load monitor options, using defaults");
            EnablementConfig::default()
        }
    }
}

/// Options stored as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonConfigStore {
    fn load(&self) -> StoreResult<Option<EnablementConfig>> {
        let content = match std::fs::read_to_string(&self.path).map_err(StoreError::from) {
            Ok(content) => content,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, config: &EnablementConfig) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write then rename so a crash never leaves a truncated file behind
        let content = serde_json::to_string_pretty(config)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}

/// In-process store for tests and hosts that do not persist options.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    saved: Mutex<Option<EnablementConfig>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `config` already saved
    pub fn with_config(config: EnablementConfig) -> Self {
        Self {
            saved: Mutex::new(Some(config)),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> StoreResult<Option<EnablementConfig>> {
        let saved = self
            .saved
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))?;
        Ok(saved.clone())
    }

    fn save(&self, config: &EnablementConfig) -> StoreResult<()> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))?;
        *saved = Some(config.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::MonitorKind;
    use tempfile::tempdir;

    #[test]
    fn test_json_store_missing_file_loads_none() {
        let temp = tempdir().expect("Failed to create temp dir");
        let store = JsonConfigStore::new(temp.path().join("monitors.json"));

        assert!(store.load().unwrap().is_none());
        assert_eq!(load_or_default(&store), EnablementConfig::default());
    }

    #[test]
    fn test_json_store_save_and_load() {
        let temp = tempdir().expect("Failed to create temp dir");
        let store = JsonConfigStore::new(temp.path().join("nested").join("monitors.json"));
        let config = EnablementConfig::exclusive(MonitorKind::StopLoss);

        store.save(&config).expect("Failed to save options");
        assert!(store.path().exists());
        assert!(!store.path().with_extension("json.tmp").exists());

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("monitors.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonConfigStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Serialization(_))));
        assert_eq!(load_or_default(&store), EnablementConfig::default());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryConfigStore::new();
        assert!(store.load().unwrap().is_none());

        let config = EnablementConfig::all_disabled();
        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), Some(config));
    }
}

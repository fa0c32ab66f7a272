//! Registry of live monitor instances, keyed by kind.
//!
//! The registry only stores handles. Stopping and releasing a handle is the
//! orchestrator's job, which is why `register` hands back whatever entry it
//! displaced instead of dropping it.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::monitor::{Monitor, MonitorKind};

/// A running monitor tracked by the registry
pub struct RegistryEntry {
    pub kind: MonitorKind,
    /// Unique per started instance, for correlating log lines
    pub instance_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub handle: Box<dyn Monitor>,
}

impl RegistryEntry {
    pub fn new(kind: MonitorKind, instance_id: Uuid, handle: Box<dyn Monitor>) -> Self {
        Self {
            kind,
            instance_id,
            started_at: Utc::now(),
            handle,
        }
    }

    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            kind: self.kind,
            instance_id: self.instance_id,
            started_at: self.started_at,
        }
    }
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("kind", &self.kind)
            .field("instance_id", &self.instance_id)
            .field("started_at", &self.started_at)
            .finish()
    }
}

/// Snapshot of a running instance, safe to hand out to callers
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ServiceInfo {
    pub kind: MonitorKind,
    pub instance_id: Uuid,
    pub started_at: DateTime<Utc>,
}

/// In-memory map from monitor kind to its live instance.
///
/// Not synchronized; the orchestrator serializes all access.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    entries: BTreeMap<MonitorKind, RegistryEntry>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the one it replaced (if any).
    #[must_use = "a displaced entry still needs to be stopped and released"]
    pub fn register(&mut self, entry: RegistryEntry) -> Option<RegistryEntry> {
        self.entries.insert(entry.kind, entry)
    }

    /// Remove and return the entry for `kind`. `None` means it was not running.
    pub fn unregister(&mut self, kind: MonitorKind) -> Option<RegistryEntry> {
        self.entries.remove(&kind)
    }

    /// Copy of the registered kinds
    pub fn names(&self) -> BTreeSet<MonitorKind> {
        self.entries.keys().copied().collect()
    }

    pub fn contains(&self, kind: MonitorKind) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Info for every registered instance, ordered by kind
    pub fn entries(&self) -> Vec<ServiceInfo> {
        self.entries.values().map(RegistryEntry::info).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorResult;
    use async_trait::async_trait;

    struct Idle(MonitorKind);

    #[async_trait]
    impl Monitor for Idle {
        fn kind(&self) -> MonitorKind {
            self.0
        }

        async fn start(&mut self) -> MonitorResult<()> {
            Ok(())
        }

        async fn stop(&mut self) -> MonitorResult<()> {
            Ok(())
        }
    }

    fn entry(kind: MonitorKind) -> RegistryEntry {
        RegistryEntry::new(kind, Uuid::new_v4(), Box::new(Idle(kind)))
    }

    #[test]
    fn test_register_and_unregister() {
        let mut registry = ServiceRegistry::new();
        assert!(registry.is_empty());

        assert!(registry.register(entry(MonitorKind::StopLoss)).is_none());
        assert!(registry.contains(MonitorKind::StopLoss));
        assert!(!registry.contains(MonitorKind::OrderCondition));
        assert_eq!(registry.len(), 1);

        let removed = registry.unregister(MonitorKind::StopLoss).unwrap();
        assert_eq!(removed.kind, MonitorKind::StopLoss);
        assert!(registry.unregister(MonitorKind::StopLoss).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_returns_displaced_entry() {
        let mut registry = ServiceRegistry::new();
        let first = entry(MonitorKind::OrderCondition);
        let first_id = first.instance_id;

        assert!(registry.register(first).is_none());
        let displaced = registry.register(entry(MonitorKind::OrderCondition)).unwrap();

        assert_eq!(displaced.instance_id, first_id);
        assert_eq!(registry.len(), 1);
        assert_ne!(registry.entries()[0].instance_id, first_id);
    }

    #[test]
    fn test_names_is_a_snapshot() {
        let mut registry = ServiceRegistry::new();
        let _ = registry.register(entry(MonitorKind::OrderCondition));
        let _ = registry.register(entry(MonitorKind::StopLoss));

        let names = registry.names();
        for kind in &names {
            registry.unregister(*kind);
        }

        assert_eq!(names.len(), 2);
        assert!(registry.is_empty());
    }
}

//! Monitor contract.
//!
//! Every background watcher the orchestrator manages implements [`Monitor`].
//! The orchestrator never inspects concrete monitor types; it only calls the
//! `start` / `stop` / `release` handshake and resolves fresh instances through
//! a [`MonitorResolver`] handed to it at construction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{MonitorResult, UnknownMonitorKind};

/// The fixed set of monitor names known to the orchestrator.
///
/// Names double as keys in both the enablement options and the service
/// registry, so they serialize as stable camelCase identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MonitorKind {
    /// Watches open conditional orders and fires them when their trigger is met
    OrderCondition,
    /// Watches positions and closes them when a stop-loss price is crossed
    StopLoss,
}

impl MonitorKind {
    /// Every monitor kind, in declaration order.
    pub const ALL: [MonitorKind; 2] = [MonitorKind::OrderCondition, MonitorKind::StopLoss];

    /// Stable identifier used in logs, config files and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorKind::OrderCondition => "orderCondition",
            MonitorKind::StopLoss => "stopLoss",
        }
    }
}

impl fmt::Display for MonitorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonitorKind {
    type Err = UnknownMonitorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept camelCase, snake_case and kebab-case spellings
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "ordercondition" => Ok(MonitorKind::OrderCondition),
            "stoploss" => Ok(MonitorKind::StopLoss),
            _ => Err(UnknownMonitorKind(s.to_string())),
        }
    }
}

/// Capability set shared by every background monitor.
///
/// `start` should return once the monitor's own background work is spawned;
/// the orchestrator only waits for the handshake, never for the monitor's run.
/// `stop` must halt everything `start` spawned. `release` frees any remaining
/// resources and must be safe to call more than once.
#[async_trait]
pub trait Monitor: Send + Sync {
    /// Which monitor this instance implements
    fn kind(&self) -> MonitorKind;

    /// Spin up the monitor's background work
    async fn start(&mut self) -> MonitorResult<()>;

    /// Halt the monitor's background work
    async fn stop(&mut self) -> MonitorResult<()>;

    /// Release resources held by the monitor (idempotent)
    async fn release(&mut self) -> MonitorResult<()> {
        Ok(())
    }
}

/// Produces fresh monitor instances by kind.
///
/// Returning `None` means the kind is not wired up in this deployment; the
/// orchestrator treats that as "feature not present" and skips it.
pub trait MonitorResolver: Send + Sync {
    fn resolve(&self, kind: MonitorKind) -> Option<Box<dyn Monitor>>;
}

impl<F> MonitorResolver for F
where
    F: Fn(MonitorKind) -> Option<Box<dyn Monitor>> + Send + Sync,
{
    fn resolve(&self, kind: MonitorKind) -> Option<Box<dyn Monitor>> {
        self(kind)
    }
}

type Factory = Box<dyn Fn() -> Box<dyn Monitor> + Send + Sync>;

/// Map-backed resolver: one factory per kind, unregistered kinds resolve to `None`.
#[derive(Default)]
pub struct MonitorFactories {
    factories: HashMap<MonitorKind, Factory>,
}

impl MonitorFactories {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a factory for a monitor kind, replacing any previous binding
    pub fn with<F>(mut self, kind: MonitorKind, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Monitor> + Send + Sync + 'static,
    {
        self.factories.insert(kind, Box::new(factory));
        self
    }

    /// Kinds that have a factory bound
    pub fn kinds(&self) -> Vec<MonitorKind> {
        let mut kinds: Vec<MonitorKind> = self.factories.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl MonitorResolver for MonitorFactories {
    fn resolve(&self, kind: MonitorKind) -> Option<Box<dyn Monitor>> {
        self.factories.get(&kind).map(|factory| factory())
    }
}

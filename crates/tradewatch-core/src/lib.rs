//! tradewatch-core - background monitor orchestration
//!
//! This crate provides the lifecycle layer shared by the tradewatch host and
//! its tests:
//!
//! - **monitor**: the `start` / `stop` / `release` contract and monitor kinds
//! - **registry**: live instances keyed by kind
//! - **options**: which monitors should run
//! - **store**: persistence for the options
//! - **orchestrator**: start, stop, restart and exclusive-mode switching
//! - **polling**: a ready-made interval-driven monitor
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tradewatch_core::{JsonConfigStore, MonitorFactories, Orchestrator};
//!
//! async fn example() {
//!     let resolver = Arc::new(MonitorFactories::new());
//!     let store = Arc::new(JsonConfigStore::new("monitors.json"));
//!     let orchestrator = Orchestrator::load(resolver, store);
//!
//!     orchestrator.start_all_enabled().await;
//!     // ...
//!     orchestrator.dispose().await;
//! }
//! ```

pub mod error;
pub mod monitor;
pub mod options;
pub mod orchestrator;
pub mod polling;
pub mod registry;
pub mod store;

// Re-export commonly used types
pub use error::{MonitorError, MonitorResult, StoreError, StoreResult, UnknownMonitorKind};
pub use monitor::{Monitor, MonitorFactories, MonitorKind, MonitorResolver};
pub use options::EnablementConfig;
pub use orchestrator::{
    Orchestrator, OrchestratorSettings, StartOutcome, StartReport, DEFAULT_START_TIMEOUT,
    DEFAULT_STOP_TIMEOUT,
};
pub use polling::{PollingMonitor, Tick, TickError};
pub use registry::{RegistryEntry, ServiceInfo, ServiceRegistry};
pub use store::{load_or_default, ConfigStore, JsonConfigStore, MemoryConfigStore};

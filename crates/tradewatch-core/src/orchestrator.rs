//! Orchestrator - lifecycle control for background monitors.
//!
//! Owns the [`ServiceRegistry`] and the current [`EnablementConfig`] and is the
//! only thing that starts or stops monitors. Guarantees:
//!
//! - at most one live instance per [`MonitorKind`]
//! - every public operation runs under one operation lock, so calls from
//!   different tasks are strictly serialized
//! - nothing a monitor does (error, panic, hang) propagates to the caller;
//!   failures are logged and the registry is left clean
//!
//! Per-kind state machine:
//!
//! ```text
//!   Unregistered ──start──▶ Running
//!   Running ──stop / stop_all / exclusive switch / dispose──▶ Unregistered
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{MonitorError, StoreResult};
use crate::monitor::{Monitor, MonitorKind, MonitorResolver};
use crate::options::EnablementConfig;
use crate::registry::{RegistryEntry, ServiceInfo, ServiceRegistry};
use crate::store::{load_or_default, ConfigStore};

/// Default upper bound for a single `start()` call
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(30);

/// Default upper bound for a single `stop()` or `release()` call
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// How long `start()` may take before the instance is abandoned
    pub start_timeout: Duration,
    /// How long to wait for each of `stop()` and `release()` before giving up
    pub stop_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            start_timeout: DEFAULT_START_TIMEOUT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

/// Result of starting a single monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Started and registered
    Started,
    /// Resolver has nothing bound for this kind
    Unavailable,
    /// `start()` failed, panicked or timed out; nothing was registered
    Failed,
    /// The orchestrator has been disposed
    Disposed,
}

/// Summary of a bulk start
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartReport {
    pub started: Vec<MonitorKind>,
    pub unavailable: Vec<MonitorKind>,
    pub failed: Vec<MonitorKind>,
}

impl StartReport {
    fn record(&mut self, kind: MonitorKind, outcome: StartOutcome) {
        match outcome {
            StartOutcome::Started => self.started.push(kind),
            StartOutcome::Unavailable => self.unavailable.push(kind),
            StartOutcome::Failed => self.failed.push(kind),
            StartOutcome::Disposed => {}
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Start,
    Stop,
    Release,
}

impl Step {
    fn as_str(&self) -> &'static str {
        match self {
            Step::Start => "start",
            Step::Stop => "stop",
            Step::Release => "release",
        }
    }
}

enum StepOutcome {
    Done,
    Failed(MonitorError),
    Panicked(String),
    TimedOut(Duration),
}

struct State {
    registry: ServiceRegistry,
    options: EnablementConfig,
    disposed: bool,
}

/// Starts, stops and mode-switches the background monitors.
pub struct Orchestrator {
    resolver: Arc<dyn MonitorResolver>,
    store: Arc<dyn ConfigStore>,
    settings: OrchestratorSettings,
    /// Operation lock: registry, options and the disposed flag change together
    state: Mutex<State>,
}

impl Orchestrator {
    /// Create an orchestrator with explicit starting options
    pub fn new(
        resolver: Arc<dyn MonitorResolver>,
        store: Arc<dyn ConfigStore>,
        options: EnablementConfig,
    ) -> Self {
        Self {
            resolver,
            store,
            settings: OrchestratorSettings::default(),
            state: Mutex::new(State {
                registry: ServiceRegistry::new(),
                options,
                disposed: false,
            }),
        }
    }

    /// Create an orchestrator whose options come from `store` (or defaults)
    pub fn load(resolver: Arc<dyn MonitorResolver>, store: Arc<dyn ConfigStore>) -> Self {
        let options = load_or_default(store.as_ref());
        Self::new(resolver, store, options)
    }

    /// Override the default settings
    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Start every enabled monitor.
    ///
    /// Disabled kinds are never resolved. A kind that fails to start is left
    /// unregistered and does not affect the rest of the batch.
    pub async fn start_all_enabled(&self) -> StartReport {
        let mut state = self.state.lock().await;
        self.start_all_locked(&mut state).await
    }

    /// Start one monitor regardless of its enablement toggle.
    ///
    /// A kind that is already running is stopped and released first, so the
    /// registry never holds two live instances of it.
    pub async fn start_service(&self, kind: MonitorKind) -> StartOutcome {
        let mut state = self.state.lock().await;
        self.start_locked(&mut state, kind).await
    }

    /// Stop one monitor. Returns `false` if it was not running.
    pub async fn stop_service(&self, kind: MonitorKind) -> bool {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state, kind).await
    }

    /// Stop every running monitor. Returns how many were stopped.
    pub async fn stop_all_services(&self) -> usize {
        let mut state = self.state.lock().await;
        self.stop_all_locked(&mut state).await
    }

    /// Stop everything, then start every enabled monitor.
    pub async fn restart_all_services(&self) -> StartReport {
        let mut state = self.state.lock().await;
        info!("Restarting all monitors");
        self.stop_all_locked(&mut state).await;
        self.start_all_locked(&mut state).await
    }

    /// Stop everything and enable only `target`.
    ///
    /// The target is not started; call [`Orchestrator::start_all_enabled`]
    /// to bring it up. An `Err` means the new options are in effect for this
    /// process but were not persisted.
    pub async fn switch_to_exclusive_mode(&self, target: MonitorKind) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        info!(monitor = %target, "Switching to exclusive mode");

        self.stop_all_locked(&mut state).await;
        state.options = EnablementConfig::exclusive(target);
        let persisted = self.persist(&state.options);

        info!(
            monitor = %target,
            enabled = ?state.options.enabled_kinds(),
            "Exclusive mode active"
        );
        persisted
    }

    /// Whether each known monitor is currently running.
    ///
    /// Reflects the registry only, not what the options say should run.
    pub async fn get_status(&self) -> BTreeMap<MonitorKind, bool> {
        let state = self.state.lock().await;
        MonitorKind::ALL
            .into_iter()
            .map(|kind| (kind, state.registry.contains(kind)))
            .collect()
    }

    /// Whether a single monitor is currently running
    pub async fn is_running(&self, kind: MonitorKind) -> bool {
        let state = self.state.lock().await;
        state.registry.contains(kind)
    }

    /// Instance details for every running monitor
    pub async fn service_details(&self) -> Vec<ServiceInfo> {
        let state = self.state.lock().await;
        state.registry.entries()
    }

    pub async fn get_current_options(&self) -> EnablementConfig {
        let state = self.state.lock().await;
        state.options.clone()
    }

    /// Replace the options and persist them.
    ///
    /// Nothing is started or stopped; call
    /// [`Orchestrator::restart_all_services`] to apply. An `Err` means the
    /// new options are in effect for this process but were not persisted.
    pub async fn update_options(&self, options: EnablementConfig) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.options = options;
        info!(enabled = ?state.options.enabled_kinds(), "Monitor options updated");
        self.persist(&state.options)
    }

    /// Re-read the options from the store without writing them back.
    ///
    /// A store with nothing saved yields the defaults. On a load error the
    /// current options are kept and the error is returned.
    pub async fn reload_options(&self) -> StoreResult<EnablementConfig> {
        let loaded = match self.store.load() {
            Ok(Some(options)) => options,
            Ok(None) => {
                debug!("No persisted monitor options, using defaults");
                EnablementConfig::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to reload monitor options, keeping current options");
                return Err(e);
            }
        };

        let mut state = self.state.lock().await;
        state.options = loaded;
        info!(enabled = ?state.options.enabled_kinds(), "Monitor options reloaded");
        Ok(state.options.clone())
    }

    /// Stop every monitor and refuse further starts.
    ///
    /// Only the first call does anything; returns `true` for that call.
    pub async fn dispose(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.disposed {
            debug!("Orchestrator already disposed");
            return false;
        }

        info!("Disposing orchestrator");
        self.stop_all_locked(&mut state).await;
        state.disposed = true;
        true
    }

    pub async fn is_disposed(&self) -> bool {
        self.state.lock().await.disposed
    }

    async fn start_all_locked(&self, state: &mut State) -> StartReport {
        let mut report = StartReport::default();
        if state.disposed {
            warn!("Orchestrator disposed, not starting monitors");
            return report;
        }

        let enabled = state.options.enabled_kinds();
        info!(enabled = ?enabled, "Starting enabled monitors");

        for kind in enabled {
            let outcome = self.start_locked(state, kind).await;
            report.record(kind, outcome);
        }

        info!(
            started = report.started.len(),
            unavailable = report.unavailable.len(),
            failed = report.failed.len(),
            "Monitor startup complete"
        );
        report
    }

    async fn start_locked(&self, state: &mut State, kind: MonitorKind) -> StartOutcome {
        if state.disposed {
            warn!(monitor = %kind, "Orchestrator disposed, not starting monitor");
            return StartOutcome::Disposed;
        }

        let Some(monitor) = self.resolver.resolve(kind) else {
            info!(monitor = %kind, "Monitor not available in this deployment, skipping");
            return StartOutcome::Unavailable;
        };

        let instance_id = Uuid::new_v4();

        if monitor.kind() != kind {
            error!(
                monitor = %kind,
                resolved = %monitor.kind(),
                %instance_id,
                "Resolver returned a monitor of the wrong kind"
            );
            self.discard(kind, instance_id, monitor).await;
            return StartOutcome::Failed;
        }

        // Replace policy: never two live handles for one kind
        if state.registry.contains(kind) {
            info!(monitor = %kind, "Monitor already running, replacing instance");
            self.stop_locked(state, kind).await;
        }

        let (monitor, outcome) = self
            .run_step(Step::Start, monitor, self.settings.start_timeout)
            .await;

        match (monitor, outcome) {
            (Some(monitor), StepOutcome::Done) => {
                let entry = RegistryEntry::new(kind, instance_id, monitor);
                if let Some(displaced) = state.registry.register(entry) {
                    self.shutdown_entry(displaced).await;
                }
                info!(monitor = %kind, %instance_id, "Monitor started");
                StartOutcome::Started
            }
            (monitor, outcome) => {
                log_step(kind, instance_id, Step::Start, &outcome);
                if let Some(monitor) = monitor {
                    self.discard(kind, instance_id, monitor).await;
                }
                StartOutcome::Failed
            }
        }
    }

    /// Best-effort release of an instance that never made it into the registry.
    async fn discard(&self, kind: MonitorKind, instance_id: Uuid, monitor: Box<dyn Monitor>) {
        let (_, released) = self
            .run_step(Step::Release, monitor, self.settings.stop_timeout)
            .await;
        log_step(kind, instance_id, Step::Release, &released);
    }

    async fn stop_locked(&self, state: &mut State, kind: MonitorKind) -> bool {
        match state.registry.unregister(kind) {
            Some(entry) => {
                self.shutdown_entry(entry).await;
                true
            }
            None => {
                debug!(monitor = %kind, "Monitor not running, nothing to stop");
                false
            }
        }
    }

    async fn stop_all_locked(&self, state: &mut State) -> usize {
        let names = state.registry.names();
        if names.is_empty() {
            return 0;
        }

        info!(running = ?names, "Stopping all monitors");
        let mut stopped = 0;
        for kind in names {
            if self.stop_locked(state, kind).await {
                stopped += 1;
            }
        }
        stopped
    }

    /// Stop and release an entry that is already out of the registry.
    async fn shutdown_entry(&self, entry: RegistryEntry) {
        let RegistryEntry {
            kind,
            instance_id,
            handle,
            ..
        } = entry;
        let limit = self.settings.stop_timeout;

        let (handle, stopped) = self.run_step(Step::Stop, handle, limit).await;
        log_step(kind, instance_id, Step::Stop, &stopped);

        match handle {
            Some(handle) => {
                let (_, released) = self.run_step(Step::Release, handle, limit).await;
                log_step(kind, instance_id, Step::Release, &released);
            }
            None => warn!(
                monitor = %kind,
                %instance_id,
                "Monitor handle lost during stop, skipping release"
            ),
        }

        info!(monitor = %kind, %instance_id, "Monitor stopped");
    }

    /// Run one handshake step on its own task.
    ///
    /// The monitor comes back unless the step panicked or was aborted after
    /// `limit` elapsed, in which case it has been dropped.
    async fn run_step(
        &self,
        step: Step,
        mut monitor: Box<dyn Monitor>,
        limit: Duration,
    ) -> (Option<Box<dyn Monitor>>, StepOutcome) {
        let mut task = tokio::spawn(async move {
            let result = match step {
                Step::Start => monitor.start().await,
                Step::Stop => monitor.stop().await,
                Step::Release => monitor.release().await,
            };
            (monitor, result)
        });

        let joined = match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                task.abort();
                return (None, StepOutcome::TimedOut(limit));
            }
        };

        match joined {
            Ok((monitor, Ok(()))) => (Some(monitor), StepOutcome::Done),
            Ok((monitor, Err(e))) => (Some(monitor), StepOutcome::Failed(e)),
            Err(e) => (None, StepOutcome::Panicked(e.to_string())),
        }
    }

    fn persist(&self, options: &EnablementConfig) -> StoreResult<()> {
        match self.store.save(options) {
            Ok(()) => {
                debug!("Monitor options persisted");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to persist monitor options, keeping in-memory change");
                Err(e)
            }
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if !state.disposed && !state.registry.is_empty() {
            warn!(
                running = ?state.registry.names(),
                "Orchestrator dropped without dispose, monitors were not stopped cleanly"
            );
        }
    }
}

fn log_step(kind: MonitorKind, instance_id: Uuid, step: Step, outcome: &StepOutcome) {
    let step = step.as_str();
    match outcome {
        StepOutcome::Done => debug!(monitor = %kind, %instance_id, step, "Monitor step complete"),
        StepOutcome::Failed(e) => {
            warn!(monitor = %kind, %instance_id, step, error = %e, "Monitor step failed")
        }
        StepOutcome::Panicked(e) => {
            error!(monitor = %kind, %instance_id, step, error = %e, "Monitor panicked")
        }
        StepOutcome::TimedOut(limit) => error!(
            monitor = %kind,
            %instance_id,
            step,
            timeout_ms = limit.as_millis() as u64,
            "Monitor step timed out, forcing removal; resources may have leaked"
        ),
    }
}

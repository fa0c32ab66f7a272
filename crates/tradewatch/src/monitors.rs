//! Monitor wiring for the host process.
//!
//! The host binds one [`PollingMonitor`] per kind. The watchers' trading
//! logic lives behind the exchange client and is not part of this binary, so
//! each check here only records that an evaluation pass ran.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use tradewatch_core::{Monitor, MonitorFactories, MonitorKind, PollingMonitor, Tick, TickError};

use crate::config::Config;

/// One evaluation pass for a watcher kind.
pub struct EvaluationPass {
    kind: MonitorKind,
    passes: Arc<AtomicU64>,
}

#[async_trait]
impl Tick for EvaluationPass {
    async fn tick(&self) -> Result<(), TickError> {
        let pass = self.passes.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(monitor = %self.kind, pass, "Evaluation pass");
        Ok(())
    }
}

/// Resolver that builds a fresh polling monitor for every kind.
pub fn build_resolver(config: &Config) -> MonitorFactories {
    MonitorKind::ALL
        .into_iter()
        .fold(MonitorFactories::new(), |factories, kind| {
            let interval = config.poll_interval(kind);
            let passes = Arc::new(AtomicU64::new(0));
            factories.with(kind, move || {
                Box::new(PollingMonitor::new(
                    kind,
                    interval,
                    EvaluationPass {
                        kind,
                        passes: Arc::clone(&passes),
                    },
                )) as Box<dyn Monitor>
            })
        })
}

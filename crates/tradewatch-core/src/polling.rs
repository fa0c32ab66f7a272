//! Interval-driven monitor.
//!
//! Most watchers are "every N seconds, look at something and maybe act".
//! [`PollingMonitor`] owns the loop, the stop signal and the task handle, so a
//! watcher only has to implement [`Tick`].

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::{MonitorError, MonitorResult};
use crate::monitor::{Monitor, MonitorKind};

/// Error type a tick may return; it is logged and the loop keeps going
pub type TickError = Box<dyn std::error::Error + Send + Sync>;

/// One evaluation pass of a polling watcher.
#[async_trait]
pub trait Tick: Send + Sync + 'static {
    async fn tick(&self) -> Result<(), TickError>;
}

/// A [`Monitor`] that calls [`Tick::tick`] on a fixed interval until stopped.
pub struct PollingMonitor<T: Tick> {
    kind: MonitorKind,
    interval: Duration,
    check: Arc<T>,
    ticks: Arc<AtomicU64>,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl<T: Tick> PollingMonitor<T> {
    pub fn new(kind: MonitorKind, interval: Duration, check: T) -> Self {
        Self {
            kind,
            interval,
            check: Arc::new(check),
            ticks: Arc::new(AtomicU64::new(0)),
            shutdown: None,
            task: None,
        }
    }

    /// Successful ticks since construction
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

#[async_trait]
impl<T: Tick> Monitor for PollingMonitor<T> {
    fn kind(&self) -> MonitorKind {
        self.kind
    }

    async fn start(&mut self) -> MonitorResult<()> {
        if self.task.is_some() {
            return Err(MonitorError::AlreadyRunning { kind: self.kind });
        }
        if self.interval.is_zero() {
            return Err(MonitorError::start(self.kind, "poll interval must be non-zero"));
        }

        let (tx, mut rx) = watch::channel(false);
        let kind = self.kind;
        let period = self.interval;
        let check = Arc::clone(&self.check);
        let ticks = Arc::clone(&self.ticks);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    // Also fires when the sender is dropped
                    _ = rx.changed() => break,
                    _ = interval.tick() => {
                        match check.tick().await {
                            Ok(()) => {
                                ticks.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(e) => warn!(monitor = %kind, error = %e, "Tick failed"),
                        }
                    }
                }
            }

            debug!(monitor = %kind, "Polling loop exited");
        });

        self.shutdown = Some(tx);
        self.task = Some(task);
        info!(
            monitor = %self.kind,
            interval_ms = self.interval.as_millis() as u64,
            "Polling started"
        );
        Ok(())
    }

    async fn stop(&mut self) -> MonitorResult<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }

        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| MonitorError::stop(self.kind, e.to_string())),
            None => Ok(()),
        }
    }

    async fn release(&mut self) -> MonitorResult<()> {
        self.shutdown = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        Ok(())
    }
}

impl<T: Tick> Drop for PollingMonitor<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter;

    #[async_trait]
    impl Tick for Counter {
        async fn tick(&self) -> Result<(), TickError> {
            Ok(())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Tick for AlwaysFails {
        async fn tick(&self) -> Result<(), TickError> {
            Err("price feed unavailable".into())
        }
    }

    #[tokio::test]
    async fn test_ticks_until_stopped() {
        let mut monitor =
            PollingMonitor::new(MonitorKind::StopLoss, Duration::from_millis(5), Counter);

        monitor.start().await.unwrap();
        assert!(monitor.is_running());
        tokio::time::sleep(Duration::from_millis(60)).await;
        monitor.stop().await.unwrap();

        let ticks = monitor.ticks();
        assert!(ticks > 0);
        assert!(!monitor.is_running());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(monitor.ticks(), ticks);
    }

    #[tokio::test]
    async fn test_failing_ticks_keep_running() {
        let mut monitor =
            PollingMonitor::new(MonitorKind::OrderCondition, Duration::from_millis(5), AlwaysFails);

        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(monitor.is_running());
        assert_eq!(monitor.ticks(), 0);
        monitor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_double_start_is_rejected() {
        let mut monitor =
            PollingMonitor::new(MonitorKind::StopLoss, Duration::from_millis(5), Counter);

        monitor.start().await.unwrap();
        let err = monitor.start().await.unwrap_err();
        assert!(matches!(err, MonitorError::AlreadyRunning { .. }));
        monitor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_interval_fails_to_start() {
        let mut monitor = PollingMonitor::new(MonitorKind::StopLoss, Duration::ZERO, Counter);
        assert!(monitor.start().await.is_err());
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn test_stop_and_release_are_idempotent() {
        let mut monitor =
            PollingMonitor::new(MonitorKind::StopLoss, Duration::from_millis(5), Counter);

        monitor.stop().await.unwrap();
        monitor.release().await.unwrap();

        monitor.start().await.unwrap();
        monitor.stop().await.unwrap();
        monitor.release().await.unwrap();
        monitor.release().await.unwrap();
    }
}

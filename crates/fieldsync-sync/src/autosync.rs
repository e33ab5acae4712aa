//! Auto-sync: drains the queue when connectivity returns.
//!
//! Convenience, not correctness: the batch lock in the executor already
//! arbitrates against a manual "Sync now", so this task may lose the
//! race or be skipped entirely without affecting queue state.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use fieldsync_core::{Error, Result};

use crate::executor::SyncExecutor;
use crate::network::NetworkMonitor;

/// Handle for controlling a running auto-sync task.
pub struct AutoSyncHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl AutoSyncHandle {
    /// Signal the auto-sync task to shut down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }
}

/// Watches the network monitor and triggers a batch drain on each
/// offline→online transition.
pub struct AutoSync {
    monitor: NetworkMonitor,
    executor: Arc<SyncExecutor>,
}

impl AutoSync {
    /// Create a new auto-sync trigger.
    pub fn new(monitor: NetworkMonitor, executor: Arc<SyncExecutor>) -> Self {
        Self { monitor, executor }
    }

    /// Start the task and return a handle for control.
    pub fn start(self) -> AutoSyncHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        AutoSyncHandle { shutdown_tx }
    }

    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        let settle_delay = self.executor.config().settle_delay;
        let mut connectivity = self.monitor.subscribe();
        let mut was_online = *connectivity.borrow();

        info!(
            subsystem = "sync",
            component = "autosync",
            settle_ms = settle_delay.as_millis() as u64,
            online = was_online,
            "Auto-sync watching connectivity"
        );

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(
                        subsystem = "sync",
                        component = "autosync",
                        "Auto-sync received shutdown signal"
                    );
                    break;
                }
                changed = connectivity.changed() => {
                    if changed.is_err() {
                        // Monitor dropped; nothing left to watch.
                        break;
                    }
                    let now_online = *connectivity.borrow_and_update();
                    let came_online = !was_online && now_online;
                    was_online = now_online;
                    if came_online {
                        self.on_reconnect(settle_delay).await;
                    }
                }
            }
        }
    }

    /// Settle, re-check, then drain. A connection that flaps back offline
    /// during the settle window aborts the trigger; the next transition
    /// starts over.
    async fn on_reconnect(&self, settle_delay: std::time::Duration) {
        sleep(settle_delay).await;

        if !self.monitor.is_online() {
            debug!(
                subsystem = "sync",
                component = "autosync",
                "Connection flapped during settle window, skipping"
            );
            return;
        }

        match self.executor.has_eligible_work().await {
            Ok(false) => {
                debug!(
                    subsystem = "sync",
                    component = "autosync",
                    "Queue empty after reconnect, nothing to sync"
                );
                return;
            }
            Ok(true) => {}
            Err(e) => {
                warn!(
                    subsystem = "sync",
                    component = "autosync",
                    error = %e,
                    "Failed to inspect queue after reconnect"
                );
                return;
            }
        }

        match self.executor.process_upload_queue(|_| {}).await {
            Ok(summary) => info!(
                subsystem = "sync",
                component = "autosync",
                successful = summary.successful,
                failed = summary.failed,
                "Auto-sync batch finished"
            ),
            // A manual sync won the race; its batch covers our items.
            Err(Error::AlreadyRunning) => debug!(
                subsystem = "sync",
                component = "autosync",
                "Manual sync already in progress"
            ),
            Err(e) => warn!(
                subsystem = "sync",
                component = "autosync",
                error = %e,
                "Auto-sync batch failed"
            ),
        }
    }
}

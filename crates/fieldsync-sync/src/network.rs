//! Connectivity state shared between the platform signal and the sync
//! layer.
//!
//! The monitor is a thin wrapper over a watch channel: the embedding
//! application feeds it the platform's online/offline signal and the
//! auto-sync task observes transitions. No probing or heuristics happen
//! here; a wrong signal only costs a failed upload attempt, which the
//! executor already handles.

use tokio::sync::watch;
use tracing::info;

/// Single source of truth for online/offline state.
#[derive(Debug, Clone)]
pub struct NetworkMonitor {
    tx: watch::Sender<bool>,
}

impl NetworkMonitor {
    /// Create a monitor with the given initial state.
    pub fn new(initially_online: bool) -> Self {
        let (tx, _) = watch::channel(initially_online);
        Self { tx }
    }

    /// Current connectivity flag.
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Record a connectivity change from the platform signal.
    /// Repeated reports of the same state do not notify subscribers.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current != online {
                *current = online;
                true
            } else {
                false
            }
        });
        if changed {
            info!(
                subsystem = "network",
                op = "transition",
                online,
                "Connectivity changed"
            );
        }
    }

    /// Subscribe to connectivity transitions.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for NetworkMonitor {
    /// Starts offline; the first platform report corrects it.
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        assert!(NetworkMonitor::new(true).is_online());
        assert!(!NetworkMonitor::default().is_online());
    }

    #[tokio::test]
    async fn test_subscriber_sees_transition() {
        let monitor = NetworkMonitor::new(false);
        let mut rx = monitor.subscribe();

        monitor.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
    }

    #[tokio::test]
    async fn test_duplicate_reports_do_not_notify() {
        let monitor = NetworkMonitor::new(true);
        let mut rx = monitor.subscribe();

        monitor.set_online(true);
        assert!(!rx.has_changed().unwrap());

        monitor.set_online(false);
        assert!(rx.has_changed().unwrap());
    }
}

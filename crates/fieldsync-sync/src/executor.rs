//! Sync executor: drains the photo queue against the remote store.
//!
//! One batch at a time (guarded by a mutex), one upload at a time inside
//! a batch. A batch operates on a snapshot of eligible items taken at
//! invocation, so entries queued mid-drain wait for the next run and the
//! progress counter stays well-defined.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use fieldsync_core::{
    defaults, BatchSummary, Error, PhotoQueueRepository, PhotoUpload, QueueEvent, RemoteStore,
    Result, SyncStatus, UploadOutcome, UploadProgress,
};
use fieldsync_store::Store;

/// Configuration for the sync executor.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Per-item upload timeout.
    pub upload_timeout: Duration,
    /// Delay between an offline→online transition and auto-sync start.
    pub settle_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            upload_timeout: Duration::from_secs(defaults::UPLOAD_TIMEOUT_SECS),
            settle_delay: Duration::from_millis(defaults::AUTO_SYNC_SETTLE_MS),
        }
    }
}

impl SyncConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `FIELDSYNC_UPLOAD_TIMEOUT_SECS` | `120` | Per-item upload timeout |
    /// | `FIELDSYNC_SETTLE_MS` | `2000` | Auto-sync settle delay after reconnect |
    pub fn from_env() -> Self {
        let upload_timeout = std::env::var("FIELDSYNC_UPLOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(defaults::UPLOAD_TIMEOUT_SECS));

        let settle_delay = std::env::var("FIELDSYNC_SETTLE_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(defaults::AUTO_SYNC_SETTLE_MS));

        Self {
            upload_timeout,
            settle_delay,
        }
    }

    /// Set the per-item upload timeout.
    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    /// Set the auto-sync settle delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

/// Drains the queue against the remote store, one item at a time.
///
/// Constructed once per session and shared (`Arc`) between the manual
/// "Sync now" path and the auto-sync trigger; the internal batch lock
/// arbitrates between them.
pub struct SyncExecutor {
    store: Store,
    remote: Arc<dyn RemoteStore>,
    config: SyncConfig,
    batch_lock: Mutex<()>,
}

impl SyncExecutor {
    /// Create a new executor over the given store and remote collaborator.
    pub fn new(store: Store, remote: Arc<dyn RemoteStore>, config: SyncConfig) -> Self {
        Self {
            store,
            remote,
            config,
            batch_lock: Mutex::new(()),
        }
    }

    /// The executor's configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Whether any item is currently eligible for a batch (pending or
    /// failed). Used by the auto-sync trigger to skip empty runs.
    pub async fn has_eligible_work(&self) -> Result<bool> {
        let counts = self.store.photos.counts().await?;
        Ok(counts.pending + counts.failed > 0)
    }

    /// Drain the queue: upload every `pending` or `failed` item in the
    /// snapshot, oldest first, reporting per-item progress.
    ///
    /// Fails fast with [`Error::AlreadyRunning`] when another drain holds
    /// the batch lock; no item status is touched in that case. One item's
    /// upload failure never aborts its siblings.
    pub async fn process_upload_queue<F>(&self, on_progress: F) -> Result<BatchSummary>
    where
        F: Fn(UploadProgress) + Send,
    {
        let _guard = self
            .batch_lock
            .try_lock()
            .map_err(|_| Error::AlreadyRunning)?;

        let start = Instant::now();

        // Snapshot at invocation time: items queued after this point are
        // not part of the batch.
        let snapshot: Vec<Uuid> = self
            .store
            .photos
            .get_pending_photos()
            .await?
            .into_iter()
            .filter(|p| matches!(p.sync_status, SyncStatus::Pending | SyncStatus::Failed))
            .map(|p| p.local_id)
            .collect();

        let total = snapshot.len() as u32;
        info!(
            subsystem = "sync",
            component = "executor",
            op = "process_upload_queue",
            batch_total = total,
            "Starting upload batch"
        );
        self.store.events.emit(QueueEvent::BatchStarted { total });

        let mut summary = BatchSummary::default();
        let mut attempted: u32 = 0;
        for local_id in snapshot {
            let photo = match self.store.photos.claim_for_upload(local_id).await {
                Ok(photo) => photo,
                // Claimed by a concurrent manual upload, or deleted since
                // the snapshot; not this batch's item anymore.
                Err(Error::InvalidState(reason)) => {
                    debug!(
                        subsystem = "sync",
                        component = "executor",
                        photo_id = %local_id,
                        reason,
                        "Skipping item claimed elsewhere"
                    );
                    continue;
                }
                Err(Error::PhotoNotFound(_)) => continue,
                Err(e) => return Err(e),
            };

            // Skipped snapshot entries must not leave holes in the
            // progress sequence, so the counter tracks attempts.
            attempted += 1;
            on_progress(UploadProgress {
                current: attempted,
                total,
                current_photo_id: local_id,
            });

            match self.attempt_upload(photo).await {
                Ok(()) => {
                    self.store.photos.mark_completed(local_id).await?;
                    summary.successful += 1;
                }
                Err(e) => {
                    self.store
                        .photos
                        .mark_failed(local_id, &e.to_string())
                        .await?;
                    summary.failed += 1;
                }
            }
        }

        info!(
            subsystem = "sync",
            component = "executor",
            op = "process_upload_queue",
            successful = summary.successful,
            failed = summary.failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Upload batch finished"
        );
        self.store.events.emit(QueueEvent::BatchFinished { summary });

        if summary.successful > 0 {
            self.destroy_completed().await;
        }
        Ok(summary)
    }

    /// Upload a single item (the manual-retry path).
    ///
    /// Refuses to act on an item that is already `uploading` (a user
    /// double-click must not start a second transfer); the refusal is a
    /// non-fatal outcome, not an error.
    pub async fn upload_photo(&self, local_id: Uuid) -> Result<UploadOutcome> {
        let photo = match self.store.photos.claim_for_upload(local_id).await {
            Ok(photo) => photo,
            Err(Error::InvalidState(reason)) => {
                debug!(
                    subsystem = "sync",
                    component = "executor",
                    op = "upload_photo",
                    photo_id = %local_id,
                    reason,
                    "Upload refused by per-item guard"
                );
                return Ok(UploadOutcome::err(reason));
            }
            Err(e) => return Err(e),
        };

        match self.attempt_upload(photo).await {
            Ok(()) => {
                self.store.photos.mark_completed(local_id).await?;
                self.destroy_completed().await;
                Ok(UploadOutcome::ok())
            }
            Err(e) => {
                let message = e.to_string();
                self.store.photos.mark_failed(local_id, &message).await?;
                Ok(UploadOutcome::err(message))
            }
        }
    }

    /// Destroy completed rows once subscribers have been notified of the
    /// outcome; their metadata and thumbnail bytes have served their
    /// purpose. Best-effort: the uploads already succeeded, so a purge
    /// failure is logged and retried on the next drain.
    async fn destroy_completed(&self) {
        if let Err(e) = self.store.photos.purge_completed().await {
            warn!(
                subsystem = "sync",
                component = "executor",
                op = "purge_completed",
                error = %e,
                "Failed to destroy completed records"
            );
        }
    }

    /// One network-visible attempt, bounded by the per-item timeout so a
    /// hung transfer cannot stall the sequential queue.
    async fn attempt_upload(&self, photo: fieldsync_core::PendingPhoto) -> Result<()> {
        let local_id = photo.local_id;
        let blob_bytes = photo.blob.len();
        let upload = PhotoUpload::from(photo);
        let start = Instant::now();

        let result = match timeout(self.config.upload_timeout, self.remote.upload(&upload)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Network(format!(
                "upload timed out after {}s",
                self.config.upload_timeout.as_secs()
            ))),
        };

        match &result {
            Ok(()) => debug!(
                subsystem = "sync",
                component = "executor",
                op = "upload",
                photo_id = %local_id,
                blob_bytes,
                duration_ms = start.elapsed().as_millis() as u64,
                "Upload succeeded"
            ),
            Err(e) => warn!(
                subsystem = "sync",
                component = "executor",
                op = "upload",
                photo_id = %local_id,
                error = %e,
                duration_ms = start.elapsed().as_millis() as u64,
                "Upload attempt failed"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_config_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.upload_timeout, Duration::from_secs(120));
        assert_eq!(config.settle_delay, Duration::from_millis(2_000));
    }

    #[test]
    fn test_sync_config_builder() {
        let config = SyncConfig::default()
            .with_upload_timeout(Duration::from_secs(10))
            .with_settle_delay(Duration::from_millis(50));

        assert_eq!(config.upload_timeout, Duration::from_secs(10));
        assert_eq!(config.settle_delay, Duration::from_millis(50));
    }
}

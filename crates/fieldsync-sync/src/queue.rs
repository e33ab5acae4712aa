//! Read-side aggregation over the photo queue for consuming views.
//!
//! Holds no state of its own: everything is a projection of the store
//! plus the single shared event bus, so every UI surface observing the
//! queue sees the same truth.

use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use fieldsync_core::{
    BatchSummary, PendingPhoto, PhotoEdit, PhotoQueueRepository, QueueCounts, QueueEventEnvelope,
    Result, UploadOutcome, UploadProgress,
};
use fieldsync_store::Store;

use crate::executor::SyncExecutor;

/// UI-facing convenience API over the local photo store.
#[derive(Clone)]
pub struct UploadQueueManager {
    store: Store,
    executor: Arc<SyncExecutor>,
}

impl UploadQueueManager {
    /// Create a manager over the given store and executor.
    pub fn new(store: Store, executor: Arc<SyncExecutor>) -> Self {
        Self { store, executor }
    }

    /// "N pending / N uploading / N failed" for the aggregate summary.
    pub async fn counts(&self) -> Result<QueueCounts> {
        self.store.photos.counts().await
    }

    /// Counts scoped to one project.
    pub async fn counts_for_project(&self, project_id: Uuid) -> Result<QueueCounts> {
        self.store.photos.counts_for_project(project_id).await
    }

    /// All outstanding photos, oldest capture first.
    pub async fn photos(&self) -> Result<Vec<PendingPhoto>> {
        self.store.photos.get_pending_photos().await
    }

    /// Outstanding photos for one project, oldest capture first.
    pub async fn photos_for_project(&self, project_id: Uuid) -> Result<Vec<PendingPhoto>> {
        self.store.photos.get_pending_photos_for_project(project_id).await
    }

    /// Edit caption/category/associations on a queued photo.
    pub async fn edit(&self, local_id: Uuid, edit: PhotoEdit) -> Result<()> {
        self.store.photos.update_photo(local_id, edit).await
    }

    /// Remove a photo from the queue.
    pub async fn delete(&self, local_id: Uuid) -> Result<()> {
        self.store.photos.delete_photo(local_id).await
    }

    /// Retry a failed photo immediately.
    pub async fn retry(&self, local_id: Uuid) -> Result<UploadOutcome> {
        self.executor.upload_photo(local_id).await
    }

    /// The manual "Sync now" action.
    pub async fn sync_now<F>(&self, on_progress: F) -> Result<BatchSummary>
    where
        F: Fn(UploadProgress) + Send,
    {
        self.executor.process_upload_queue(on_progress).await
    }

    /// Subscribe to queue changes. Every mutation of the store reaches
    /// every subscriber; views refresh from here instead of polling.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEventEnvelope> {
        self.store.events.subscribe()
    }
}

//! Trait seams between the queue core and its collaborators.
//!
//! The store trait keeps the sync executor and UI layers testable against
//! in-memory fakes; the remaining traits are the boundaries to external
//! systems (remote store, identity provider, device geolocation) whose
//! internals are out of scope here.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    GeoPoint, PendingPhoto, PhotoEdit, PhotoUpload, QueueCounts, QueuePhotoRequest, UserContext,
};

/// Durable CRUD over [`PendingPhoto`] records plus the state-machine
/// transitions the sync executor drives.
///
/// Implementations must serialize writes per `local_id`: the conditional
/// transition methods (`claim_for_upload`, `mark_completed`, `mark_failed`)
/// are the only way a record's `sync_status` changes, and each succeeds for
/// at most one caller when invoked concurrently on the same record.
#[async_trait]
pub trait PhotoQueueRepository: Send + Sync {
    /// Validate, deduplicate, and durably persist a new queue entry with
    /// status `pending`. Returns the entry's `local_id` — or the existing
    /// entry's id when the same capture event is already queued.
    async fn queue_photo(&self, request: QueuePhotoRequest) -> Result<Uuid>;

    /// Fetch one record by id.
    async fn get_photo(&self, local_id: Uuid) -> Result<PendingPhoto>;

    /// All records that have not reached the server (`pending`,
    /// `uploading`, `failed`), oldest capture first.
    async fn get_pending_photos(&self) -> Result<Vec<PendingPhoto>>;

    /// Same as [`get_pending_photos`](Self::get_pending_photos), scoped to
    /// one project.
    async fn get_pending_photos_for_project(&self, project_id: Uuid) -> Result<Vec<PendingPhoto>>;

    /// Merge allowed metadata fields into a `pending` or `failed` record.
    /// Rejected with `InvalidState` while the record is `uploading`.
    async fn update_photo(&self, local_id: Uuid, edit: PhotoEdit) -> Result<()>;

    /// Remove a record. Rejected with `InvalidState` while `uploading` so
    /// an in-flight upload is never orphaned mid-transfer.
    async fn delete_photo(&self, local_id: Uuid) -> Result<()>;

    /// Transition `pending`/`failed` → `uploading`, clearing any previous
    /// `error_message`. Fails with `InvalidState` when the record is
    /// already uploading (or completed), which is the per-item guard
    /// against double-invocation.
    async fn claim_for_upload(&self, local_id: Uuid) -> Result<PendingPhoto>;

    /// Transition `uploading` → `completed` and purge the blob.
    async fn mark_completed(&self, local_id: Uuid) -> Result<()>;

    /// Transition `uploading` → `failed`, recording a human-readable
    /// `error_message`.
    async fn mark_failed(&self, local_id: Uuid, error_message: &str) -> Result<()>;

    /// Counts of outstanding records by status.
    async fn counts(&self) -> Result<QueueCounts>;

    /// Counts of outstanding records by status, scoped to one project.
    async fn counts_for_project(&self, project_id: Uuid) -> Result<QueueCounts>;

    /// Remove completed rows retained for progress accounting.
    async fn purge_completed(&self) -> Result<u64>;
}

/// The external, hosted system of record for finished uploads.
///
/// One call, one network-visible attempt: retry policy belongs to the
/// sync executor. Implementations return `Error::Network` for transport
/// failures and `Error::RemoteRejection` for typed server refusals
/// (authorization, quota, validation).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn upload(&self, upload: &PhotoUpload) -> Result<()>;
}

/// Supplies the authenticated user context stamped onto new queue entries.
///
/// Assumed synchronously available once the user is signed in; ingest
/// rejects capture when it returns `None`.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<UserContext>;
}

/// Best-effort device geolocation. Absence is a valid, non-error outcome
/// and must never block photo capture.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_location(&self) -> Option<GeoPoint>;
}

//! Core data model for the offline photo queue.
//!
//! The central entity is [`PendingPhoto`]: one locally persisted record per
//! captured photo, carrying the original blob until the upload to the remote
//! store completes. The [`SyncStatus`] field is the per-item state machine:
//!
//! ```text
//! pending ──▶ uploading ──▶ completed
//!    ▲             │
//!    └── retry ◀── failed
//! ```
//!
//! Only the sync executor moves items in and out of `uploading`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-item progress toward the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Captured and durably persisted, awaiting upload.
    Pending,
    /// An upload attempt is in flight. Edits and deletes are rejected.
    Uploading,
    /// The remote store acknowledged the upload; the local blob is purged.
    Completed,
    /// The last upload attempt failed; `error_message` describes why.
    Failed,
}

impl SyncStatus {
    /// Whether a record in this status appears in pending-queue enumeration.
    pub fn is_outstanding(self) -> bool {
        !matches!(self, SyncStatus::Completed)
    }

    /// Whether caption/category edits are permitted in this status.
    pub fn is_editable(self) -> bool {
        matches!(self, SyncStatus::Pending | SyncStatus::Failed)
    }
}

/// Category assigned to a photo at capture time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoCategory {
    /// General progress documentation (default)
    #[default]
    Progress,
    /// A problem that needs attention
    Issue,
    /// Before-work condition
    Before,
    /// After-work condition
    After,
    /// Inspection evidence
    Inspection,
    /// Safety observation
    Safety,
    /// Delivered or staged material
    Material,
}

/// Best-effort geocoordinate attached at capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    /// Reverse-geocoded address, when the platform supplies one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Identity attribution stamped onto every queue entry at ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Uuid,
    pub user_name: String,
    pub org_id: Uuid,
}

/// A photo awaiting (or having completed) upload to the remote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPhoto {
    /// Locally generated primary key (UUIDv7, immutable).
    pub local_id: Uuid,
    pub project_id: Uuid,
    pub org_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    /// Original image payload. Empty only after successful completion,
    /// when ownership has transferred to the remote store.
    #[serde(skip)]
    pub blob: Vec<u8>,
    /// Small preview, generated at or before persistence.
    #[serde(skip)]
    pub thumbnail: Vec<u8>,
    pub filename: String,
    pub caption: Option<String>,
    pub category: PhotoCategory,
    /// Capture timestamp (distinct from queue insertion time).
    pub taken_at: DateTime<Utc>,
    pub location: Option<GeoPoint>,
    pub phase_id: Option<Uuid>,
    pub album_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub sync_status: SyncStatus,
    /// Present only when `sync_status == Failed`; cleared on retry.
    pub error_message: Option<String>,
    /// Capture-event fingerprint (sha256 of the blob, hex) used to
    /// deduplicate re-ingestion of the same capture.
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for queueing a new photo.
///
/// Required: `project_id`, attribution (`user`), a non-empty `blob`, and a
/// `thumbnail` (the ingest surface generates one when the capture device
/// did not). Everything else defaults: `category` to
/// [`PhotoCategory::Progress`], `taken_at` to now, associations and
/// caption/location to none.
#[derive(Debug, Clone)]
pub struct QueuePhotoRequest {
    pub project_id: Uuid,
    pub user: UserContext,
    pub blob: Vec<u8>,
    pub thumbnail: Vec<u8>,
    pub filename: String,
    pub caption: Option<String>,
    pub category: PhotoCategory,
    pub taken_at: DateTime<Utc>,
    pub location: Option<GeoPoint>,
    pub phase_id: Option<Uuid>,
    pub album_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    /// Capture-event fingerprint. The ingest surface computes this from
    /// the blob; callers going straight to the store may supply their own.
    pub content_hash: String,
}

/// Partial metadata update for a queued photo.
///
/// Only fields that are safe to change while the photo sits in the queue
/// are present; the blob, identity, and status fields are not editable
/// through this path.
#[derive(Debug, Clone, Default)]
pub struct PhotoEdit {
    pub caption: Option<Option<String>>,
    pub category: Option<PhotoCategory>,
    pub filename: Option<String>,
    pub phase_id: Option<Option<Uuid>>,
    pub album_id: Option<Option<Uuid>>,
    pub task_id: Option<Option<Uuid>>,
}

impl PhotoEdit {
    /// True when the edit carries no changes.
    pub fn is_empty(&self) -> bool {
        self.caption.is_none()
            && self.category.is_none()
            && self.filename.is_none()
            && self.phase_id.is_none()
            && self.album_id.is_none()
            && self.task_id.is_none()
    }
}

/// Aggregate queue counts by outstanding status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: i64,
    pub uploading: i64,
    pub failed: i64,
}

impl QueueCounts {
    /// Photos that have not yet reached the server.
    pub fn outstanding(&self) -> i64 {
        self.pending + self.uploading + self.failed
    }
}

/// Summary of one drain-the-queue batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub successful: u32,
    pub failed: u32,
}

/// Outcome of a single-item upload (manual retry path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Per-item progress report during a batch drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    /// 1-based index of the item being uploaded.
    pub current: u32,
    /// Number of items in the batch snapshot.
    pub total: u32,
    pub current_photo_id: Uuid,
}

/// Finished upload handed to the remote store collaborator.
///
/// `local_id` doubles as the idempotency key: the remote store is
/// at-least-once, and replays of the same identifier must not create
/// duplicate server-side photos.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub local_id: Uuid,
    pub project_id: Uuid,
    pub org_id: Uuid,
    pub user_id: Uuid,
    pub blob: Vec<u8>,
    pub thumbnail: Vec<u8>,
    pub filename: String,
    pub caption: Option<String>,
    pub category: PhotoCategory,
    pub taken_at: DateTime<Utc>,
    pub location: Option<GeoPoint>,
    pub phase_id: Option<Uuid>,
    pub album_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
}

impl From<PendingPhoto> for PhotoUpload {
    fn from(p: PendingPhoto) -> Self {
        Self {
            local_id: p.local_id,
            project_id: p.project_id,
            org_id: p.org_id,
            user_id: p.user_id,
            blob: p.blob,
            thumbnail: p.thumbnail,
            filename: p.filename,
            caption: p.caption,
            category: p.category,
            taken_at: p.taken_at,
            location: p.location,
            phase_id: p.phase_id,
            album_id: p.album_id,
            task_id: p.task_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_status_outstanding() {
        assert!(SyncStatus::Pending.is_outstanding());
        assert!(SyncStatus::Uploading.is_outstanding());
        assert!(SyncStatus::Failed.is_outstanding());
        assert!(!SyncStatus::Completed.is_outstanding());
    }

    #[test]
    fn test_sync_status_editable() {
        assert!(SyncStatus::Pending.is_editable());
        assert!(SyncStatus::Failed.is_editable());
        assert!(!SyncStatus::Uploading.is_editable());
        assert!(!SyncStatus::Completed.is_editable());
    }

    #[test]
    fn test_sync_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&SyncStatus::Uploading).unwrap(),
            "\"uploading\""
        );
        let parsed: SyncStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, SyncStatus::Failed);
    }

    #[test]
    fn test_photo_category_default() {
        assert_eq!(PhotoCategory::default(), PhotoCategory::Progress);
    }

    #[test]
    fn test_photo_category_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&PhotoCategory::Inspection).unwrap(),
            "\"inspection\""
        );
        let parsed: PhotoCategory = serde_json::from_str("\"material\"").unwrap();
        assert_eq!(parsed, PhotoCategory::Material);
    }

    #[test]
    fn test_photo_edit_is_empty() {
        assert!(PhotoEdit::default().is_empty());

        let edit = PhotoEdit {
            caption: Some(Some("pour complete".to_string())),
            ..Default::default()
        };
        assert!(!edit.is_empty());
    }

    #[test]
    fn test_photo_edit_clearing_caption_is_not_empty() {
        // Some(None) means "clear the caption" and must count as a change
        let edit = PhotoEdit {
            caption: Some(None),
            ..Default::default()
        };
        assert!(!edit.is_empty());
    }

    #[test]
    fn test_queue_counts_outstanding() {
        let counts = QueueCounts {
            pending: 3,
            uploading: 1,
            failed: 2,
        };
        assert_eq!(counts.outstanding(), 6);
    }

    #[test]
    fn test_upload_outcome_constructors() {
        let ok = UploadOutcome::ok();
        assert!(ok.success);
        assert!(ok.error.is_none());

        let err = UploadOutcome::err("remote timed out");
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("remote timed out"));
    }

    #[test]
    fn test_photo_upload_from_pending_photo() {
        let photo = PendingPhoto {
            local_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_name: "Pat Mason".to_string(),
            blob: vec![1, 2, 3],
            thumbnail: vec![4, 5],
            filename: "slab.jpg".to_string(),
            caption: Some("east slab".to_string()),
            category: PhotoCategory::Before,
            taken_at: Utc::now(),
            location: Some(GeoPoint {
                lat: 39.74,
                lng: -104.99,
                address: None,
            }),
            phase_id: None,
            album_id: None,
            task_id: None,
            sync_status: SyncStatus::Pending,
            error_message: None,
            content_hash: "abc123".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let upload = PhotoUpload::from(photo.clone());
        assert_eq!(upload.local_id, photo.local_id);
        assert_eq!(upload.blob, vec![1, 2, 3]);
        assert_eq!(upload.category, PhotoCategory::Before);
        assert_eq!(upload.caption.as_deref(), Some("east slab"));
    }
}

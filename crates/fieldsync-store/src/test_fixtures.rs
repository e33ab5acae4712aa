//! Shared fixtures for store and sync tests.

use chrono::Utc;
use uuid::Uuid;

use fieldsync_core::{PhotoCategory, QueuePhotoRequest, UserContext};

/// A deterministic test user.
pub fn test_user() -> UserContext {
    UserContext {
        user_id: Uuid::from_u128(0x11),
        user_name: "Test Foreman".to_string(),
        org_id: Uuid::from_u128(0x22),
    }
}

/// Build a valid queue request for the given project.
///
/// `seed` differentiates blobs (and therefore content hashes) so multiple
/// fixtures coexist in the same queue without tripping deduplication.
pub fn queue_request(project_id: Uuid, seed: u8) -> QueuePhotoRequest {
    QueuePhotoRequest {
        project_id,
        user: test_user(),
        blob: vec![seed; 64],
        thumbnail: vec![seed; 16],
        filename: format!("photo-{seed}.jpg"),
        caption: None,
        category: PhotoCategory::Progress,
        taken_at: Utc::now(),
        location: None,
        phase_id: None,
        album_id: None,
        task_id: None,
        content_hash: format!("hash-{seed:02x}"),
    }
}

//! Photo queue repository implementation.
//!
//! All `sync_status` transitions are conditional UPDATEs guarded on the
//! current status, so concurrent writers (a manual retry racing an
//! auto-sync pass) resolve atomically inside SQLite: exactly one caller
//! wins the transition and the loser gets `InvalidState`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::{debug, info, warn};
use uuid::Uuid;

use fieldsync_core::{
    new_v7, Error, GeoPoint, PendingPhoto, PhotoCategory, PhotoEdit, PhotoQueueRepository,
    QueueCounts, QueueEvent, QueueEventBus, QueuePhotoRequest, Result, SyncStatus,
};

/// SQLite implementation of [`PhotoQueueRepository`].
///
/// Holds the shared [`QueueEventBus`] and emits a [`QueueEvent`] on every
/// create/update/delete/transition, which is what drives UI refresh
/// without polling.
#[derive(Clone)]
pub struct SqlitePhotoRepository {
    pool: SqlitePool,
    events: QueueEventBus,
}

impl SqlitePhotoRepository {
    /// Create a new repository over the given pool and event bus.
    pub fn new(pool: SqlitePool, events: QueueEventBus) -> Self {
        Self { pool, events }
    }

    /// Get the event bus used for change notifications.
    pub fn events(&self) -> &QueueEventBus {
        &self.events
    }

    /// Convert SyncStatus to its database representation.
    fn status_to_str(status: SyncStatus) -> &'static str {
        match status {
            SyncStatus::Pending => "pending",
            SyncStatus::Uploading => "uploading",
            SyncStatus::Completed => "completed",
            SyncStatus::Failed => "failed",
        }
    }

    /// Convert a database string to SyncStatus.
    fn str_to_status(s: &str) -> SyncStatus {
        match s {
            "pending" => SyncStatus::Pending,
            "uploading" => SyncStatus::Uploading,
            "completed" => SyncStatus::Completed,
            "failed" => SyncStatus::Failed,
            _ => SyncStatus::Pending, // fallback
        }
    }

    /// Convert PhotoCategory to its database representation.
    fn category_to_str(category: PhotoCategory) -> &'static str {
        match category {
            PhotoCategory::Progress => "progress",
            PhotoCategory::Issue => "issue",
            PhotoCategory::Before => "before",
            PhotoCategory::After => "after",
            PhotoCategory::Inspection => "inspection",
            PhotoCategory::Safety => "safety",
            PhotoCategory::Material => "material",
        }
    }

    /// Convert a database string to PhotoCategory.
    fn str_to_category(s: &str) -> PhotoCategory {
        match s {
            "progress" => PhotoCategory::Progress,
            "issue" => PhotoCategory::Issue,
            "before" => PhotoCategory::Before,
            "after" => PhotoCategory::After,
            "inspection" => PhotoCategory::Inspection,
            "safety" => PhotoCategory::Safety,
            "material" => PhotoCategory::Material,
            _ => PhotoCategory::Progress, // fallback
        }
    }

    fn parse_uuid(s: &str) -> Result<Uuid> {
        Uuid::parse_str(s).map_err(|e| Error::Serialization(format!("invalid uuid {s:?}: {e}")))
    }

    fn parse_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
        s.as_deref().map(Self::parse_uuid).transpose()
    }

    /// Parse a photo row into a PendingPhoto struct.
    fn parse_photo_row(row: SqliteRow) -> Result<PendingPhoto> {
        let location = match (row.get::<Option<f64>, _>("lat"), row.get::<Option<f64>, _>("lng")) {
            (Some(lat), Some(lng)) => Some(GeoPoint {
                lat,
                lng,
                address: row.get("address"),
            }),
            _ => None,
        };

        Ok(PendingPhoto {
            local_id: Self::parse_uuid(&row.get::<String, _>("local_id"))?,
            project_id: Self::parse_uuid(&row.get::<String, _>("project_id"))?,
            org_id: Self::parse_uuid(&row.get::<String, _>("org_id"))?,
            user_id: Self::parse_uuid(&row.get::<String, _>("user_id"))?,
            user_name: row.get("user_name"),
            blob: row.get("blob"),
            thumbnail: row.get("thumbnail"),
            filename: row.get("filename"),
            caption: row.get("caption"),
            category: Self::str_to_category(&row.get::<String, _>("category")),
            taken_at: row.get("taken_at"),
            location,
            phase_id: Self::parse_opt_uuid(row.get("phase_id"))?,
            album_id: Self::parse_opt_uuid(row.get("album_id"))?,
            task_id: Self::parse_opt_uuid(row.get("task_id"))?,
            sync_status: Self::str_to_status(&row.get::<String, _>("sync_status")),
            error_message: row.get("error_message"),
            content_hash: row.get("content_hash"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    /// Current status of a record, or None when it does not exist.
    async fn status_of(&self, local_id: Uuid) -> Result<Option<SyncStatus>> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT sync_status FROM pending_photo WHERE local_id = ?1")
                .bind(local_id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Storage)?;
        Ok(status.as_deref().map(Self::str_to_status))
    }

    /// Map a failed guarded transition to the right error for the caller.
    async fn guard_error(&self, local_id: Uuid, action: &str) -> Error {
        match self.status_of(local_id).await {
            Ok(Some(status)) => Error::InvalidState(format!(
                "cannot {action} photo {local_id} while {}",
                Self::status_to_str(status)
            )),
            Ok(None) => Error::PhotoNotFound(local_id),
            Err(e) => e,
        }
    }

    async fn fetch_pending(&self, project_id: Option<Uuid>) -> Result<Vec<PendingPhoto>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT * FROM pending_photo \
             WHERE sync_status IN ('pending', 'uploading', 'failed')",
        );
        if let Some(project_id) = project_id {
            qb.push(" AND project_id = ");
            qb.push_bind(project_id.to_string());
        }
        qb.push(" ORDER BY created_at ASC, local_id ASC");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Storage)?;

        rows.into_iter().map(Self::parse_photo_row).collect()
    }

    async fn fetch_counts(&self, project_id: Option<Uuid>) -> Result<QueueCounts> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT sync_status, COUNT(*) AS n FROM pending_photo \
             WHERE sync_status IN ('pending', 'uploading', 'failed')",
        );
        if let Some(project_id) = project_id {
            qb.push(" AND project_id = ");
            qb.push_bind(project_id.to_string());
        }
        qb.push(" GROUP BY sync_status");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Storage)?;

        let mut counts = QueueCounts::default();
        for row in rows {
            let n: i64 = row.get("n");
            match Self::str_to_status(&row.get::<String, _>("sync_status")) {
                SyncStatus::Pending => counts.pending = n,
                SyncStatus::Uploading => counts.uploading = n,
                SyncStatus::Failed => counts.failed = n,
                SyncStatus::Completed => {}
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl PhotoQueueRepository for SqlitePhotoRepository {
    async fn queue_photo(&self, request: QueuePhotoRequest) -> Result<Uuid> {
        if request.blob.is_empty() {
            return Err(Error::Validation("photo blob must not be empty".into()));
        }
        if request.thumbnail.is_empty() {
            return Err(Error::Validation("thumbnail must not be empty".into()));
        }
        if request.filename.trim().is_empty() {
            return Err(Error::Validation("filename must not be empty".into()));
        }
        if request.content_hash.is_empty() {
            return Err(Error::Validation("content hash must not be empty".into()));
        }

        let local_id = new_v7();
        let now = Utc::now();
        let blob_bytes = request.blob.len();

        // Atomic check-and-insert: re-ingesting the same capture event
        // (same fingerprint, same project, record still live) returns the
        // existing id instead of creating a duplicate.
        let result = sqlx::query(
            "INSERT INTO pending_photo (
                 local_id, project_id, org_id, user_id, user_name,
                 blob, thumbnail, filename, caption, category, taken_at,
                 lat, lng, address, phase_id, album_id, task_id,
                 sync_status, error_message, content_hash, created_at, updated_at
             )
             SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                    ?12, ?13, ?14, ?15, ?16, ?17, 'pending', NULL, ?18, ?19, ?19
             WHERE NOT EXISTS (
                 SELECT 1 FROM pending_photo
                 WHERE content_hash = ?18 AND project_id = ?2
                   AND sync_status != 'completed'
             )",
        )
        .bind(local_id.to_string())
        .bind(request.project_id.to_string())
        .bind(request.user.org_id.to_string())
        .bind(request.user.user_id.to_string())
        .bind(&request.user.user_name)
        .bind(&request.blob)
        .bind(&request.thumbnail)
        .bind(&request.filename)
        .bind(&request.caption)
        .bind(Self::category_to_str(request.category))
        .bind(request.taken_at)
        .bind(request.location.as_ref().map(|l| l.lat))
        .bind(request.location.as_ref().map(|l| l.lng))
        .bind(request.location.as_ref().and_then(|l| l.address.clone()))
        .bind(request.phase_id.map(|id| id.to_string()))
        .bind(request.album_id.map(|id| id.to_string()))
        .bind(request.task_id.map(|id| id.to_string()))
        .bind(&request.content_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Storage)?;

        if result.rows_affected() == 0 {
            let existing: Option<String> = sqlx::query_scalar(
                "SELECT local_id FROM pending_photo
                 WHERE content_hash = ?1 AND project_id = ?2
                   AND sync_status != 'completed'
                 LIMIT 1",
            )
            .bind(&request.content_hash)
            .bind(request.project_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Storage)?;

            if let Some(existing) = existing {
                let existing = Self::parse_uuid(&existing)?;
                debug!(
                    subsystem = "store",
                    component = "photos",
                    op = "queue_photo",
                    photo_id = %existing,
                    "Duplicate capture event, returning existing entry"
                );
                return Ok(existing);
            }
            // The live duplicate vanished between the two statements
            // (user delete); treat this call as a fresh capture.
            return Err(Error::Internal(format!(
                "deduplicated insert for capture {} found no surviving record",
                request.content_hash
            )));
        }

        info!(
            subsystem = "store",
            component = "photos",
            op = "queue_photo",
            photo_id = %local_id,
            project_id = %request.project_id,
            blob_bytes,
            "Photo queued for upload"
        );
        self.events.emit(QueueEvent::PhotoQueued {
            local_id,
            project_id: request.project_id,
        });
        Ok(local_id)
    }

    async fn get_photo(&self, local_id: Uuid) -> Result<PendingPhoto> {
        let row = sqlx::query("SELECT * FROM pending_photo WHERE local_id = ?1")
            .bind(local_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Storage)?;

        match row {
            Some(row) => Self::parse_photo_row(row),
            None => Err(Error::PhotoNotFound(local_id)),
        }
    }

    async fn get_pending_photos(&self) -> Result<Vec<PendingPhoto>> {
        self.fetch_pending(None).await
    }

    async fn get_pending_photos_for_project(&self, project_id: Uuid) -> Result<Vec<PendingPhoto>> {
        self.fetch_pending(Some(project_id)).await
    }

    async fn update_photo(&self, local_id: Uuid, edit: PhotoEdit) -> Result<()> {
        if edit.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE pending_photo SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(caption) = &edit.caption {
            qb.push(", caption = ");
            qb.push_bind(caption.clone());
        }
        if let Some(category) = edit.category {
            qb.push(", category = ");
            qb.push_bind(Self::category_to_str(category));
        }
        if let Some(filename) = &edit.filename {
            qb.push(", filename = ");
            qb.push_bind(filename.clone());
        }
        if let Some(phase_id) = &edit.phase_id {
            qb.push(", phase_id = ");
            qb.push_bind(phase_id.map(|id| id.to_string()));
        }
        if let Some(album_id) = &edit.album_id {
            qb.push(", album_id = ");
            qb.push_bind(album_id.map(|id| id.to_string()));
        }
        if let Some(task_id) = &edit.task_id {
            qb.push(", task_id = ");
            qb.push_bind(task_id.map(|id| id.to_string()));
        }
        qb.push(" WHERE local_id = ");
        qb.push_bind(local_id.to_string());
        // Edits race the in-flight upload read, so uploading is off-limits.
        qb.push(" AND sync_status IN ('pending', 'failed')");

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(Error::Storage)?;

        if result.rows_affected() == 0 {
            return Err(self.guard_error(local_id, "edit").await);
        }

        self.events.emit(QueueEvent::PhotoUpdated { local_id });
        Ok(())
    }

    async fn delete_photo(&self, local_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM pending_photo WHERE local_id = ?1 AND sync_status != 'uploading'",
        )
        .bind(local_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(Error::Storage)?;

        if result.rows_affected() == 0 {
            return Err(self.guard_error(local_id, "delete").await);
        }

        info!(
            subsystem = "store",
            component = "photos",
            op = "delete_photo",
            photo_id = %local_id,
            "Photo deleted from queue"
        );
        self.events.emit(QueueEvent::PhotoDeleted { local_id });
        Ok(())
    }

    async fn claim_for_upload(&self, local_id: Uuid) -> Result<PendingPhoto> {
        let result = sqlx::query(
            "UPDATE pending_photo
             SET sync_status = 'uploading', error_message = NULL, updated_at = ?1
             WHERE local_id = ?2 AND sync_status IN ('pending', 'failed')",
        )
        .bind(Utc::now())
        .bind(local_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(Error::Storage)?;

        if result.rows_affected() == 0 {
            return Err(self.guard_error(local_id, "upload").await);
        }

        self.events.emit(QueueEvent::StatusChanged {
            local_id,
            status: SyncStatus::Uploading,
            error_message: None,
        });
        self.get_photo(local_id).await
    }

    async fn mark_completed(&self, local_id: Uuid) -> Result<()> {
        // Ownership of the image has transferred to the remote store;
        // drop the local blob to reclaim device storage.
        let result = sqlx::query(
            "UPDATE pending_photo
             SET sync_status = 'completed', blob = ?1, updated_at = ?2
             WHERE local_id = ?3 AND sync_status = 'uploading'",
        )
        .bind(Vec::<u8>::new())
        .bind(Utc::now())
        .bind(local_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(Error::Storage)?;

        if result.rows_affected() == 0 {
            return Err(self.guard_error(local_id, "complete").await);
        }

        self.events.emit(QueueEvent::StatusChanged {
            local_id,
            status: SyncStatus::Completed,
            error_message: None,
        });
        Ok(())
    }

    async fn mark_failed(&self, local_id: Uuid, error_message: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE pending_photo
             SET sync_status = 'failed', error_message = ?1, updated_at = ?2
             WHERE local_id = ?3 AND sync_status = 'uploading'",
        )
        .bind(error_message)
        .bind(Utc::now())
        .bind(local_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(Error::Storage)?;

        if result.rows_affected() == 0 {
            return Err(self.guard_error(local_id, "fail").await);
        }

        warn!(
            subsystem = "store",
            component = "photos",
            op = "mark_failed",
            photo_id = %local_id,
            error = error_message,
            "Photo upload recorded as failed"
        );
        self.events.emit(QueueEvent::StatusChanged {
            local_id,
            status: SyncStatus::Failed,
            error_message: Some(error_message.to_string()),
        });
        Ok(())
    }

    async fn counts(&self) -> Result<QueueCounts> {
        self.fetch_counts(None).await
    }

    async fn counts_for_project(&self, project_id: Uuid) -> Result<QueueCounts> {
        self.fetch_counts(Some(project_id)).await
    }

    async fn purge_completed(&self) -> Result<u64> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT local_id FROM pending_photo WHERE sync_status = 'completed'")
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Storage)?;

        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM pending_photo WHERE sync_status = 'completed'")
            .execute(&self.pool)
            .await
            .map_err(Error::Storage)?;

        for id in &ids {
            self.events.emit(QueueEvent::PhotoDeleted {
                local_id: Self::parse_uuid(id)?,
            });
        }

        debug!(
            subsystem = "store",
            component = "photos",
            op = "purge_completed",
            purged = result.rows_affected(),
            "Completed records purged"
        );
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            SyncStatus::Pending,
            SyncStatus::Uploading,
            SyncStatus::Completed,
            SyncStatus::Failed,
        ] {
            let s = SqlitePhotoRepository::status_to_str(status);
            assert_eq!(SqlitePhotoRepository::str_to_status(s), status);
        }
    }

    #[test]
    fn test_str_to_status_unknown_falls_back_to_pending() {
        assert_eq!(
            SqlitePhotoRepository::str_to_status("archived"),
            SyncStatus::Pending
        );
    }

    #[test]
    fn test_category_round_trip() {
        for category in [
            PhotoCategory::Progress,
            PhotoCategory::Issue,
            PhotoCategory::Before,
            PhotoCategory::After,
            PhotoCategory::Inspection,
            PhotoCategory::Safety,
            PhotoCategory::Material,
        ] {
            let s = SqlitePhotoRepository::category_to_str(category);
            assert_eq!(SqlitePhotoRepository::str_to_category(s), category);
        }
    }

    #[test]
    fn test_parse_uuid_rejects_garbage() {
        let err = SqlitePhotoRepository::parse_uuid("not-a-uuid").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}

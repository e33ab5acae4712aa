//! # fieldsync-store
//!
//! SQLite persistence layer for the fieldsync photo queue.
//!
//! This crate provides:
//! - Connection pool management over a client-resident SQLite file
//! - The [`SqlitePhotoRepository`] implementing the store seam from
//!   `fieldsync-core`
//! - Change notification through the shared queue event bus
//!
//! ## Example
//!
//! ```rust,ignore
//! use fieldsync_store::Store;
//!
//! let store = Store::connect("fieldsync.db").await?;
//! let local_id = store.photos.queue_photo(request).await?;
//! ```

pub mod photos;
pub mod pool;

// Test fixtures are always compiled so integration tests (in tests/) and
// downstream crates' tests can build realistic queue requests.
pub mod test_fixtures;

// Re-export core types
pub use fieldsync_core::*;

pub use photos::SqlitePhotoRepository;
pub use pool::{create_memory_pool, create_pool, create_pool_with_config, PoolConfig};

use std::path::Path;

use sqlx::SqlitePool;

/// Combined local photo store: pool, repository, and event bus.
///
/// Constructed once per application session and handed to the sync and
/// UI layers by reference; tests instantiate isolated in-memory copies.
#[derive(Clone)]
pub struct Store {
    /// The underlying connection pool.
    pub pool: SqlitePool,
    /// Photo queue repository for CRUD and status transitions.
    pub photos: SqlitePhotoRepository,
    /// Change-notification bus shared by every consumer of this store.
    pub events: QueueEventBus,
}

impl Store {
    /// Create a new Store instance from an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        let events = QueueEventBus::default();
        Self {
            photos: SqlitePhotoRepository::new(pool.clone(), events.clone()),
            events,
            pool,
        }
    }

    /// Open (creating if needed) the photo store database at `path` and
    /// ensure the schema exists.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let pool = create_pool(path).await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Open with custom pool configuration.
    pub async fn connect_with_config(path: impl AsRef<Path>, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(path, config).await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Open an ephemeral in-memory store (tests, preview sessions).
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = create_memory_pool().await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create the `pending_photo` table and indexes if absent.
    ///
    /// Idempotent; runs on every connect so a fresh device profile is
    /// usable without a separate migration step.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS pending_photo (
                 local_id      TEXT PRIMARY KEY,
                 project_id    TEXT NOT NULL,
                 org_id        TEXT NOT NULL,
                 user_id       TEXT NOT NULL,
                 user_name     TEXT NOT NULL,
                 blob          BLOB NOT NULL,
                 thumbnail     BLOB NOT NULL,
                 filename      TEXT NOT NULL,
                 caption       TEXT,
                 category      TEXT NOT NULL DEFAULT 'progress',
                 taken_at      TEXT NOT NULL,
                 lat           REAL,
                 lng           REAL,
                 address       TEXT,
                 phase_id      TEXT,
                 album_id      TEXT,
                 task_id       TEXT,
                 sync_status   TEXT NOT NULL DEFAULT 'pending',
                 error_message TEXT,
                 content_hash  TEXT NOT NULL,
                 created_at    TEXT NOT NULL,
                 updated_at    TEXT NOT NULL
             )",
        )
        .execute(&self.pool)
        .await
        .map_err(Error::Storage)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_pending_photo_status
             ON pending_photo (sync_status, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(Error::Storage)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_pending_photo_project
             ON pending_photo (project_id, sync_status)",
        )
        .execute(&self.pool)
        .await
        .map_err(Error::Storage)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_pending_photo_hash
             ON pending_photo (content_hash, project_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(Error::Storage)?;

        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

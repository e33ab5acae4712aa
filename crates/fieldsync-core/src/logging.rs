//! Structured logging schema and field name constants for fieldsync.
//!
//! All crates use these constants for consistent structured logging
//! fields, so log queries work the same across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Local storage failures, lost writes |
//! | WARN  | Upload failures, guard rejections, recoverable issues |
//! | INFO  | Lifecycle events (batch start/finish, queue/delete) |
//! | DEBUG | Decision points, event emission, config choices |
//! | TRACE | Per-item iteration detail |

use tracing_subscriber::{fmt, EnvFilter};

/// Subsystem originating the log event.
/// Values: "store", "sync", "ingest", "network"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "photos", "executor", "autosync", "remote"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "queue_photo", "claim_for_upload", "process_upload_queue"
pub const OPERATION: &str = "op";

/// Queue entry UUID being operated on.
pub const PHOTO_ID: &str = "photo_id";

/// Project scope of the operation.
pub const PROJECT_ID: &str = "project_id";

/// Sync status involved in a transition.
pub const SYNC_STATUS: &str = "sync_status";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Blob size in bytes for queue/upload operations.
pub const BLOB_BYTES: &str = "blob_bytes";

/// Number of items in a batch snapshot.
pub const BATCH_TOTAL: &str = "batch_total";

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Initialize tracing for binaries and integration tests.
///
/// Honors `RUST_LOG`; defaults to `info` for fieldsync crates. Safe to
/// call more than once (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fieldsync_store=info,fieldsync_sync=info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

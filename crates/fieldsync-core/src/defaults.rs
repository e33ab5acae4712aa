//! Centralized default constants for the fieldsync subsystem.
//!
//! Single source of truth for shared default values; crates reference
//! these instead of defining their own magic numbers.

// =============================================================================
// SYNC EXECUTOR
// =============================================================================

/// Per-item upload timeout in seconds. A hung transfer resolves to
/// `failed` instead of blocking the sequential queue.
pub const UPLOAD_TIMEOUT_SECS: u64 = 120;

/// Settle delay after an offline→online transition before auto-sync
/// starts, so a connection that flaps straight back offline does not
/// trigger a doomed batch.
pub const AUTO_SYNC_SETTLE_MS: u64 = 2_000;

// =============================================================================
// EVENTS
// =============================================================================

/// Broadcast buffer capacity for the queue event bus.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// INGEST
// =============================================================================

/// Maximum thumbnail edge length in pixels.
pub const THUMBNAIL_MAX_DIM: u32 = 320;

/// JPEG quality for generated thumbnails.
pub const THUMBNAIL_JPEG_QUALITY: u8 = 80;

/// How long ingest waits for a geolocation fix before giving up.
/// Location is best-effort and must not hold up capture.
pub const GEOLOCATION_TIMEOUT_MS: u64 = 3_000;

// =============================================================================
// STORAGE
// =============================================================================

/// Default maximum number of SQLite connections in the pool.
pub const STORE_MAX_CONNECTIONS: u32 = 4;

/// SQLite busy timeout in milliseconds (single-writer contention).
pub const STORE_BUSY_TIMEOUT_MS: u64 = 5_000;

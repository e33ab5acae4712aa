//! # fieldsync-sync
//!
//! Synchronization layer for the fieldsync photo queue.
//!
//! This crate provides:
//! - The sync executor draining the queue against the remote store
//! - Connectivity monitoring and the auto-sync trigger
//! - The UI-facing upload queue manager
//! - The capture/ingest surface
//! - An HTTP implementation of the remote store collaborator
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fieldsync_store::Store;
//! use fieldsync_sync::{
//!     AutoSync, HttpRemoteStore, NetworkMonitor, RemoteConfig, SyncConfig, SyncExecutor,
//!     UploadQueueManager,
//! };
//!
//! let store = Store::connect("fieldsync.db").await?;
//! let remote = Arc::new(HttpRemoteStore::new(RemoteConfig::from_env()?)?);
//! let executor = Arc::new(SyncExecutor::new(store.clone(), remote, SyncConfig::from_env()));
//!
//! let monitor = NetworkMonitor::default();
//! let autosync = AutoSync::new(monitor.clone(), executor.clone()).start();
//!
//! let queue = UploadQueueManager::new(store, executor);
//! let summary = queue.sync_now(|p| println!("{}/{}", p.current, p.total)).await?;
//!
//! autosync.shutdown().await?;
//! ```

pub mod autosync;
pub mod executor;
pub mod ingest;
pub mod network;
pub mod queue;
pub mod remote;

// Re-export core types
pub use fieldsync_core::*;

pub use autosync::{AutoSync, AutoSyncHandle};
pub use executor::{SyncConfig, SyncExecutor};
pub use ingest::{capture_fingerprint, generate_thumbnail, CaptureRequest, PhotoIngest};
pub use network::NetworkMonitor;
pub use queue::UploadQueueManager;
pub use remote::{HttpRemoteStore, RemoteConfig};

//! # fieldsync-core
//!
//! Core types, traits, and abstractions for the fieldsync offline photo
//! queue.
//!
//! This crate provides the foundational data structures and trait
//! definitions the store and sync crates depend on: the
//! [`PendingPhoto`] data model and its [`SyncStatus`] state machine, the
//! error taxonomy, the queue event bus, and the collaborator seams
//! (remote store, identity, geolocation).

pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{QueueEvent, QueueEventBus, QueueEventEnvelope};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{is_v7, new_v7};

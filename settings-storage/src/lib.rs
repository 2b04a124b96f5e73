//! Storage scopes consumed by the settings cache.
//!
//! Two independent scopes exist: a read-only managed scope carrying
//! administrator policy, which may legitimately be missing, and a
//! read-write sync scope carrying the user's own settings. Both are
//! asynchronous key/value services; the cache never looks past these traits.

#![warn(missing_docs, clippy::pedantic)]

pub mod area;
pub mod error;
pub mod file;
pub mod memory;

pub use area::{ManagedArea, Storage, SyncArea, select};
pub use error::{StorageError, StorageResult};
pub use file::{FileArea, FileRole};
pub use memory::MemoryArea;

//! Persistent local stores for the StoryReel compositor.
//!
//! This crate provides:
//! - A SQLite-backed media cache keyed by source URL (cache-aside reads)
//! - The video history store keyed by process-unique ids, with transparent
//!   on-read migration of the legacy integer-keyed record shape
//! - Versioned schema migrations run on open
//!
//! Store handles are constructed explicitly and shared by the caller
//! (usually behind an `Arc`); there are no global singletons.

pub mod error;
pub mod history;
pub mod manager;
pub mod media_cache;
mod migrations;

pub use error::{StoreError, StoreResult};
pub use history::HistoryRecord;
pub use manager::Database;
pub use media_cache::CacheRecord;

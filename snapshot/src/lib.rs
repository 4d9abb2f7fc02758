//! # Snapshot
//!
//! Per-path content snapshots. Each call to [`SnapshotStore::update`]
//! captures the current bytes of a file and hands back the previous capture
//! alongside it, ready to be diffed.

pub mod error;
pub mod store;

pub use error::{Result, SnapshotError};
pub use store::{Snapshot, SnapshotStore};

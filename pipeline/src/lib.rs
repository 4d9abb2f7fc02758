//! # Pipeline
//!
//! Connects the pieces: debounced [`WatchEvent`]s from the directory
//! watcher are turned into fresh snapshots and diffed against the previous
//! snapshot of the same path.
//!
//! ```text
//! DirectoryWatcher ──► WatchEvent ──► ChangeProcessor ──► ChangeOutcome
//!                                       │        │
//!                                       ▼        ▼
//!                              SnapshotStore   DiffEngine
//! ```
//!
//! [`WatchEvent`]: diffwatch_directory_watcher::WatchEvent

pub mod config;
pub mod error;
pub mod processor;

pub use config::{DEFAULT_MAX_DIFF_BYTES, PipelineConfig};
pub use error::{PipelineError, Result};
pub use processor::{ChangeOutcome, ChangeProcessor};

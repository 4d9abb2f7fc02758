//! Error types for change processing.

use std::path::PathBuf;

use diffwatch_snapshot::SnapshotError;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while turning an event into a diff.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Looking up the changed path failed.
    #[error("reading metadata for {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Capturing the new snapshot failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

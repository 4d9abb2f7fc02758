//! Error types for snapshot capture.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for snapshot operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Errors that can occur while capturing a snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The file exists but could not be read.
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SnapshotError {
    /// The path that failed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. } => path,
        }
    }
}

//! Error types for the directory watcher.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Errors that can occur in the directory watcher.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Watch root does not exist.
    #[error("path not found: {0}")]
    DirectoryNotFound(String),

    /// Watch root could not be made absolute.
    #[error("resolving path {path}: {source}")]
    ResolvePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The watcher was constructed outside a tokio runtime.
    #[error("directory watcher requires a tokio runtime")]
    NoRuntime,

    /// The OS refused a subscription.
    #[error("adding {path} to watcher: {source}")]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Walking a subtree failed part way.
    #[error("walking {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Notify backend error.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatcherError {
    /// Whether this error was caused by missing permissions.
    ///
    /// Permission failures while walking or subscribing a subtree are
    /// skipped silently rather than surfaced.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Subscribe { source, .. } | Self::Notify(source) => {
                notify_permission_denied(source)
            }
            Self::Walk { source, .. } => source
                .io_error()
                .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied),
            Self::ResolvePath { source, .. } | Self::Io(source) => {
                source.kind() == std::io::ErrorKind::PermissionDenied
            }
            Self::DirectoryNotFound(_) | Self::NoRuntime => false,
        }
    }
}

pub(crate) fn notify_permission_denied(err: &notify::Error) -> bool {
    match &err.kind {
        notify::ErrorKind::Io(io) => io.kind() == std::io::ErrorKind::PermissionDenied,
        _ => false,
    }
}

//! Normalized change events emitted by the watcher.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use notify::event::{AccessKind, AccessMode, ModifyKind};
use serde::{Deserialize, Serialize};

/// A debounced file system change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEvent {
    /// Path to the affected file or directory.
    pub path: PathBuf,

    /// The kind of change.
    pub op: WatchOp,

    /// When the raw notification was received.
    pub timestamp: DateTime<Utc>,
}

impl WatchEvent {
    /// Create a new event stamped with the current time.
    pub fn new(op: WatchOp, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            op,
            timestamp: Utc::now(),
        }
    }
}

/// Kind of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchOp {
    /// Path was created.
    Create,

    /// File contents were written.
    Write,

    /// Path was removed.
    Remove,

    /// Path was renamed (either side of the rename).
    Rename,

    /// Permissions or other metadata changed.
    Chmod,

    /// Backend reported something we could not classify.
    Unknown,
}

impl WatchOp {
    /// Normalize a raw notify event kind.
    ///
    /// Returns `None` for read-only access notifications, which are not
    /// changes. A close after writing is reported as [`WatchOp::Write`].
    pub fn from_kind(kind: notify::EventKind) -> Option<Self> {
        let op = match kind {
            notify::EventKind::Create(_) => Self::Create,
            notify::EventKind::Modify(modify_kind) => match modify_kind {
                ModifyKind::Name(_) => Self::Rename,
                ModifyKind::Metadata(_) => Self::Chmod,
                ModifyKind::Data(_) | ModifyKind::Any => Self::Write,
                ModifyKind::Other => Self::Unknown,
            },
            notify::EventKind::Remove(_) => Self::Remove,
            notify::EventKind::Access(AccessKind::Close(AccessMode::Write)) => Self::Write,
            notify::EventKind::Access(_) => return None,
            notify::EventKind::Any | notify::EventKind::Other => Self::Unknown,
        };
        Some(op)
    }

    /// Lowercase name of the operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Write => "write",
            Self::Remove => "remove",
            Self::Rename => "rename",
            Self::Chmod => "chmod",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for WatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

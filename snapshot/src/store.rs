//! Last-seen content per path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use crate::error::{Result, SnapshotError};

/// Content of a file at one point in time, or its absence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    path: PathBuf,

    /// `None` when the file did not exist.
    content: Option<Bytes>,
}

impl Snapshot {
    /// A snapshot of an existing file.
    pub fn present(path: impl Into<PathBuf>, content: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            content: Some(content.into()),
        }
    }

    /// A snapshot recording that the file did not exist.
    pub fn absent(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content: None,
        }
    }

    /// Path the snapshot was taken of.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file existed.
    pub fn exists(&self) -> bool {
        self.content.is_some()
    }

    /// File bytes; empty for an absent file.
    pub fn content(&self) -> &[u8] {
        self.content.as_deref().unwrap_or_default()
    }

    /// Shared handle to the bytes, if the file existed.
    pub fn bytes(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    /// Size of the content in bytes.
    pub fn len(&self) -> usize {
        self.content().len()
    }

    /// Whether the content is empty (or absent).
    pub fn is_empty(&self) -> bool {
        self.content().is_empty()
    }
}

/// Keeps the last snapshot taken of each path.
///
/// Entries are only ever replaced whole. The map lock is held for the swap,
/// never while reading the file.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: Mutex<HashMap<PathBuf, Snapshot>>,
}

impl SnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `path` and record it, returning the previous and new snapshot.
    ///
    /// A path never seen before yields an absent previous snapshot. A file
    /// that does not exist is recorded as absent rather than reported as an
    /// error. Any other read failure is returned and the store is left
    /// untouched.
    pub async fn update(&self, path: impl AsRef<Path>) -> Result<(Snapshot, Snapshot)> {
        let path = path.as_ref();

        let new = match fs::read(path).await {
            Ok(content) => Snapshot::present(path, content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::absent(path),
            Err(source) => {
                return Err(SnapshotError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let old = self
            .lock()
            .insert(path.to_path_buf(), new.clone())
            .unwrap_or_else(|| Snapshot::absent(path));

        debug!(
            "Updated snapshot for {} ({} -> {} bytes, exists: {})",
            path.display(),
            old.len(),
            new.len(),
            new.exists()
        );

        Ok((old, new))
    }

    /// The stored snapshot for `path`, if any.
    pub fn get(&self, path: &Path) -> Option<Snapshot> {
        self.lock().get(path).cloned()
    }

    /// Stop tracking `path`.
    pub fn remove(&self, path: &Path) -> Option<Snapshot> {
        self.lock().remove(path)
    }

    /// Stop tracking every path.
    pub fn clear(&self) {
        self.lock().clear();
        debug!("Cleared snapshot store");
    }

    /// Number of tracked paths.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no paths are tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Snapshot>> {
        self.snapshots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

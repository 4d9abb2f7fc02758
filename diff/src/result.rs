//! Structured diff output.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How a line differs between the two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Present on both sides.
    Unchanged,

    /// Only in the new snapshot.
    Added,

    /// Only in the old snapshot.
    Deleted,
}

/// One line of a structured diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: LineKind,

    /// 1-based line number in the old snapshot.
    pub old_line: Option<usize>,

    /// 1-based line number in the new snapshot.
    pub new_line: Option<usize>,

    /// Line text without its terminator.
    pub content: String,
}

impl DiffLine {
    pub fn unchanged(old_line: usize, new_line: usize, content: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Unchanged,
            old_line: Some(old_line),
            new_line: Some(new_line),
            content: content.into(),
        }
    }

    pub fn added(new_line: usize, content: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Added,
            old_line: None,
            new_line: Some(new_line),
            content: content.into(),
        }
    }

    pub fn deleted(old_line: usize, content: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Deleted,
            old_line: Some(old_line),
            new_line: None,
            content: content.into(),
        }
    }

    /// Whether the line was added or deleted.
    pub fn is_change(&self) -> bool {
        self.kind != LineKind::Unchanged
    }
}

/// Outcome of comparing two snapshots of one path.
///
/// `is_binary` results never carry lines. At most one of `is_new` and
/// `is_deleted` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Path the snapshots were taken of.
    pub path: PathBuf,

    /// Lines in document order.
    pub lines: Vec<DiffLine>,

    /// Whether anything changed.
    pub has_diff: bool,

    /// The file did not exist before.
    pub is_new: bool,

    /// The file no longer exists.
    pub is_deleted: bool,

    /// One side looked binary; no lines were produced.
    pub is_binary: bool,

    /// Conventional unified diff, or a one-line summary for
    /// binary/new/deleted files.
    pub unified: String,
}

impl DiffResult {
    pub(crate) fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Count lines by kind.
    pub fn stats(&self) -> DiffStats {
        self.lines
            .iter()
            .fold(DiffStats::default(), |mut stats, line| {
                match line.kind {
                    LineKind::Unchanged => stats.unchanged += 1,
                    LineKind::Added => stats.added += 1,
                    LineKind::Deleted => stats.deleted += 1,
                }
                stats
            })
    }
}

/// Per-kind line counts of a [`DiffResult`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub added: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

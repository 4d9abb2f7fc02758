//! # Diff
//!
//! Line-level comparison of two [`Snapshot`](diffwatch_snapshot::Snapshot)s.
//!
//! [`DiffEngine::compute`] classifies the change (new, deleted, binary or a
//! text edit) and produces both a structured, numbered line list for
//! rendering and a conventional unified diff for plain-text consumers.
//! Changed lines are reported as whole blocks; there is no word or
//! character level highlighting.

pub mod binary;
pub mod engine;
pub mod focus;
pub mod result;

pub use binary::is_binary_content;
pub use engine::{DEFAULT_CONTEXT_LINES, DiffEngine};
pub use focus::FocusWindow;
pub use result::{DiffLine, DiffResult, DiffStats, LineKind};

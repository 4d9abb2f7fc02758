//! Configuration for change processing.

use serde::{Deserialize, Serialize};

/// Files larger than this are reported instead of diffed.
pub const DEFAULT_MAX_DIFF_BYTES: u64 = 1024 * 1024;

/// Configuration for a [`ChangeProcessor`](crate::ChangeProcessor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Size cutoff applied before a file is read.
    #[serde(default = "default_max_diff_bytes")]
    pub max_diff_bytes: u64,

    /// Context lines around unified diff hunks.
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

impl PipelineConfig {
    /// Set the size cutoff.
    pub fn with_max_diff_bytes(mut self, bytes: u64) -> Self {
        self.max_diff_bytes = bytes;
        self
    }

    /// Set the unified diff context.
    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_diff_bytes: DEFAULT_MAX_DIFF_BYTES,
            context_lines: diffwatch_diff::DEFAULT_CONTEXT_LINES,
        }
    }
}

fn default_max_diff_bytes() -> u64 {
    DEFAULT_MAX_DIFF_BYTES
}

fn default_context_lines() -> usize {
    diffwatch_diff::DEFAULT_CONTEXT_LINES
}

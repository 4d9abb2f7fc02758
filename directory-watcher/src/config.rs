//! Configuration types for directory watching.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Directory basenames never descended into when watching recursively.
///
/// Matching is exact and case-sensitive.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    // Version control
    ".git",
    // Dependency caches
    "node_modules",
    ".cache",
    ".npm",
    ".cargo",
    ".rustup",
    "__pycache__",
    ".pytest_cache",
    ".venv",
    "venv",
    ".tox",
    // Build artifacts
    "dist",
    "build",
    "target",
    ".next",
    ".nuxt",
    "vendor",
    ".gradle",
    ".m2",
    // IDE/Editor
    ".idea",
    ".vscode",
];

/// Default quiet period before a change is emitted.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Default capacity of the outgoing event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Default capacity of the outgoing error channel.
pub const DEFAULT_ERROR_CAPACITY: usize = 10;

/// Configuration for a watched directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Path to watch.
    pub path: PathBuf,

    /// Whether subdirectories are subscribed as well.
    pub recursive: bool,

    /// Debounce delay in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Capacity of the event channel; sends beyond it are dropped.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Capacity of the error channel; sends beyond it are dropped.
    #[serde(default = "default_error_capacity")]
    pub error_capacity: usize,

    /// Directory basenames skipped during recursive subscription.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

impl WatchConfig {
    /// Create a new watch config with default values.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: false,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            error_capacity: DEFAULT_ERROR_CAPACITY,
            exclude_dirs: default_exclude_dirs(),
        }
    }

    /// Watch subdirectories too.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the debounce delay.
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Set the error channel capacity.
    pub fn with_error_capacity(mut self, capacity: usize) -> Self {
        self.error_capacity = capacity;
        self
    }

    /// Add a directory name to the exclusion list.
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.exclude_dirs.push(name.into());
        self
    }

    /// The debounce delay as a [`Duration`].
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Check if a directory with this basename should be skipped.
    pub fn should_exclude(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|excluded| excluded == name)
    }
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

fn default_error_capacity() -> usize {
    DEFAULT_ERROR_CAPACITY
}

fn default_exclude_dirs() -> Vec<String> {
    DEFAULT_EXCLUDED_DIRS.iter().map(|s| (*s).to_string()).collect()
}

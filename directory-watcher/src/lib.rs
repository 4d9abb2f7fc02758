//! # Directory Watcher
//!
//! Turns raw file system notifications into a debounced stream of
//! normalized change events.
//!
//! ## Features
//!
//! - **Recursive Subscription**: Subdirectories are subscribed one by one,
//!   including ones created while watching
//! - **Exclusions**: Build output, VCS and dependency caches are never entered
//! - **Debouncing**: Rapid changes to one path collapse into a single event
//! - **Lossy Backpressure**: Full channels drop events instead of blocking
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Directory Watcher                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  notify ──► event loop ──► Debouncer ──► WatchEvent channel     │
//! │                 │                                               │
//! │                 ▼                                               │
//! │         subtree walks ──► WatchedDirs      errors ──► channel   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod debounce;
pub mod error;
pub mod event;
pub mod watcher;

pub use config::{DEFAULT_EXCLUDED_DIRS, WatchConfig};
pub use debounce::Debouncer;
pub use error::{Result, WatcherError};
pub use event::{WatchEvent, WatchOp};
pub use watcher::{DirectoryWatcher, WatchChannels, WatchedDirs};

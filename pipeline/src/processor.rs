//! Event → snapshot → diff.

use std::path::PathBuf;
use std::sync::Arc;

use diffwatch_diff::{DiffEngine, DiffResult};
use diffwatch_directory_watcher::{WatchEvent, WatchOp};
use diffwatch_snapshot::SnapshotStore;
use tokio::fs;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

/// What processing one event produced.
#[derive(Debug, Clone)]
pub enum ChangeOutcome {
    /// The file changed.
    Diff(DiffResult),

    /// The file was touched but its content is the same.
    Unchanged { path: PathBuf },

    /// The path is a directory; nothing to diff.
    Directory { path: PathBuf },

    /// The file is over the size cutoff and was not read.
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    /// Processing failed.
    Failed {
        path: PathBuf,
        error: Arc<PipelineError>,
    },
}

impl ChangeOutcome {
    /// The path the outcome is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Diff(result) => &result.path,
            Self::Unchanged { path }
            | Self::Directory { path }
            | Self::TooLarge { path, .. }
            | Self::Failed { path, .. } => path,
        }
    }
}

/// Keeps snapshots of changed files and diffs each change against the last.
#[derive(Debug, Default)]
pub struct ChangeProcessor {
    store: SnapshotStore,
    engine: DiffEngine,
    config: PipelineConfig,
}

impl ChangeProcessor {
    /// Create a processor with its own empty snapshot store.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            store: SnapshotStore::new(),
            engine: DiffEngine::new().with_context_lines(config.context_lines),
            config,
        }
    }

    /// The snapshots seen so far.
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Handle one event.
    ///
    /// Removals go straight to the store. Anything else is checked first:
    /// directories are skipped and files over the cutoff are reported
    /// without being read. A path that has vanished in the meantime is
    /// treated as removed.
    pub async fn process(&self, event: &WatchEvent) -> Result<ChangeOutcome> {
        let path = &event.path;

        if event.op != WatchOp::Remove {
            match fs::metadata(path).await {
                Ok(meta) if meta.is_dir() => {
                    return Ok(ChangeOutcome::Directory { path: path.clone() });
                }
                Ok(meta) if meta.len() > self.config.max_diff_bytes => {
                    debug!(
                        "Skipping diff for {}: {} bytes exceeds {}",
                        path.display(),
                        meta.len(),
                        self.config.max_diff_bytes
                    );
                    return Ok(ChangeOutcome::TooLarge {
                        path: path.clone(),
                        size: meta.len(),
                        limit: self.config.max_diff_bytes,
                    });
                }
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(PipelineError::Metadata {
                        path: path.clone(),
                        source,
                    });
                }
            }
        }

        let (old, new) = self.store.update(path).await?;
        let result = self.engine.compute(&old, &new);

        if result.has_diff {
            Ok(ChangeOutcome::Diff(result))
        } else {
            Ok(ChangeOutcome::Unchanged { path: path.clone() })
        }
    }

    /// Process events until the event stream ends or nobody is listening
    /// for outcomes.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<WatchEvent>,
        outcomes: mpsc::Sender<ChangeOutcome>,
    ) {
        while let Some(event) = events.recv().await {
            debug!("Processing {} on {}", event.op, event.path.display());

            let outcome = match self.process(&event).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!("Failed to process change: {err}");
                    ChangeOutcome::Failed {
                        path: event.path,
                        error: Arc::new(err),
                    }
                }
            };

            if outcomes.send(outcome).await.is_err() {
                debug!("Outcome receiver dropped");
                break;
            }
        }

        info!("Change processor stopped");
    }
}

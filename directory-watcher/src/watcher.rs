//! Directory watcher implementation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

use crate::config::WatchConfig;
use crate::debounce::Debouncer;
use crate::error::{Result, WatcherError};
use crate::event::{WatchEvent, WatchOp};

/// Receiving ends of a [`DirectoryWatcher`].
///
/// Both channels are bounded and lossy: when full, further events or errors
/// are dropped rather than stalling the watcher. They report `None` once the
/// watcher is closed and drained.
#[derive(Debug)]
pub struct WatchChannels {
    /// Debounced change events.
    pub events: mpsc::Receiver<WatchEvent>,

    /// Errors raised after construction.
    pub errors: mpsc::Receiver<WatcherError>,
}

/// Set of directories currently subscribed with the OS.
///
/// Entries for removed or renamed directories are dropped so the same path
/// can be subscribed again if it reappears.
#[derive(Debug, Default)]
pub struct WatchedDirs {
    dirs: Mutex<HashSet<PathBuf>>,
}

impl WatchedDirs {
    /// Record `path`. Returns `false` if it was already present.
    pub fn insert(&self, path: &Path) -> bool {
        self.lock().insert(path.to_path_buf())
    }

    /// Forget `path`.
    pub fn remove(&self, path: &Path) -> bool {
        self.lock().remove(path)
    }

    /// Forget `path` and every directory below it, returning what was removed.
    pub fn remove_tree(&self, path: &Path) -> Vec<PathBuf> {
        let mut dirs = self.lock();
        let removed: Vec<PathBuf> = dirs.iter().filter(|d| d.starts_with(path)).cloned().collect();
        for dir in &removed {
            dirs.remove(dir);
        }
        removed
    }

    /// Check whether `path` is subscribed.
    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains(path)
    }

    /// Number of subscribed directories.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sorted copy of the subscribed directories.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.lock().iter().cloned().collect();
        dirs.sort();
        dirs
    }

    fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.dirs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Outlets {
    events: mpsc::Sender<WatchEvent>,
    errors: mpsc::Sender<WatcherError>,
}

/// State shared between the handle, the event loop, subtree walks and
/// debounced callbacks.
struct Shared {
    config: WatchConfig,

    /// `None` once closed. Sends take the read side, close takes the write
    /// side, so nothing is sent after close.
    outlets: RwLock<Option<Outlets>>,

    /// OS watch handle. Dropping it ends the event loop.
    watcher: Mutex<Option<RecommendedWatcher>>,

    watched: WatchedDirs,

    dropped: AtomicU64,
}

impl Shared {
    fn is_closed(&self) -> bool {
        self.outlets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn send_event(&self, event: WatchEvent) {
        let outlets = self.outlets.read().unwrap_or_else(PoisonError::into_inner);
        let Some(outlets) = outlets.as_ref() else {
            return;
        };

        match outlets.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Event channel full, dropping {} event for {}",
                    event.op,
                    event.path.display()
                );
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }

    fn send_error(&self, err: WatcherError) {
        let outlets = self.outlets.read().unwrap_or_else(PoisonError::into_inner);
        let Some(outlets) = outlets.as_ref() else {
            return;
        };

        match outlets.errors.try_send(err) {
            Ok(()) => {}
            Err(TrySendError::Full(err)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("Error channel full, dropping: {err}");
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }

    fn subscribe(&self, path: &Path) -> Result<()> {
        let mut watcher = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
        match watcher.as_mut() {
            Some(w) => w
                .watch(path, RecursiveMode::NonRecursive)
                .map_err(|source| WatcherError::Subscribe {
                    path: path.to_path_buf(),
                    source,
                }),
            None => Ok(()),
        }
    }

    /// Drop the subscriptions for a directory that was removed or moved away.
    fn forget_tree(&self, path: &Path) {
        let removed = self.watched.remove_tree(path);
        if removed.is_empty() {
            return;
        }

        let mut watcher = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(w) = watcher.as_mut() {
            for dir in &removed {
                // Deleted directories have already lost their OS watch.
                if let Err(err) = w.unwatch(dir) {
                    trace!("Unwatch {} skipped: {err}", dir.display());
                }
            }
        }
        debug!("Forgot {} watched directories under {}", removed.len(), path.display());
    }

    fn is_excluded(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.config.should_exclude(name))
    }

    /// Subscribe `root` and every non-excluded directory below it.
    ///
    /// Directories another walk already claimed are skipped together with
    /// their children. Permission failures skip the affected subtree. Returns
    /// the number of newly subscribed directories.
    fn subscribe_tree(&self, root: &Path) -> Result<usize> {
        let mut added = 0;
        let mut entries = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                e.file_type().is_dir() && (e.depth() == 0 || !self.is_excluded(e.path()))
            });

        while let Some(entry) = entries.next() {
            if self.is_closed() {
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    let path = source.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                    let err = WatcherError::Walk { path, source };
                    if err.is_permission_denied() {
                        debug!("Skipping unreadable directory: {err}");
                        continue;
                    }
                    return Err(err);
                }
            };

            let path = entry.path();
            if !self.watched.insert(path) {
                if entry.depth() > 0 {
                    entries.skip_current_dir();
                }
                continue;
            }

            match self.subscribe(path) {
                Ok(()) => added += 1,
                Err(err) => {
                    self.watched.remove(path);
                    if !err.is_permission_denied() {
                        return Err(err);
                    }
                    debug!("Skipping directory without permission: {}", path.display());
                    entries.skip_current_dir();
                }
            }
        }

        Ok(added)
    }
}

/// Directory watcher that emits debounced, normalized change events.
///
/// Must be created inside a tokio runtime; the event loop, subtree walks and
/// debounce timers all run on it.
pub struct DirectoryWatcher {
    root: PathBuf,
    shared: Arc<Shared>,
    debouncer: Arc<Debouncer<PathBuf>>,
}

impl DirectoryWatcher {
    /// Start watching `path`, optionally with all of its subdirectories.
    pub fn new(path: impl AsRef<Path>, recursive: bool) -> Result<(Self, WatchChannels)> {
        Self::with_config(WatchConfig::new(path.as_ref()).recursive(recursive))
    }

    /// Start watching with explicit configuration.
    pub fn with_config(config: WatchConfig) -> Result<(Self, WatchChannels)> {
        let runtime = Handle::try_current().map_err(|_| WatcherError::NoRuntime)?;

        let root = std::path::absolute(&config.path).map_err(|source| WatcherError::ResolvePath {
            path: config.path.clone(),
            source,
        })?;
        if !root.exists() {
            return Err(WatcherError::DirectoryNotFound(root.display().to_string()));
        }

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| {
                // Only fails once the event loop is gone.
                let _ = raw_tx.send(res);
            },
        )?;

        // Root first so nothing that happens during the walk is missed.
        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|source| WatcherError::Subscribe {
                path: root.clone(),
                source,
            })?;

        let (event_tx, event_rx) = mpsc::channel(config.event_capacity.max(1));
        let (error_tx, error_rx) = mpsc::channel(config.error_capacity.max(1));

        let recursive = config.recursive;
        let debouncer = Arc::new(Debouncer::new(config.debounce_delay(), runtime.clone()));
        let shared = Arc::new(Shared {
            config,
            outlets: RwLock::new(Some(Outlets {
                events: event_tx,
                errors: error_tx,
            })),
            watcher: Mutex::new(Some(watcher)),
            watched: WatchedDirs::default(),
            dropped: AtomicU64::new(0),
        });
        if recursive {
            shared.watched.insert(&root);
        }

        runtime.spawn(event_loop(
            raw_rx,
            EventLoop {
                shared: Arc::clone(&shared),
                debouncer: Arc::clone(&debouncer),
                runtime: runtime.clone(),
            },
        ));

        if recursive {
            let shared = Arc::clone(&shared);
            let root = root.clone();
            runtime.spawn_blocking(move || match shared.subscribe_tree(&root) {
                Ok(added) => info!(
                    "Recursive watch ready for {} ({} directories)",
                    root.display(),
                    added + 1
                ),
                Err(err) => {
                    warn!("Recursive watch setup for {} failed: {err}", root.display());
                    shared.send_error(err);
                }
            });
        }

        info!("Watching {} (recursive: {recursive})", root.display());

        Ok((
            Self {
                root,
                shared,
                debouncer,
            },
            WatchChannels {
                events: event_rx,
                errors: error_rx,
            },
        ))
    }

    /// The absolute watch root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether subdirectories are being subscribed.
    pub fn is_recursive(&self) -> bool {
        self.shared.config.recursive
    }

    /// Directories currently subscribed, sorted.
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        self.shared.watched.snapshot()
    }

    /// Check whether a directory is subscribed.
    pub fn is_watching(&self, dir: &Path) -> bool {
        self.shared.watched.contains(dir)
    }

    /// Number of events and errors discarded because a channel was full.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Whether [`DirectoryWatcher::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Stop watching and close both channels. Later calls do nothing.
    pub fn close(&self) {
        let outlets = self
            .shared
            .outlets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if outlets.is_none() {
            return;
        }

        self.debouncer.stop();
        drop(outlets);

        let watcher = self
            .shared
            .watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(watcher);
        self.shared.watched.clear();

        info!("Directory watcher closed: {}", self.root.display());
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.close();
    }
}

struct EventLoop {
    shared: Arc<Shared>,
    debouncer: Arc<Debouncer<PathBuf>>,
    runtime: Handle,
}

impl EventLoop {
    fn handle(&self, event: notify::Event) {
        let Some(op) = WatchOp::from_kind(event.kind) else {
            return;
        };

        let recursive = self.shared.config.recursive;
        for path in event.paths {
            if recursive && matches!(op, WatchOp::Remove | WatchOp::Rename) {
                self.shared.forget_tree(&path);
            }
            if recursive
                && matches!(op, WatchOp::Create | WatchOp::Rename)
                && !self.shared.is_excluded(&path)
            {
                self.subscribe_new_dir(path.clone());
            }

            let change = WatchEvent::new(op, path.clone());
            let shared = Arc::clone(&self.shared);
            self.debouncer.add(path, move || shared.send_event(change));
        }
    }

    /// Walk and subscribe `path` off the event loop if it is a directory.
    ///
    /// The path may be a file, or may already be gone again.
    fn subscribe_new_dir(&self, path: PathBuf) {
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn_blocking(move || {
            if path.is_dir() {
                subscribe_reporting(&shared, &path);
            }
        });
    }
}

/// Subscribe a subtree, surfacing anything but permission failures.
fn subscribe_reporting(shared: &Shared, dir: &Path) {
    match shared.subscribe_tree(dir) {
        Ok(added) => debug!("Subscribed {added} new directories under {}", dir.display()),
        Err(err) if err.is_permission_denied() => {}
        Err(err) => {
            warn!("Failed to watch new directory {}: {err}", dir.display());
            shared.send_error(err);
        }
    }
}

async fn event_loop(
    mut raw_rx: mpsc::UnboundedReceiver<notify::Result<notify::Event>>,
    ctx: EventLoop,
) {
    while let Some(res) = raw_rx.recv().await {
        match res {
            Ok(event) => ctx.handle(event),
            Err(err) => {
                warn!("Watch error: {err}");
                ctx.shared.send_error(WatcherError::Notify(err));
            }
        }
    }
    debug!("Watch event loop finished");
}

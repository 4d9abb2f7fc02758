//! Per-key delayed callbacks.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

struct Pending {
    generation: u64,
    task: JoinHandle<()>,
}

struct Timers<K> {
    pending: HashMap<K, Pending>,
    next_generation: u64,
    stopped: bool,
}

/// Coalesces rapid triggers for the same key into a single delayed callback.
///
/// Each [`Debouncer::add`] replaces whatever was scheduled for the key, so
/// only the most recently supplied callback runs, and only once the key has
/// been quiet for the full delay.
pub struct Debouncer<K> {
    delay: Duration,
    runtime: Handle,
    timers: Arc<Mutex<Timers<K>>>,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    /// Create a debouncer whose timers run on the given runtime.
    pub fn new(delay: Duration, runtime: Handle) -> Self {
        Self {
            delay,
            runtime,
            timers: Arc::new(Mutex::new(Timers {
                pending: HashMap::new(),
                next_generation: 0,
                stopped: false,
            })),
        }
    }

    /// The configured quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `callback` for `key`, cancelling any earlier one.
    ///
    /// Ignored once [`Debouncer::stop`] has been called.
    pub fn add<F>(&self, key: K, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut timers = lock(&self.timers);
        if timers.stopped {
            return;
        }

        let generation = timers.next_generation;
        timers.next_generation += 1;

        let delay = self.delay;
        let shared = Arc::clone(&self.timers);
        let fire_key = key.clone();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            // A superseded timer may already be past its sleep when it is
            // aborted; the generation check keeps it from firing.
            let current = {
                let mut timers = lock(&shared);
                let current = timers
                    .pending
                    .get(&fire_key)
                    .is_some_and(|p| p.generation == generation);
                if current {
                    timers.pending.remove(&fire_key);
                }
                current
            };

            if current {
                callback();
            }
        });

        if let Some(previous) = timers.pending.insert(key, Pending { generation, task }) {
            previous.task.abort();
            trace!("Rescheduled debounced callback");
        }
    }

    /// Number of keys with a callback still waiting.
    pub fn pending(&self) -> usize {
        lock(&self.timers).pending.len()
    }

    /// Cancel every pending callback and refuse new ones.
    pub fn stop(&self) {
        let mut timers = lock(&self.timers);
        timers.stopped = true;
        for (_, pending) in timers.pending.drain() {
            pending.task.abort();
        }
    }
}

fn lock<K>(timers: &Mutex<Timers<K>>) -> MutexGuard<'_, Timers<K>> {
    timers.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn debouncer(delay_ms: u64) -> Debouncer<&'static str> {
        Debouncer::new(Duration::from_millis(delay_ms), Handle::current())
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_callback_fires() {
        let debouncer = debouncer(100);
        let fired = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let fired = Arc::clone(&fired);
            debouncer.add("key", move || fired.lock().unwrap().push(i));
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*fired.lock().unwrap(), vec![4]);
        assert_eq!(debouncer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_waits_for_quiet_period() {
        let debouncer = debouncer(100);
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        debouncer.add("key", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(debouncer.pending(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let debouncer = debouncer(100);
        let count = Arc::new(AtomicUsize::new(0));

        for key in ["a", "b", "c"] {
            let c = Arc::clone(&count);
            debouncer.add(key, move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(debouncer.pending(), 3);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(debouncer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending() {
        let debouncer = debouncer(100);
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        debouncer.add("key", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.stop();

        let c = Arc::clone(&count);
        debouncer.add("late", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(debouncer.pending(), 0);
    }
}

//! Periodic expiry sweep for `ResponseCache`.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::cache::ResponseCache;

/// Shortest allowed sweep period (`tokio::time::interval` rejects zero).
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to the background sweep task.
///
/// The task holds only a weak reference to the cache, so it ends on its own
/// once the owning client is dropped. Dropping the handle also stops it.
#[derive(Debug)]
pub struct CacheSweeper {
    /// Stops the sweep loop.
    shutdown: CancellationToken,
    /// Spawned sweep task.
    task: Option<JoinHandle<()>>,
}

impl CacheSweeper {
    /// Spawns the sweep loop on the current tokio runtime.
    ///
    /// The first sweep runs one full `interval` after spawning.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub(crate) fn spawn(cache: &Arc<Mutex<ResponseCache>>, interval: Duration) -> Self {
        let shutdown = CancellationToken::new();
        let weak = Arc::downgrade(cache);
        let token = shutdown.clone();
        let task = tokio::spawn(sweep_loop(weak, interval.max(MIN_INTERVAL), token));
        Self {
            shutdown,
            task: Some(task),
        }
    }

    /// Returns `true` while the sweep task is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the sweep task and waits for it to exit.
    pub async fn stop(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "cache sweeper task ended abnormally");
        }
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Sweeps the cache every `interval` until cancelled or the cache is gone.
async fn sweep_loop(
    cache: Weak<Mutex<ResponseCache>>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // Skip the immediate first tick
    ticker.tick().await;

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let (removed, remaining) = {
                    let mut guard = cache.lock().await;
                    let removed = guard.sweep();
                    (removed, guard.len())
                };
                tracing::debug!(removed, remaining, "swept TMDB response cache");
            }
        }
    }
    tracing::debug!("cache sweeper stopped");
}

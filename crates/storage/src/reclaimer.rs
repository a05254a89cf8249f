//! Chunk reclamation background task
//!
//! This module provides ChunkReclaimer that runs in a background thread
//! and periodically recycles retired chunks whose last pin has been
//! released.
//!
//! # Design Notes
//!
//! - Goes through `RevisionCache::reclaim`, the same path the allocator uses
//! - Never touches a chunk with outstanding pins
//! - Graceful shutdown via atomic flag
//! - Configurable check interval

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use crate::cache::RevisionCache;

/// Shortest pause between reclaim passes
const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(1);

/// Background chunk reclaimer
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use revcache_storage::{ChunkReclaimer, RevisionCache};
///
/// let cache = Arc::new(RevisionCache::new(CacheConfig::default())?);
/// let reclaimer = ChunkReclaimer::from_config(Arc::clone(&cache));
/// let handle = reclaimer.start();
///
/// // ... use the cache ...
///
/// reclaimer.shutdown();
/// handle.join().unwrap();
/// ```
pub struct ChunkReclaimer {
    /// Cache whose retired chunks are recycled
    cache: Arc<RevisionCache>,
    /// How often to run a reclaim pass
    check_interval: Duration,
    /// Shutdown signal
    shutdown: Arc<AtomicBool>,
}

impl ChunkReclaimer {
    /// Create a new reclaimer
    ///
    /// # Arguments
    ///
    /// * `cache` - The cache to reclaim chunks from
    /// * `check_interval` - How often to run a reclaim pass, at least 1ms
    pub fn new(cache: Arc<RevisionCache>, check_interval: Duration) -> Self {
        Self {
            cache,
            check_interval: check_interval.max(MIN_CHECK_INTERVAL),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a reclaimer using the cache's configured interval
    pub fn from_config(cache: Arc<RevisionCache>) -> Self {
        let interval = cache.config().reclaim_interval();
        Self::new(cache, interval)
    }

    /// Start the background reclaim task
    ///
    /// Returns a JoinHandle that can be used to wait for the thread to complete.
    /// The thread will run until `shutdown()` is called.
    pub fn start(&self) -> JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        let shutdown = Arc::clone(&self.shutdown);
        let check_interval = self.check_interval;

        thread::spawn(move || {
            debug!(interval_ms = check_interval.as_millis() as u64, "chunk reclaimer started");
            while !shutdown.load(Ordering::Relaxed) {
                // Sleep in short steps so shutdown is noticed quickly
                let sleep_interval = Duration::from_millis(100).min(check_interval);
                let mut elapsed = Duration::ZERO;

                while elapsed < check_interval {
                    if shutdown.load(Ordering::Relaxed) {
                        debug!("chunk reclaimer stopped");
                        return;
                    }
                    thread::sleep(sleep_interval);
                    elapsed += sleep_interval;
                }

                cache.reclaim();
            }
            debug!("chunk reclaimer stopped");
        })
    }

    /// Signal shutdown (for graceful termination)
    ///
    /// After calling this, the background thread will exit on its next iteration.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Check if shutdown has been signaled
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

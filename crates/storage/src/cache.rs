//! Revision cache: chunk pool plus revision index
//!
//! Stores serialized document payloads in fixed-capacity chunks and maps
//! each `RevisionId` to the location of its payload.
//!
//! # Design
//!
//! - Pool bookkeeping (active, sealed, retired, free lists) sits behind one
//!   `parking_lot::Mutex`; appends happen under it.
//! - The revision index is a `DashMap`, so lookups never touch the pool lock.
//! - Reclamation only recycles `Retired` chunks with zero pins. Retiring a
//!   chunk first removes every index entry into it, so no new reader can
//!   find it; readers that already pinned it keep it alive.
//!
//! The cache is passed to transactions explicitly (`Arc<RevisionCache>`);
//! there is no process-wide instance.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use revcache_core::{CacheConfig, ChunkId, Error, Result, RevisionId};
use tracing::{debug, warn};

use crate::chunk::{Chunk, ChunkState};
use crate::guard::{ChunkGuard, RevisionLocation};

/// Point-in-time counters for a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Chunks ever allocated (pool size)
    pub chunks_allocated: usize,
    /// Chunks on the free list
    pub chunks_free: usize,
    /// Full chunks still serving reads
    pub chunks_sealed: usize,
    /// Evicted chunks waiting for their last unpin
    pub chunks_retired: usize,
    /// Entries in the revision index
    pub revisions: usize,
    /// Chunks with at least one outstanding pin
    pub pinned_chunks: usize,
    /// Pins released across all chunks since creation
    pub pins_released: u64,
}

#[derive(Default)]
struct Pool {
    all: Vec<Arc<Chunk>>,
    active: Option<Arc<Chunk>>,
    sealed: VecDeque<Arc<Chunk>>,
    retired: Vec<Arc<Chunk>>,
    free: Vec<Arc<Chunk>>,
}

/// In-memory revision cache
pub struct RevisionCache {
    config: CacheConfig,
    pool: Mutex<Pool>,
    index: DashMap<RevisionId, RevisionLocation>,
    next_chunk_id: AtomicU64,
}

impl RevisionCache {
    /// Create an empty cache. Chunks are allocated lazily.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            chunk_size = config.chunk_size,
            max_chunks = config.max_chunks,
            "revision cache created"
        );
        Ok(RevisionCache {
            config,
            pool: Mutex::new(Pool::default()),
            index: DashMap::new(),
            next_chunk_id: AtomicU64::new(1),
        })
    }

    /// Configuration in effect
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Copy `payload` into the cache under `revision_id`.
    ///
    /// Returns a guard pinning the new payload. A previous entry for the
    /// same revision is replaced in the index; readers holding it are
    /// unaffected.
    pub fn store(&self, revision_id: RevisionId, payload: &[u8]) -> Result<ChunkGuard> {
        if payload.len() > self.config.chunk_size {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: self.config.chunk_size,
            });
        }

        let mut pool = self.pool.lock();
        let (chunk, span) = loop {
            let active = pool.active.clone();
            let chunk = match active {
                Some(chunk) => chunk,
                None => self.acquire_chunk(&mut pool)?,
            };
            if let Some(span) = chunk.append(payload) {
                break (chunk, span);
            }
            chunk.seal();
            debug!(chunk = %chunk.id(), used = chunk.used(), "chunk sealed");
            pool.sealed.push_back(chunk);
            pool.active = None;
        };

        let generation = chunk.generation();
        let location = RevisionLocation::new(Arc::clone(&chunk), span, generation);
        let guard = location.protect().ok_or(Error::StaleLocation(chunk.id()))?;
        self.index.insert(revision_id, location);
        Ok(guard)
    }

    /// Unpinned location of a revision's payload
    pub fn locate(&self, revision_id: RevisionId) -> Option<RevisionLocation> {
        self.index.get(&revision_id).map(|entry| entry.value().clone())
    }

    /// Pin and return the payload of a revision
    pub fn protect(&self, revision_id: RevisionId) -> Option<ChunkGuard> {
        self.locate(revision_id)?.protect()
    }

    /// Whether the index has an entry for `revision_id`
    pub fn contains(&self, revision_id: RevisionId) -> bool {
        self.index.contains_key(&revision_id)
    }

    /// Drop a revision from the index. Its bytes stay in the chunk.
    pub fn remove(&self, revision_id: RevisionId) -> bool {
        self.index.remove(&revision_id).is_some()
    }

    /// Evict a chunk: unlink every revision stored in it and mark it
    /// retired. It is recycled by `reclaim` once no guard pins it.
    ///
    /// Returns `false` if the chunk is unknown or not active/sealed.
    pub fn retire_chunk(&self, chunk_id: ChunkId) -> bool {
        let mut pool = self.pool.lock();
        self.retire_locked(&mut pool, chunk_id)
    }

    /// Recycle every retired chunk that has no outstanding pins.
    ///
    /// Returns the number of chunks moved to the free list.
    pub fn reclaim(&self) -> usize {
        let mut pool = self.pool.lock();
        Self::reclaim_locked(&mut pool)
    }

    /// Snapshot of pool and index counters
    pub fn stats(&self) -> CacheStats {
        let pool = self.pool.lock();
        CacheStats {
            chunks_allocated: pool.all.len(),
            chunks_free: pool.free.len(),
            chunks_sealed: pool.sealed.len(),
            chunks_retired: pool.retired.len(),
            revisions: self.index.len(),
            pinned_chunks: pool.all.iter().filter(|c| c.pin_count() > 0).count(),
            pins_released: pool.all.iter().map(|c| c.releases()).sum(),
        }
    }

    /// Look up a chunk by identity
    pub fn chunk(&self, chunk_id: ChunkId) -> Option<Arc<Chunk>> {
        let pool = self.pool.lock();
        pool.all.iter().find(|c| c.id() == chunk_id).cloned()
    }

    fn retire_locked(&self, pool: &mut Pool, chunk_id: ChunkId) -> bool {
        let chunk = if pool.active.as_ref().map(|c| c.id()) == Some(chunk_id) {
            pool.active.take()
        } else if let Some(pos) = pool.sealed.iter().position(|c| c.id() == chunk_id) {
            pool.sealed.remove(pos)
        } else {
            None
        };
        let Some(chunk) = chunk else {
            return false;
        };

        self.index.retain(|_, loc| loc.chunk_id() != chunk_id);
        chunk.retire();
        debug!(chunk = %chunk_id, pins = chunk.pin_count(), "chunk retired");
        pool.retired.push(chunk);
        true
    }

    fn reclaim_locked(pool: &mut Pool) -> usize {
        let mut reclaimed = 0;
        let mut still_pinned = Vec::with_capacity(pool.retired.len());
        for chunk in pool.retired.drain(..) {
            if chunk.try_reclaim() {
                pool.free.push(chunk);
                reclaimed += 1;
            } else {
                still_pinned.push(chunk);
            }
        }
        pool.retired = still_pinned;
        if reclaimed > 0 {
            debug!(
                reclaimed,
                pending = pool.retired.len(),
                "reclaimed retired chunks"
            );
        }
        reclaimed
    }

    /// Make a chunk the active append target.
    ///
    /// Order of preference: free list, fresh allocation under the pool
    /// bound, reclaiming retired chunks, evicting the oldest unpinned sealed
    /// chunk. Pinned chunks are never chosen for eviction, so a failed
    /// acquire leaves the index intact.
    fn acquire_chunk(&self, pool: &mut Pool) -> Result<Arc<Chunk>> {
        if pool.free.is_empty()
            && pool.all.len() >= self.config.max_chunks
            && Self::reclaim_locked(pool) == 0
        {
            let victim = pool
                .sealed
                .iter()
                .find(|c| c.pin_count() == 0)
                .map(|c| c.id());
            if let Some(victim) = victim {
                self.retire_locked(pool, victim);
                Self::reclaim_locked(pool);
            }
        }

        let chunk = if let Some(chunk) = pool.free.pop() {
            let activated = chunk.activate();
            debug_assert!(activated, "free list held chunk in state {:?}", chunk.state());
            chunk
        } else if pool.all.len() < self.config.max_chunks {
            let id = ChunkId::new(self.next_chunk_id.fetch_add(1, Ordering::Relaxed));
            let chunk = Arc::new(Chunk::new(id, self.config.chunk_size));
            debug!(chunk = %id, capacity = self.config.chunk_size, "chunk allocated");
            pool.all.push(Arc::clone(&chunk));
            chunk
        } else {
            warn!(
                max_chunks = self.config.max_chunks,
                retired = pool.retired.len(),
                "revision cache exhausted"
            );
            return Err(Error::CacheExhausted);
        };

        debug_assert_eq!(chunk.state(), ChunkState::Active);
        pool.active = Some(Arc::clone(&chunk));
        Ok(chunk)
    }
}

impl std::fmt::Debug for RevisionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevisionCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

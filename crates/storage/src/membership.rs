//! Per-result set of pinned chunks
//!
//! `ChunkMembership` owns one `ChunkGuard` per distinct chunk a result has
//! referenced. A chunk is a member if and only if the membership holds a
//! live guard for it, so pins are released exactly once: when the
//! membership is cleared or dropped.

use revcache_core::ChunkId;
use tracing::trace;

use crate::guard::ChunkGuard;
use crate::small_map::SmallMap;

/// Number of chunks tracked inline before spilling to a hash set
pub const INLINE_CHUNKS: usize = 4;

/// Set of chunks pinned by one result
#[derive(Default)]
pub struct ChunkMembership {
    guards: SmallMap<ChunkId, ChunkGuard, INLINE_CHUNKS>,
}

impl ChunkMembership {
    /// Create an empty membership
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the guard's chunk as seen.
    ///
    /// Returns `true` if the chunk was new and the guard was retained. If
    /// the chunk is already a member the guard is dropped here, releasing
    /// its now-redundant pin.
    pub fn add(&mut self, guard: ChunkGuard) -> bool {
        let id = guard.chunk_id();
        match self.guards.insert(id, guard) {
            None => {
                trace!(chunk = %id, pinned = self.guards.len(), "retained chunk pin");
                true
            }
            Some(redundant) => {
                trace!(chunk = %id, "released redundant chunk pin");
                drop(redundant);
                false
            }
        }
    }

    /// Whether this membership pins `chunk`
    #[inline]
    pub fn contains(&self, chunk: ChunkId) -> bool {
        self.guards.contains(&chunk)
    }

    /// The retained guard for `chunk`
    pub fn guard(&self, chunk: ChunkId) -> Option<&ChunkGuard> {
        self.guards.get(&chunk)
    }

    /// Number of distinct chunks pinned
    #[inline]
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// True if no chunk is pinned
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// True once lookups have moved to the hashed representation
    #[inline]
    pub fn is_spilled(&self) -> bool {
        self.guards.is_spilled()
    }

    /// Identities of all pinned chunks
    pub fn chunk_ids(&self) -> impl Iterator<Item = ChunkId> + '_ {
        self.guards.keys()
    }

    /// Release every pin and start over empty
    pub fn clear(&mut self) {
        if !self.guards.is_empty() {
            trace!(released = self.guards.len(), "releasing chunk pins");
        }
        self.guards.clear();
    }
}

impl std::fmt::Debug for ChunkMembership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.chunk_ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Chunk, PayloadSpan};
    use crate::guard::RevisionLocation;
    use std::sync::Arc;

    struct TestChunk {
        chunk: Arc<Chunk>,
        span: PayloadSpan,
    }

    impl TestChunk {
        fn id(&self) -> ChunkId {
            self.chunk.id()
        }

        fn pin_count(&self) -> usize {
            self.chunk.pin_count()
        }

        fn releases(&self) -> u64 {
            self.chunk.releases()
        }
    }

    fn chunks(n: u64) -> Vec<TestChunk> {
        (1..=n)
            .map(|i| {
                let chunk = Arc::new(Chunk::new(ChunkId::new(i), 64));
                let span = chunk.append(format!("payload-{i}").as_bytes()).unwrap();
                TestChunk { chunk, span }
            })
            .collect()
    }

    fn guard(c: &TestChunk) -> ChunkGuard {
        RevisionLocation::new(Arc::clone(&c.chunk), c.span, c.chunk.generation())
            .protect()
            .unwrap()
    }

    #[test]
    fn test_contains_before_and_after_transition() {
        let cs = chunks(5);
        let mut m = ChunkMembership::new();

        for c in &cs[..4] {
            assert!(m.add(guard(c)));
        }
        assert!(!m.is_spilled());
        for c in &cs[..4] {
            assert!(m.contains(c.id()));
        }
        assert!(!m.contains(cs[4].id()));

        assert!(m.add(guard(&cs[4])));
        assert!(m.is_spilled());
        for c in &cs {
            assert!(m.contains(c.id()));
        }
        assert_eq!(m.len(), 5);
    }

    #[test]
    fn test_duplicate_add_releases_redundant_guard() {
        let cs = chunks(1);
        let mut m = ChunkMembership::new();

        assert!(m.add(guard(&cs[0])));
        assert!(!m.add(guard(&cs[0])));
        assert_eq!(cs[0].pin_count(), 1);
        assert_eq!(cs[0].releases(), 1);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_clear_releases_each_chunk_once() {
        let cs = chunks(6);
        let mut m = ChunkMembership::new();
        for c in &cs {
            m.add(guard(c));
            m.add(guard(c));
        }
        m.clear();
        assert!(m.is_empty());
        assert!(!m.is_spilled());
        for c in &cs {
            assert_eq!(c.pin_count(), 0);
            assert_eq!(c.releases(), 2);
        }
    }

    #[test]
    fn test_drop_releases_pins() {
        let cs = chunks(3);
        {
            let mut m = ChunkMembership::new();
            for c in &cs {
                m.add(guard(c));
            }
            assert!(cs.iter().all(|c| c.pin_count() == 1));
        }
        assert!(cs.iter().all(|c| c.pin_count() == 0));
    }

    #[test]
    fn test_guard_lookup() {
        let cs = chunks(2);
        let mut m = ChunkMembership::new();
        m.add(guard(&cs[1]));
        assert_eq!(m.guard(cs[1].id()).unwrap().chunk_id(), cs[1].id());
        assert!(m.guard(cs[0].id()).is_none());
    }
}

//! Single-document result
//!
//! A `DocumentResult` holds at most one current payload (the most recently
//! added revision) plus a pin on every chunk it has ever been handed since
//! construction. Payloads are never copied: `vpack()` borrows straight from
//! the chunk, and the result's pins keep that memory valid.
//!
//! The result borrows its transaction, so it cannot outlive it or be handed
//! to a different one.

use revcache_core::{ChunkId, Error, Result, RevisionId};
use revcache_storage::{ChunkGuard, ChunkMembership, PayloadPtr, RevisionLocation};
use tracing::trace;

use crate::transaction::{RevisionSink, TransactionContext};

/// Current payload of a result together with the chunk it lives in
#[derive(Debug, Clone, Copy)]
struct Current {
    chunk: ChunkId,
    payload: PayloadPtr,
}

/// Pinned view of one document revision
pub struct DocumentResult<'t> {
    trx: &'t TransactionContext,
    current: Option<Current>,
    last_revision_id: RevisionId,
    chunks: ChunkMembership,
}

impl<'t> DocumentResult<'t> {
    /// Create an empty result bound to `trx`
    pub fn new(trx: &'t TransactionContext) -> Self {
        DocumentResult {
            trx,
            current: None,
            last_revision_id: RevisionId::ZERO,
            chunks: ChunkMembership::new(),
        }
    }

    /// Owning transaction
    pub fn transaction(&self) -> &'t TransactionContext {
        self.trx
    }

    /// Make the guarded payload current.
    ///
    /// The guard is retained if its chunk is new to this result; otherwise
    /// it is released immediately since an existing pin already covers it.
    pub fn add(&mut self, guard: ChunkGuard, revision_id: RevisionId) {
        let current = Current {
            chunk: guard.chunk_id(),
            payload: guard.payload_ptr(),
        };
        self.chunks.add(guard);
        self.current = Some(current);
        self.last_revision_id = revision_id;
    }

    /// Same as `add`, for a caller that already knows this result has seen
    /// the guard's chunk. Membership is still consulted, so a wrong guess
    /// only costs a retained pin.
    pub fn add_existing(&mut self, guard: ChunkGuard, revision_id: RevisionId) {
        if !self.chunks.contains(guard.chunk_id()) {
            trace!(chunk = %guard.chunk_id(), rev = %revision_id, "add_existing on unseen chunk");
        }
        self.add(guard, revision_id);
    }

    /// Make a payload current without a new pin. Its chunk must already be
    /// pinned by this result.
    pub fn add_covered(&mut self, location: &RevisionLocation, revision_id: RevisionId) -> Result<()> {
        let chunk = location.chunk_id();
        if !self.chunks.contains(chunk) {
            return Err(Error::ChunkNotPinned(chunk));
        }
        if !location.is_current() {
            return Err(Error::StaleLocation(chunk));
        }
        self.current = Some(Current {
            chunk,
            payload: location.payload_ptr(),
        });
        self.last_revision_id = revision_id;
        Ok(())
    }

    /// Whether this result pins `chunk`
    #[inline]
    pub fn has_seen_chunk(&self, chunk: ChunkId) -> bool {
        self.chunks.contains(chunk)
    }

    /// Payload of the most recent add.
    ///
    /// # Panics
    ///
    /// Panics if nothing has been added yet.
    #[inline]
    pub fn vpack(&self) -> &[u8] {
        match self.last_vpack() {
            Some(payload) => payload,
            None => panic!("DocumentResult::vpack() called before any add"),
        }
    }

    /// Payload of the most recent add, if any
    #[inline]
    pub fn last_vpack(&self) -> Option<&[u8]> {
        // SAFETY: `current` always points into a chunk held by `self.chunks`,
        // and the borrow of `self` keeps those pins alive.
        self.current.map(|c| unsafe { c.payload.as_slice() })
    }

    /// Revision of the most recent add; `RevisionId::ZERO` if none
    #[inline]
    pub fn last_revision_id(&self) -> RevisionId {
        self.last_revision_id
    }

    /// Number of distinct chunks pinned by this result
    #[inline]
    pub fn pinned_chunks(&self) -> usize {
        self.chunks.len()
    }
}

impl Clone for DocumentResult<'_> {
    /// Copies the current payload and revision. The copy pins only the
    /// chunk of the current payload, with its own pin.
    fn clone(&self) -> Self {
        let mut chunks = ChunkMembership::new();
        if let Some(current) = self.current {
            if let Some(guard) = self.chunks.guard(current.chunk) {
                chunks.add(guard.share());
            }
        }
        DocumentResult {
            trx: self.trx,
            current: self.current,
            last_revision_id: self.last_revision_id,
            chunks,
        }
    }
}

impl RevisionSink for DocumentResult<'_> {
    fn has_seen_chunk(&self, chunk: ChunkId) -> bool {
        DocumentResult::has_seen_chunk(self, chunk)
    }

    fn add(&mut self, guard: ChunkGuard, revision_id: RevisionId) {
        DocumentResult::add(self, guard, revision_id)
    }

    fn add_covered(&mut self, location: &RevisionLocation, revision_id: RevisionId) -> Result<()> {
        DocumentResult::add_covered(self, location, revision_id)
    }
}

impl std::fmt::Debug for DocumentResult<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentResult")
            .field("trx", &self.trx.id())
            .field("last_revision_id", &self.last_revision_id)
            .field("chunks", &self.chunks)
            .finish()
    }
}

//! Multi-document result
//!
//! Batch counterpart of `DocumentResult` for index scans and batch
//! inserts/updates: an ordered, append-only list of payload views sharing
//! one set of chunk pins. Each chunk is pinned at most once no matter how
//! many entries point into it.
//!
//! Not `Clone`: pins have exactly one holder.

use std::ops::Index;

use revcache_core::{ChunkId, Error, Result, RevisionId};
use revcache_storage::{ChunkGuard, ChunkMembership, PayloadPtr, RevisionLocation};

use crate::transaction::{RevisionSink, TransactionContext};

/// Pinned views of several document revisions
pub struct MultiDocumentResult<'t> {
    trx: &'t TransactionContext,
    results: Vec<PayloadPtr>,
    last_revision_id: RevisionId,
    chunks: ChunkMembership,
}

impl<'t> MultiDocumentResult<'t> {
    /// Create an empty result bound to `trx`
    pub fn new(trx: &'t TransactionContext) -> Self {
        MultiDocumentResult {
            trx,
            results: Vec::new(),
            last_revision_id: RevisionId::ZERO,
            chunks: ChunkMembership::new(),
        }
    }

    /// Owning transaction
    pub fn transaction(&self) -> &'t TransactionContext {
        self.trx
    }

    /// Append the guarded payload, retaining the guard if its chunk is new
    pub fn add(&mut self, guard: ChunkGuard, revision_id: RevisionId) {
        let payload = guard.payload_ptr();
        self.chunks.add(guard);
        self.results.push(payload);
        self.last_revision_id = revision_id;
    }

    /// Same as `add`, for a caller that expects the chunk to be known
    pub fn add_existing(&mut self, guard: ChunkGuard, revision_id: RevisionId) {
        self.add(guard, revision_id);
    }

    /// Append a payload whose chunk this result already pins
    pub fn add_covered(&mut self, location: &RevisionLocation, revision_id: RevisionId) -> Result<()> {
        let chunk = location.chunk_id();
        if !self.chunks.contains(chunk) {
            return Err(Error::ChunkNotPinned(chunk));
        }
        if !location.is_current() {
            return Err(Error::StaleLocation(chunk));
        }
        self.results.push(location.payload_ptr());
        self.last_revision_id = revision_id;
        Ok(())
    }

    /// Whether this result pins `chunk`
    #[inline]
    pub fn has_seen_chunk(&self, chunk: ChunkId) -> bool {
        self.chunks.contains(chunk)
    }

    /// Payload at `position`, or `Error::OutOfRange`
    pub fn at(&self, position: usize) -> Result<&[u8]> {
        self.results
            .get(position)
            .map(|p| self.view(p))
            .ok_or(Error::OutOfRange {
                index: position,
                len: self.results.len(),
            })
    }

    /// True if no entries were added since construction or `clear`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Drop all entries, reset the last revision to zero, and release
    /// every chunk pin.
    pub fn clear(&mut self) {
        self.results.clear();
        self.last_revision_id = RevisionId::ZERO;
        self.chunks.clear();
    }

    /// Reserve room for `additional` more entries. Pins are unaffected.
    pub fn reserve(&mut self, additional: usize) {
        self.results.reserve(additional);
    }

    /// Last added payload.
    ///
    /// # Panics
    ///
    /// Panics if the result is empty.
    pub fn back(&self) -> &[u8] {
        match self.results.last() {
            Some(p) => self.view(p),
            None => panic!("MultiDocumentResult::back() called on empty result"),
        }
    }

    /// Last added payload; panics if empty
    #[inline]
    pub fn vpack(&self) -> &[u8] {
        self.back()
    }

    /// Last added payload, if any
    #[inline]
    pub fn last_vpack(&self) -> Option<&[u8]> {
        self.results.last().map(|p| self.view(p))
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

    /// Payloads in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.results.iter().map(move |p| self.view(p))
    }

    #[inline]
    fn view(&self, payload: &PayloadPtr) -> &[u8] {
        // SAFETY: every entry points into a chunk held by `self.chunks`;
        // entries and pins are only dropped together in `clear`/drop,
        // both of which need `&mut self`.
        unsafe { payload.as_slice() }
    }
}

impl Index<usize> for MultiDocumentResult<'_> {
    type Output = [u8];

    fn index(&self, position: usize) -> &[u8] {
        self.view(&self.results[position])
    }
}

impl RevisionSink for MultiDocumentResult<'_> {
    fn has_seen_chunk(&self, chunk: ChunkId) -> bool {
        MultiDocumentResult::has_seen_chunk(self, chunk)
    }

    fn add(&mut self, guard: ChunkGuard, revision_id: RevisionId) {
        MultiDocumentResult::add(self, guard, revision_id)
    }

    fn add_covered(&mut self, location: &RevisionLocation, revision_id: RevisionId) -> Result<()> {
        MultiDocumentResult::add_covered(self, location, revision_id)
    }
}

impl std::fmt::Debug for MultiDocumentResult<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiDocumentResult")
            .field("trx", &self.trx.id())
            .field("len", &self.results.len())
            .field("last_revision_id", &self.last_revision_id)
            .field("chunks", &self.chunks)
            .finish()
    }
}

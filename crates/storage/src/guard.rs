//! Pin tokens and unpinned payload locations
//!
//! - `ChunkGuard`: proof that a chunk is pinned. Not `Clone`; dropping it
//!   releases the pin exactly once. Moving it moves pin ownership.
//! - `RevisionLocation`: where a payload lives, without a pin. Must be
//!   turned into a guard (or be covered by a pin the holder already owns)
//!   before the payload is read.

use std::sync::Arc;

use revcache_core::ChunkId;

use crate::chunk::{Chunk, PayloadPtr, PayloadSpan};

/// Scoped pin on a chunk, paired with one payload inside it
#[must_use = "dropping a ChunkGuard releases the pin immediately"]
pub struct ChunkGuard {
    chunk: Arc<Chunk>,
    span: PayloadSpan,
}

impl ChunkGuard {
    /// Wrap a pin that the caller has just taken on `chunk`
    pub(crate) fn from_pinned(chunk: Arc<Chunk>, span: PayloadSpan) -> Self {
        ChunkGuard { chunk, span }
    }

    /// Identity of the pinned chunk
    #[inline]
    pub fn chunk_id(&self) -> ChunkId {
        self.chunk.id()
    }

    /// The pinned chunk
    #[inline]
    pub fn chunk(&self) -> &Arc<Chunk> {
        &self.chunk
    }

    /// Position of the guarded payload
    #[inline]
    pub fn span(&self) -> PayloadSpan {
        self.span
    }

    /// Raw view of the guarded payload
    #[inline]
    pub fn payload_ptr(&self) -> PayloadPtr {
        self.chunk.payload_ptr(self.span)
    }

    /// Borrow the guarded payload
    #[inline]
    pub fn payload(&self) -> &[u8] {
        // SAFETY: `self` holds a pin for as long as the borrow lives.
        unsafe { self.payload_ptr().as_slice() }
    }

    /// Take a second, independent pin on the same chunk.
    ///
    /// Both guards must be dropped for the chunk to become reclaimable.
    pub fn share(&self) -> ChunkGuard {
        self.chunk.pin_held();
        ChunkGuard {
            chunk: Arc::clone(&self.chunk),
            span: self.span,
        }
    }
}

impl Drop for ChunkGuard {
    fn drop(&mut self) {
        self.chunk.unpin();
    }
}

impl std::fmt::Debug for ChunkGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkGuard")
            .field("chunk", &self.chunk.id())
            .field("span", &self.span)
            .finish()
    }
}

/// Unpinned location of a payload
#[derive(Clone)]
pub struct RevisionLocation {
    chunk: Arc<Chunk>,
    span: PayloadSpan,
    generation: u64,
}

impl RevisionLocation {
    pub(crate) fn new(chunk: Arc<Chunk>, span: PayloadSpan, generation: u64) -> Self {
        RevisionLocation {
            chunk,
            span,
            generation,
        }
    }

    /// Identity of the chunk holding the payload
    #[inline]
    pub fn chunk_id(&self) -> ChunkId {
        self.chunk.id()
    }

    /// Position of the payload
    #[inline]
    pub fn span(&self) -> PayloadSpan {
        self.span
    }

    /// Chunk generation observed when the location was recorded
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while the chunk has not been recycled since this location was
    /// recorded. Only stable if the caller pins the chunk.
    #[inline]
    pub fn is_current(&self) -> bool {
        self.chunk.generation() == self.generation
    }

    /// Raw view of the payload.
    ///
    /// Dereferencing it is only sound while some pin on the chunk is held
    /// and `is_current()` was true under that pin.
    #[inline]
    pub fn payload_ptr(&self) -> PayloadPtr {
        self.chunk.payload_ptr(self.span)
    }

    /// Pin the chunk. Returns `None` if it was reclaimed or recycled.
    pub fn protect(&self) -> Option<ChunkGuard> {
        if self.chunk.try_pin(self.generation) {
            Some(ChunkGuard::from_pinned(Arc::clone(&self.chunk), self.span))
        } else {
            None
        }
    }
}

impl std::fmt::Debug for RevisionLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevisionLocation")
            .field("chunk", &self.chunk.id())
            .field("span", &self.span)
            .field("generation", &self.generation)
            .finish()
    }
}

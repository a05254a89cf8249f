//! Fixed-capacity memory chunks holding serialized document payloads
//!
//! A chunk is an append-only byte region. Payloads are copied in once and
//! never moved; readers access them through raw views while holding a pin.
//!
//! # Lifecycle
//!
//! ```text
//! Active ──seal──▶ Sealed ──retire──▶ Retired ──try_reclaim──▶ Reclaiming ──▶ Free
//!   ▲                                    ▲                         │
//!   │                                    └────── pins > 0 ─────────┘
//!   └──────────────────────── activate ◀──────────────────────── Free
//! ```
//!
//! # Pin protocol
//!
//! `try_pin` increments the pin count and only then checks state and
//! generation; `try_reclaim` publishes `Reclaiming` and only then checks the
//! pin count. Both sides use `SeqCst`, so at least one of them observes the
//! other and a pinned chunk is never reset.

use std::cell::UnsafeCell;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};

use revcache_core::ChunkId;

/// Lifecycle state of a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ChunkState {
    /// Accepting appends
    Active = 0,
    /// Full; payloads readable, no further appends
    Sealed = 1,
    /// Evicted from the revision index, waiting for the last unpin
    Retired = 2,
    /// Being reset by the reclaimer
    Reclaiming = 3,
    /// Empty, parked on the free list
    Free = 4,
}

impl ChunkState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ChunkState::Active,
            1 => ChunkState::Sealed,
            2 => ChunkState::Retired,
            3 => ChunkState::Reclaiming,
            _ => ChunkState::Free,
        }
    }

    /// Whether new pins may be taken in this state
    #[inline]
    pub fn is_pinnable(self) -> bool {
        self < ChunkState::Reclaiming
    }
}

/// Position of a payload inside a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadSpan {
    offset: u32,
    len: u32,
}

impl PayloadSpan {
    /// Byte offset from the start of the chunk
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset as usize
    }

    /// Payload length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// True for zero-length payloads
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Raw read-only view of a payload inside a chunk
///
/// Carries no lifetime. Whoever holds a `PayloadPtr` must also hold a pin
/// on the chunk it points into for as long as it dereferences it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadPtr {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: the pointee lives in a `Chunk`, which is `Sync`, and payload bytes
// are never written after being published. Validity of the pointer is the
// holder's pin obligation, not a thread-affinity concern.
unsafe impl Send for PayloadPtr {}
// SAFETY: see above; the view is read-only.
unsafe impl Sync for PayloadPtr {}

impl PayloadPtr {
    /// Address of the first payload byte
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Payload length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for zero-length payloads
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrow the payload bytes.
    ///
    /// # Safety
    ///
    /// The chunk this view points into must stay pinned for all of `'a`.
    #[inline]
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        std::slice::from_raw_parts(self.ptr.as_ptr(), self.len)
    }
}

/// Fixed-capacity, append-only payload region
pub struct Chunk {
    id: ChunkId,
    data: Box<[UnsafeCell<u8>]>,
    used: AtomicUsize,
    pins: AtomicUsize,
    releases: AtomicU64,
    generation: AtomicU64,
    state: AtomicU8,
}

// SAFETY: bytes are only written through `append`, which reserves a disjoint
// range first, and only while the pool lock is held. Published ranges are
// never written again until the chunk is reclaimed, which requires zero pins.
unsafe impl Sync for Chunk {}

impl Chunk {
    /// Allocate a zeroed chunk of `capacity` bytes in the `Active` state
    pub(crate) fn new(id: ChunkId, capacity: usize) -> Self {
        let data = (0..capacity)
            .map(|_| UnsafeCell::new(0u8))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Chunk {
            id,
            data,
            used: AtomicUsize::new(0),
            pins: AtomicUsize::new(0),
            releases: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            state: AtomicU8::new(ChunkState::Active as u8),
        }
    }

    /// Chunk identity
    #[inline]
    pub fn id(&self) -> ChunkId {
        self.id
    }

    /// Capacity in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes already handed out
    #[inline]
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Acquire)
    }

    /// Bytes still available for appends
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.used()
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> ChunkState {
        ChunkState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Number of completed reclaims of this chunk
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Number of outstanding pins
    #[inline]
    pub fn pin_count(&self) -> usize {
        self.pins.load(Ordering::SeqCst)
    }

    /// Total number of pins ever released on this chunk
    #[inline]
    pub fn releases(&self) -> u64 {
        self.releases.load(Ordering::Relaxed)
    }

    /// Copy `bytes` into the chunk.
    ///
    /// Returns `None` if the chunk is not `Active` or has too little room.
    /// Caller must hold the pool lock so appends never overlap a reclaim.
    pub(crate) fn append(&self, bytes: &[u8]) -> Option<PayloadSpan> {
        if self.state() != ChunkState::Active {
            return None;
        }
        let capacity = self.capacity();
        let offset = self
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(bytes.len()).filter(|end| *end <= capacity)
            })
            .ok()?;

        // SAFETY: [offset, offset + len) was reserved above and is in bounds.
        // No reader can hold a view into it yet.
        unsafe {
            let dst = (self.data.as_ptr() as *mut u8).add(offset);
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
        }

        Some(PayloadSpan {
            offset: offset as u32,
            len: bytes.len() as u32,
        })
    }

    /// Raw view of a payload previously returned by `append`
    pub fn payload_ptr(&self, span: PayloadSpan) -> PayloadPtr {
        debug_assert!(span.offset() + span.len() <= self.capacity());
        // SAFETY: offset is within the allocation, so the result is non-null.
        let ptr = unsafe {
            NonNull::new_unchecked((self.data.as_ptr() as *mut u8).add(span.offset()))
        };
        PayloadPtr {
            ptr,
            len: span.len(),
        }
    }

    /// Take a pin if the chunk is still at `generation` and pinnable
    pub(crate) fn try_pin(&self, generation: u64) -> bool {
        self.pins.fetch_add(1, Ordering::SeqCst);
        if self.state().is_pinnable() && self.generation() == generation {
            return true;
        }
        self.pins.fetch_sub(1, Ordering::SeqCst);
        false
    }

    /// Take an additional pin on a chunk the caller already pins
    pub(crate) fn pin_held(&self) {
        let prev = self.pins.fetch_add(1, Ordering::SeqCst);
        debug_assert!(prev > 0, "pin_held on an unpinned chunk");
    }

    /// Release one pin
    pub(crate) fn unpin(&self) {
        let prev = self.pins.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(prev > 0, "unpin without matching pin on {}", self.id);
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    /// Stop accepting appends
    pub(crate) fn seal(&self) -> bool {
        self.transition(ChunkState::Active, ChunkState::Sealed)
    }

    /// Mark as evicted; reclaimable once unpinned
    pub(crate) fn retire(&self) -> bool {
        self.transition(ChunkState::Active, ChunkState::Retired)
            || self.transition(ChunkState::Sealed, ChunkState::Retired)
    }

    /// Reset a retired, unpinned chunk and move it to `Free`
    pub(crate) fn try_reclaim(&self) -> bool {
        if !self.transition(ChunkState::Retired, ChunkState::Reclaiming) {
            return false;
        }
        if self.pins.load(Ordering::SeqCst) != 0 {
            self.state
                .store(ChunkState::Retired as u8, Ordering::SeqCst);
            return false;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.used.store(0, Ordering::Release);
        self.state.store(ChunkState::Free as u8, Ordering::SeqCst);
        true
    }

    /// Return a free chunk to service
    pub(crate) fn activate(&self) -> bool {
        self.transition(ChunkState::Free, ChunkState::Active)
    }

    fn transition(&self, from: ChunkState, to: ChunkState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .field("used", &self.used())
            .field("pins", &self.pin_count())
            .field("generation", &self.generation())
            .field("state", &self.state())
            .finish()
    }
}

//! Storage layer for the revision cache
//!
//! This crate implements chunked payload storage with:
//! - Chunk: fixed-capacity, append-only payload region with a pin count
//! - ChunkGuard: unique pin token; dropping it releases the pin
//! - RevisionLocation: unpinned payload address from the revision index
//! - SmallMap / ChunkMembership: per-result set of pinned chunks
//! - RevisionCache: chunk pool, revision index, eviction hook
//! - ChunkReclaimer: background task recycling unpinned retired chunks
//!
//! # Reclamation safety
//!
//! A chunk with at least one outstanding `ChunkGuard` is never reclaimed,
//! reset, or overwritten. Guards are the only way to read a payload.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod chunk;
pub mod guard;
pub mod membership;
pub mod reclaimer;
pub mod small_map;

pub use cache::{CacheStats, RevisionCache};
pub use chunk::{Chunk, ChunkState, PayloadPtr, PayloadSpan};
pub use guard::{ChunkGuard, RevisionLocation};
pub use membership::{ChunkMembership, INLINE_CHUNKS};
pub use reclaimer::ChunkReclaimer;
pub use small_map::SmallMap;

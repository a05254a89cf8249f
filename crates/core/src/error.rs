//! Error types for the revision cache
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Only conditions a caller can act on are represented here. Pin/unpin
//! bookkeeping mistakes are ruled out by ownership of `ChunkGuard` and
//! are never reported as errors; reading a payload from an empty result
//! is a contract violation and panics.

use crate::config::ConfigError;
use crate::types::{ChunkId, RevisionId};
use thiserror::Error;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the revision cache
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Checked indexed access past the end of a result
    #[error("Index {index} out of range for result of length {len}")]
    OutOfRange {
        /// Requested position
        index: usize,
        /// Number of entries in the result
        len: usize,
    },

    /// Revision is not present in the cache index
    #[error("Revision not found: {0}")]
    RevisionNotFound(RevisionId),

    /// A pin-free add named a chunk the result does not hold a pin on
    #[error("Chunk {0} is not pinned by this result")]
    ChunkNotPinned(ChunkId),

    /// The chunk behind a location was recycled after the location was read
    #[error("Location in {0} is stale")]
    StaleLocation(ChunkId),

    /// Payload does not fit into a single chunk
    #[error("Payload of {size} bytes exceeds chunk capacity of {max} bytes")]
    PayloadTooLarge {
        /// Payload size in bytes
        size: usize,
        /// Chunk capacity in bytes
        max: usize,
    },

    /// No free chunk and nothing could be reclaimed
    #[error("Revision cache exhausted: all chunks are pinned or in use")]
    CacheExhausted,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

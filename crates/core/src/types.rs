//! Identifier types shared across the cache
//!
//! All identifiers are plain `u64` newtypes:
//! - RevisionId: version of a document, assigned by the transaction layer
//! - ChunkId: identity of a chunk's memory region
//! - TxnId: identity of a transaction context

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a specific document revision
///
/// Ordered so callers can tie-break "most recent" visibility. The cache
/// never interprets the value beyond equality and hashing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct RevisionId(u64);

impl RevisionId {
    /// Sentinel meaning "no revision"
    pub const ZERO: RevisionId = RevisionId(0);

    /// Wrap a raw revision value
    pub const fn new(value: u64) -> Self {
        RevisionId(value)
    }

    /// Raw value
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// True unless this is the `ZERO` sentinel
    #[inline]
    pub const fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl From<u64> for RevisionId {
    fn from(value: u64) -> Self {
        RevisionId(value)
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rev:{}", self.0)
    }
}

/// Identity of a chunk
///
/// Stays the same when a reclaimed chunk is recycled, in the same way a
/// memory address would.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkId(u64);

impl ChunkId {
    /// Wrap a raw chunk number
    pub const fn new(value: u64) -> Self {
        ChunkId(value)
    }

    /// Raw value
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk:{}", self.0)
    }
}

/// Identity of a transaction context
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxnId(u64);

impl TxnId {
    /// Wrap a raw transaction number
    pub const fn new(value: u64) -> Self {
        TxnId(value)
    }

    /// Raw value
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::sync::Arc;

pub use revcache::{
    CacheConfig, ChunkId, DocumentResult, Error, MultiDocumentResult, RevisionCache, RevisionId,
    TransactionContext, TxnId,
};

/// Cache with 1KB chunks so tests can force chunk boundaries cheaply.
pub fn small_cache(max_chunks: usize) -> Arc<RevisionCache> {
    Arc::new(
        RevisionCache::new(
            CacheConfig::for_testing()
                .with_chunk_size(1024)
                .with_max_chunks(max_chunks),
        )
        .expect("valid test config"),
    )
}

/// Transaction over `cache` with a fixed id.
pub fn transaction(cache: &Arc<RevisionCache>) -> TransactionContext {
    TransactionContext::new(TxnId::new(1), Arc::clone(cache))
}

pub fn rid(n: u64) -> RevisionId {
    RevisionId::new(n)
}

/// Store `n` revisions of `size` bytes each and return their chunk ids.
/// Payload `i` is filled with byte `i as u8`.
pub fn populate(cache: &RevisionCache, n: u64, size: usize) -> Vec<ChunkId> {
    (1..=n)
        .map(|i| {
            cache
                .store(rid(i), &vec![i as u8; size])
                .expect("store")
                .chunk_id()
        })
        .collect()
}

//! Transaction context and the result-sink seam
//!
//! `TransactionContext` is the caller side of the pin protocol. It resolves
//! revision identifiers through the `RevisionCache` it was handed and feeds
//! the resulting payloads into a `RevisionSink` (a single- or multi-document
//! result). When the sink already pins the payload's chunk, no new pin is
//! taken.

use std::sync::Arc;

use revcache_core::{ChunkId, Error, Result, RevisionId, TxnId};
use revcache_storage::{ChunkGuard, RevisionCache, RevisionLocation};
use tracing::trace;

/// Number of index lookups per read before giving up on a stale location
const LOOKUP_ATTEMPTS: usize = 2;

/// Destination for payloads resolved by a transaction
pub trait RevisionSink {
    /// Whether the sink already pins `chunk`
    fn has_seen_chunk(&self, chunk: ChunkId) -> bool;

    /// Record a payload together with a fresh pin on its chunk
    fn add(&mut self, guard: ChunkGuard, revision_id: RevisionId);

    /// Record a payload whose chunk the sink already pins.
    ///
    /// Fails without modifying the sink if the chunk is not pinned or the
    /// location is stale.
    fn add_covered(&mut self, location: &RevisionLocation, revision_id: RevisionId) -> Result<()>;
}

/// Per-transaction handle onto the revision cache
pub struct TransactionContext {
    id: TxnId,
    cache: Arc<RevisionCache>,
}

impl TransactionContext {
    /// Create a transaction context using `cache`
    pub fn new(id: TxnId, cache: Arc<RevisionCache>) -> Self {
        TransactionContext { id, cache }
    }

    /// Transaction identity
    pub fn id(&self) -> TxnId {
        self.id
    }

    /// The cache this transaction reads from
    pub fn cache(&self) -> &Arc<RevisionCache> {
        &self.cache
    }

    /// Resolve `revision_id` and record its payload in `sink`.
    pub fn read_revision<S: RevisionSink>(&self, revision_id: RevisionId, sink: &mut S) -> Result<()> {
        for _ in 0..LOOKUP_ATTEMPTS {
            let location = self
                .cache
                .locate(revision_id)
                .ok_or(Error::RevisionNotFound(revision_id))?;

            if sink.has_seen_chunk(location.chunk_id()) {
                match sink.add_covered(&location, revision_id) {
                    Ok(()) => {
                        trace!(txn = %self.id, rev = %revision_id, "read covered by existing pin");
                        return Ok(());
                    }
                    Err(Error::StaleLocation(_)) => continue,
                    Err(e) => return Err(e),
                }
            }

            if let Some(guard) = location.protect() {
                trace!(txn = %self.id, rev = %revision_id, chunk = %guard.chunk_id(), "read pinned chunk");
                sink.add(guard, revision_id);
                return Ok(());
            }
        }
        Err(Error::RevisionNotFound(revision_id))
    }

    /// Resolve several revisions in order. Stops at the first failure.
    ///
    /// Returns the number of revisions recorded.
    pub fn read_revisions<S, I>(&self, revision_ids: I, sink: &mut S) -> Result<usize>
    where
        S: RevisionSink,
        I: IntoIterator<Item = RevisionId>,
    {
        let mut count = 0;
        for revision_id in revision_ids {
            self.read_revision(revision_id, sink)?;
            count += 1;
        }
        Ok(count)
    }

    /// Store a new revision payload and record it in `sink`.
    pub fn insert_revision<S: RevisionSink>(
        &self,
        revision_id: RevisionId,
        payload: &[u8],
        sink: &mut S,
    ) -> Result<()> {
        let guard = self.cache.store(revision_id, payload)?;
        sink.add(guard, revision_id);
        Ok(())
    }
}

impl std::fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("id", &self.id)
            .finish()
    }
}

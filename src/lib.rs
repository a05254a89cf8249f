//! revcache - in-memory revision cache for a document store
//!
//! Serialized document payloads live in fixed-capacity chunks. Transactions
//! read them without copying through result objects that pin each chunk
//! they reference exactly once; a background reclaimer recycles chunks no
//! result still pins.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use revcache::{CacheConfig, DocumentResult, RevisionCache, RevisionId, TransactionContext, TxnId};
//!
//! let cache = Arc::new(RevisionCache::new(CacheConfig::default())?);
//! let trx = TransactionContext::new(TxnId::new(1), Arc::clone(&cache));
//!
//! let mut doc = DocumentResult::new(&trx);
//! trx.insert_revision(RevisionId::new(5), b"{\"name\":\"alice\"}", &mut doc)?;
//! assert_eq!(doc.last_revision_id(), RevisionId::new(5));
//! let bytes: &[u8] = doc.vpack();
//! ```
//!
//! # Architecture
//!
//! - `revcache-core`: identifiers, errors, configuration
//! - `revcache-storage`: chunks, guards, membership sets, cache, reclaimer
//! - `revcache-concurrency`: transaction context and result types

pub use revcache_concurrency::*;
pub use revcache_core::*;
pub use revcache_storage::*;

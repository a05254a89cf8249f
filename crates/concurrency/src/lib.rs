//! Transaction-facing result types for the revision cache
//!
//! This crate implements the reader side of the pin protocol:
//! - TransactionContext: resolves revisions through an explicit cache handle
//! - RevisionSink: seam between the transaction and its results
//! - DocumentResult: one current payload plus its chunk pins
//! - MultiDocumentResult: ordered payload batch sharing one set of pins
//!
//! Results are owned and mutated by a single transaction; they need no
//! internal locking. Chunk pin counts are atomic and live in the storage
//! crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document_result;
pub mod multi_document_result;
pub mod transaction;

pub use document_result::DocumentResult;
pub use multi_document_result::MultiDocumentResult;
pub use transaction::{RevisionSink, TransactionContext};

//! Core types for the revision cache
//!
//! This crate defines the foundational types used throughout the system:
//! - RevisionId, ChunkId, TxnId: identifier newtypes
//! - Error: Error type hierarchy
//! - CacheConfig: pool sizing and reclaimer settings

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{CacheConfig, ConfigError};
pub use error::{Error, Result};
pub use types::{ChunkId, RevisionId, TxnId};

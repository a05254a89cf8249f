//! Revision cache configuration
//!
//! Settings can be built in code (builder methods) or loaded from a
//! TOML document such as:
//!
//! ```toml
//! chunk_size = 4194304
//! max_chunks = 64
//! reclaim_interval_ms = 100
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest accepted chunk size (1KB)
pub const MIN_CHUNK_SIZE: usize = 1024;

/// Largest accepted chunk size; payload offsets are stored as `u32`
pub const MAX_CHUNK_SIZE: usize = u32::MAX as usize;

fn default_chunk_size() -> usize {
    4 * 1024 * 1024
}

fn default_max_chunks() -> usize {
    64
}

fn default_reclaim_interval_ms() -> u64 {
    100
}

/// Revision cache configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Capacity of each chunk in bytes (default: 4MB).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Upper bound on the number of chunks in the pool (default: 64).
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,

    /// Period of the background reclaimer in milliseconds (default: 100).
    #[serde(default = "default_reclaim_interval_ms")]
    pub reclaim_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            chunk_size: default_chunk_size(),
            max_chunks: default_max_chunks(),
            reclaim_interval_ms: default_reclaim_interval_ms(),
        }
    }
}

impl CacheConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set chunk size (builder pattern).
    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Set pool bound (builder pattern).
    pub fn with_max_chunks(mut self, chunks: usize) -> Self {
        self.max_chunks = chunks;
        self
    }

    /// Set reclaimer period (builder pattern).
    pub fn with_reclaim_interval(mut self, interval: Duration) -> Self {
        self.reclaim_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Reclaimer period as a `Duration`.
    pub fn reclaim_interval(&self) -> Duration {
        Duration::from_millis(self.reclaim_interval_ms)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(ConfigError::ChunkSizeTooSmall);
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(ConfigError::ChunkSizeTooLarge);
        }
        if self.max_chunks == 0 {
            return Err(ConfigError::NoChunks);
        }
        if self.reclaim_interval_ms == 0 {
            return Err(ConfigError::ZeroReclaimInterval);
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: CacheConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration for tests (small chunks, short interval).
    pub fn for_testing() -> Self {
        CacheConfig {
            chunk_size: 4 * 1024,
            max_chunks: 8,
            reclaim_interval_ms: 10,
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Revision cache configuration
#
# Capacity of each chunk in bytes. A single document payload must fit
# into one chunk.
chunk_size = 4194304

# Maximum number of chunks kept in the pool.
max_chunks = 64

# How often the background reclaimer recycles retired chunks (ms).
reclaim_interval_ms = 100
"#
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Chunk size below the 1KB minimum.
    #[error("Chunk size must be at least 1KB")]
    ChunkSizeTooSmall,

    /// Chunk size does not fit a 32-bit offset.
    #[error("Chunk size must not exceed 4GB")]
    ChunkSizeTooLarge,

    /// Pool bound of zero.
    #[error("Pool must allow at least one chunk")]
    NoChunks,

    /// Reclaimer period of zero.
    #[error("Reclaim interval must be non-zero")]
    ZeroReclaimInterval,

    /// TOML could not be parsed.
    #[error("Invalid config file: {0}")]
    Parse(String),
}

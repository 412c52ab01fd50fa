//! Error types for the disk cache

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the cache store and manager
///
/// Absence is never an error: a missing or expired key is reported as `None`.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache directory could not be created or is not writable
    #[error("Cache directory {path} is unusable: {source}")]
    Init {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading or writing an entry on disk failed
    #[error("Cache I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A value could not be encoded as JSON
    #[error("Failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),

    /// The entry alone is larger than the configured size limit
    #[error("Entry of {size} bytes exceeds the cache size limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

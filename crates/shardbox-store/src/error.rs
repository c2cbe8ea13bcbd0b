use std::io;
use std::path::{Path, PathBuf};

use shardbox_types::{ContentAddress, TypeError};

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The cursor string does not parse as a content address.
    #[error("malformed cursor: {0}")]
    MalformedCursor(#[source] TypeError),

    /// The partition is neither the default nor a configured name.
    #[error("unknown partition: {0}")]
    UnknownPartition(String),

    /// A scan was asked for zero results.
    #[error("limit must be positive")]
    InvalidLimit,

    /// I/O error from the shard tree. No partial results accompany it.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Content handed to the writer does not hash to the claimed address.
    #[error("digest mismatch: expected {expected}, computed {actual}")]
    DigestMismatch {
        expected: ContentAddress,
        actual: ContentAddress,
    },

    /// Invalid or unreadable store configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A blocking scan task panicked or was aborted.
    #[error("scan task failed: {0}")]
    Task(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

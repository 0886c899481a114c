//! Trip store errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the trip store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// User ids become path components, so only `[A-Za-z0-9_-]` is allowed.
    #[error("invalid user id {0:?}: expected letters, digits, '-' or '_'")]
    InvalidUserId(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored trips at {} are unreadable: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize trips: {0}")]
    Serialize(#[from] serde_json::Error),
}

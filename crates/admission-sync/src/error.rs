//! Error types for the sync layer

use admission_core::FieldError;
use std::path::PathBuf;

/// Local key-value storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Key contains characters the store cannot represent
    #[error("invalid storage key: '{0}'")]
    InvalidKey(String),

    /// IO error on the backing file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored value could not be decoded
    #[error("corrupt value under '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Value could not be encoded
    #[error("failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Controller usage errors
///
/// Backend failures never surface here; they become outcomes and
/// notifications instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Edit attempted before bootstrap finished
    #[error("draft is not loaded yet")]
    NotReady,

    /// Edit attempted after the application was submitted
    #[error("application {0} is already submitted")]
    AlreadySubmitted(String),

    /// Named field edit rejected
    #[error(transparent)]
    Field(#[from] FieldError),
}

//! Error types for snapshot files.

use std::path::PathBuf;

/// Errors that can occur reading or writing snapshot files.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A snapshot file could not be encoded or decoded.
    #[error("Serialization error in {path}: {source}")]
    Serialization {
        /// The snapshot file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

//! Error types for the persistence layer.

use std::path::PathBuf;

use dao_types::PlayerId;

/// Errors that can occur while reading or writing saves.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A player with this name already exists.
    #[error("a player named '{0}' already exists")]
    DuplicateName(String),

    /// No save exists for this player id.
    #[error("no save found for player {0}")]
    UnknownPlayer(PlayerId),

    /// A filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A save document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

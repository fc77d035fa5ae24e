//! Durable per-user state kept in a single JSON file.

pub mod profile;
pub mod store;

pub use profile::{DigestFrequency, SavedArticle, UserProfile};
pub use store::StateStore;

use std::path::PathBuf;

/// Errors raised while loading or persisting the state file
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to access state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

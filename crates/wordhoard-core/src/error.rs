//! Error types shared by the orchestrator and its collaborators.
//!
//! Storage errors live here rather than in `wordhoard-store` so the engine
//! can report and classify persistence failures from any backend.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by a storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The collection could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store exists but its contents are unusable.
    #[error("corrupt data in {location}: {reason}")]
    Corrupt { location: String, reason: String },

    /// The persisted envelope carries a version this build cannot read.
    #[error("unsupported data version: {0}")]
    UnsupportedVersion(String),

    /// Backups are switched off in the configuration.
    #[error("backups are disabled")]
    BackupDisabled,

    /// There is no persisted state yet, so there is nothing to snapshot.
    #[error("nothing to back up: {0}")]
    NothingToBackup(String),

    /// The collaborator is temporarily unable to serve the request.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Returns `true` if retrying the same call later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Io(_) | StorageError::Unavailable(_))
    }
}

/// Errors returned by collection operations.
#[derive(Debug, Error)]
pub enum VocabError {
    /// The referenced word is not in the collection.
    #[error("word not found: {0}")]
    NotFound(Uuid),

    /// A headword was empty after trimming.
    #[error("headword must not be empty")]
    EmptyHeadword,

    /// Note content was empty after trimming.
    #[error("note content must not be empty")]
    EmptyNote,

    /// A storage collaborator call failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl VocabError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, VocabError::NotFound(_))
    }
}

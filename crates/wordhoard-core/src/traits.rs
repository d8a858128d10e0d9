//! Collaborator trait definitions.
//!
//! The orchestrator depends on these seams and never on a concrete storage
//! backend or scheduling policy. `wordhoard-store` implements
//! [`VocabularyStorage`] on disk; [`crate::memory::MemoryStorage`] does it in
//! memory for tests.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StorageError;
use crate::model::{Performance, Word};

/// The full set of words keyed by identifier.
pub type Collection = HashMap<Uuid, Word>;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Durable home of a collection.
#[async_trait]
pub trait VocabularyStorage: Send + Sync {
    /// Human-readable backend name (e.g. "json").
    fn name(&self) -> &str;

    /// Reconstruct every persisted word.
    ///
    /// A store that has never been written returns an empty collection. The
    /// orchestrator treats any error as "start empty".
    async fn load(&self) -> Result<Collection, StorageError>;

    /// Persist the whole collection. A failed save must leave the previously
    /// persisted state readable.
    async fn save(&self, words: &Collection) -> Result<(), StorageError>;

    /// Snapshot the current durable state. Retention is the backend's concern.
    async fn backup(&self) -> Result<BackupInfo, StorageError>;
}

/// Where a backup landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub location: PathBuf,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// A spaced-repetition policy.
///
/// Both operations read a word whose counters already include the review
/// being scheduled; neither mutates it.
pub trait LearningAlgorithm: Send + Sync {
    fn name(&self) -> &str;

    /// The instant the word should next come up for review.
    fn calculate_next_review(
        &self,
        word: &Word,
        performance: Performance,
        now: DateTime<Utc>,
    ) -> DateTime<Utc>;

    /// Whether the word has earned a single lifecycle step.
    fn should_promote_status(&self, word: &Word) -> bool;
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Receives collection events. Every method defaults to a no-op.
///
/// Calls happen synchronously after the collection lock is released. A
/// panicking observer is logged and skipped.
pub trait VocabularyObserver: Send + Sync {
    fn on_word_added(&self, _word: &Word) {}
    fn on_word_updated(&self, _word: &Word) {}
    fn on_word_deleted(&self, _id: Uuid) {}
    fn on_saved(&self, _word_count: usize) {}
    fn on_save_failed(&self, _error: &StorageError) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl VocabularyObserver for NoopObserver {}

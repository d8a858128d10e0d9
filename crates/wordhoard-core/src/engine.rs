//! Central collection orchestrator.
//!
//! Owns the in-memory collection, issues every mutation, delegates review
//! scheduling to a [`LearningAlgorithm`] and flushes dirty state to a
//! [`VocabularyStorage`], either on request or from the background
//! auto-save task.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::algorithm::algorithm_from_config;
use crate::autosave::AutoSave;
use crate::config::VocabConfig;
use crate::error::{StorageError, VocabError};
use crate::model::{normalize_headword, Note, Performance, SortKey, Word, WordStatus};
use crate::patch::WordUpdate;
use crate::query::{self, Page};
use crate::statistics::{compute_stats, CollectionStats};
use crate::traits::{BackupInfo, Collection, LearningAlgorithm, VocabularyObserver, VocabularyStorage};

/// Tags attached to notes taken during a review session.
pub const REVIEW_NOTE_TAGS: [&str; 2] = ["review", "learning"];

/// Context prefixed to notes taken during a review session.
pub const REVIEW_NOTE_CONTEXT: &str = "review";

/// Result of a batch operation. One failing id never aborts the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub succeeded: usize,
    /// Ids that were not found.
    pub failed: Vec<Uuid>,
}

impl BatchOutcome {
    /// `(success_count, failure_count)`.
    pub fn counts(&self) -> (usize, usize) {
        (self.succeeded, self.failed.len())
    }
}

/// What a single review did to a word.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// The word after the review was applied.
    pub word: Word,
    pub next_review: DateTime<Utc>,
    pub previous_status: WordStatus,
    /// Set when the review earned a lifecycle step.
    pub promoted: Option<WordStatus>,
}

struct CollectionState {
    words: Collection,
    dirty: bool,
    /// Bumped by every mutation; lets a save tell whether it raced one.
    revision: u64,
}

impl CollectionState {
    fn touch(&mut self) {
        self.dirty = true;
        self.revision = self.revision.wrapping_add(1);
    }
}

/// State shared between the engine handle and the auto-save task.
pub(crate) struct Shared {
    config: VocabConfig,
    storage: Arc<dyn VocabularyStorage>,
    algorithm: Arc<dyn LearningAlgorithm>,
    state: Mutex<CollectionState>,
    observers: RwLock<Vec<Arc<dyn VocabularyObserver>>>,
    /// Serializes saves so an older snapshot never lands after a newer one.
    save_gate: tokio::sync::Mutex<()>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, CollectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Call `f` on every observer, outside the collection lock.
    fn notify(&self, f: impl Fn(&dyn VocabularyObserver)) {
        let observers: Vec<Arc<dyn VocabularyObserver>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in &observers {
            if catch_unwind(AssertUnwindSafe(|| f(observer.as_ref()))).is_err() {
                tracing::warn!("observer panicked, ignoring");
            }
        }
    }

    /// Write the collection if dirty (or unconditionally when `force`).
    ///
    /// Returns whether a save happened. The collection lock is held only
    /// while taking the snapshot.
    pub(crate) async fn persist(&self, force: bool) -> Result<bool, StorageError> {
        let _gate = self.save_gate.lock().await;

        let (snapshot, revision) = {
            let state = self.state();
            if !force && !state.dirty {
                return Ok(false);
            }
            (state.words.clone(), state.revision)
        };

        match self.storage.save(&snapshot).await {
            Ok(()) => {
                let still_current = {
                    let mut state = self.state();
                    let current = state.revision == revision;
                    if current {
                        state.dirty = false;
                    }
                    current
                };
                tracing::info!(
                    words = snapshot.len(),
                    backend = self.storage.name(),
                    "collection saved"
                );
                if !still_current {
                    tracing::debug!("collection changed during save, staying dirty");
                }
                self.notify(|o| o.on_saved(snapshot.len()));
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to save collection");
                self.notify(|o| o.on_save_failed(&e));
                Err(e)
            }
        }
    }
}

/// The collection orchestrator.
pub struct VocabularyEngine {
    shared: Arc<Shared>,
    autosave: Mutex<Option<AutoSave>>,
}

impl VocabularyEngine {
    /// Load the collection and start auto-save if configured, using the
    /// algorithm named in `config`.
    ///
    /// Must be called inside a tokio runtime.
    pub async fn open(config: VocabConfig, storage: Arc<dyn VocabularyStorage>) -> Self {
        let algorithm = algorithm_from_config(&config);
        Self::open_with(config, storage, algorithm).await
    }

    /// Like [`open`](Self::open) with an explicit algorithm.
    ///
    /// A failed load is logged and the engine starts with an empty
    /// collection.
    pub async fn open_with(
        config: VocabConfig,
        storage: Arc<dyn VocabularyStorage>,
        algorithm: Arc<dyn LearningAlgorithm>,
    ) -> Self {
        let loaded = match storage.load().await {
            Ok(words) => {
                tracing::info!(
                    words = words.len(),
                    backend = storage.name(),
                    "collection loaded"
                );
                words
            }
            Err(e) => {
                tracing::warn!(error = %e, backend = storage.name(), "failed to load collection, starting empty");
                Collection::new()
            }
        };

        let words: Collection = loaded
            .into_values()
            .map(|mut word| {
                word.normalize_loaded();
                (word.id, word)
            })
            .collect();

        let auto_save = config.auto_save.then(|| config.auto_save_interval());
        let engine = Self {
            shared: Arc::new(Shared {
                config,
                storage,
                algorithm,
                state: Mutex::new(CollectionState {
                    words,
                    dirty: false,
                    revision: 0,
                }),
                observers: RwLock::new(Vec::new()),
                save_gate: tokio::sync::Mutex::new(()),
            }),
            autosave: Mutex::new(None),
        };

        if let Some(period) = auto_save {
            engine.start_auto_save(period);
        }
        engine
    }

    pub fn config(&self) -> &VocabConfig {
        &self.shared.config
    }

    pub fn algorithm_name(&self) -> &str {
        self.shared.algorithm.name()
    }

    /// Register an observer for add/update/delete/save events.
    pub fn subscribe(&self, observer: Arc<dyn VocabularyObserver>) {
        self.shared
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create a word. Supplied fields are applied on top of the configured
    /// default tags; a primary definition moves it straight to learning.
    pub fn add(&self, headword: &str, fields: WordUpdate) -> Result<Word, VocabError> {
        if normalize_headword(headword).is_empty() {
            return Err(VocabError::EmptyHeadword);
        }
        let add_config = &self.shared.config.add_word;

        let mut word = Word::new(headword);
        word.add_tags(&add_config.default_tags);
        fields.apply_to(&mut word);
        if add_config.auto_promote_to_learning && word.has_primary_definition() {
            word.status = WordStatus::Learning;
        }
        word.refresh_completeness();

        {
            let mut state = self.shared.state();
            state.words.insert(word.id, word.clone());
            state.touch();
        }
        tracing::debug!(id = %word.id, headword = %word.headword, status = %word.status, "word added");
        self.shared.notify(|o| o.on_word_added(&word));
        Ok(word)
    }

    /// Apply a partial update to an existing word.
    ///
    /// A draft word that gains a primary definition is promoted to learning.
    pub fn update(&self, id: Uuid, fields: &WordUpdate) -> Result<Word, VocabError> {
        let auto_promote = self.shared.config.add_word.auto_promote_to_learning;
        let updated = {
            let mut state = self.shared.state();
            let word = state.words.get_mut(&id).ok_or(VocabError::NotFound(id))?;
            fields.apply_to(word);
            if auto_promote && word.status == WordStatus::Draft && word.has_primary_definition() {
                word.status = WordStatus::Learning;
            }
            word.refresh_completeness();
            let updated = word.clone();
            state.touch();
            updated
        };
        tracing::debug!(%id, "word updated");
        self.shared.notify(|o| o.on_word_updated(&updated));
        Ok(updated)
    }

    /// Apply the same update to many words.
    pub fn update_batch(&self, ids: &[Uuid], fields: &WordUpdate) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for &id in ids {
            match self.update(id, fields) {
                Ok(_) => outcome.succeeded += 1,
                Err(_) => outcome.failed.push(id),
            }
        }
        outcome
    }

    /// Append a note to a word.
    pub fn add_note<I, S>(&self, id: Uuid, content: &str, tags: I) -> Result<Note, VocabError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let content = content.trim();
        if content.is_empty() {
            return Err(VocabError::EmptyNote);
        }
        let note = Note::new(content, tags.into_iter().map(Into::into));

        let updated = {
            let mut state = self.shared.state();
            let word = state.words.get_mut(&id).ok_or(VocabError::NotFound(id))?;
            word.notes.push(note.clone());
            word.refresh_completeness();
            let updated = word.clone();
            state.touch();
            updated
        };
        tracing::debug!(%id, note = %note.id, "note added");
        self.shared.notify(|o| o.on_word_updated(&updated));
        Ok(note)
    }

    /// Append a note prefixed with `[context] `.
    pub fn add_note_with_context(
        &self,
        id: Uuid,
        content: &str,
        context: &str,
    ) -> Result<Note, VocabError> {
        self.add_note_in_context(id, content, context, Vec::<String>::new())
    }

    /// Append a note taken during review: prefixed with
    /// [`REVIEW_NOTE_CONTEXT`] and tagged with [`REVIEW_NOTE_TAGS`].
    pub fn add_note_during_review(&self, id: Uuid, content: &str) -> Result<Note, VocabError> {
        self.add_note_in_context(id, content, REVIEW_NOTE_CONTEXT, REVIEW_NOTE_TAGS)
    }

    fn add_note_in_context<I, S>(
        &self,
        id: Uuid,
        content: &str,
        context: &str,
        tags: I,
    ) -> Result<Note, VocabError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let content = content.trim();
        let context = context.trim();
        if content.is_empty() {
            return Err(VocabError::EmptyNote);
        }
        if context.is_empty() {
            return self.add_note(id, content, tags);
        }
        self.add_note(id, &format!("[{context}] {content}"), tags)
    }

    /// Remove a word and its notes.
    pub fn delete(&self, id: Uuid) -> Result<Word, VocabError> {
        let removed = {
            let mut state = self.shared.state();
            let removed = state.words.remove(&id).ok_or(VocabError::NotFound(id))?;
            state.touch();
            removed
        };
        tracing::debug!(%id, headword = %removed.headword, "word deleted");
        self.shared.notify(|o| o.on_word_deleted(id));
        Ok(removed)
    }

    pub fn delete_batch(&self, ids: &[Uuid]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for &id in ids {
            match self.delete(id) {
                Ok(_) => outcome.succeeded += 1,
                Err(_) => outcome.failed.push(id),
            }
        }
        outcome
    }

    /// Record a review at the current time.
    pub fn review(&self, id: Uuid, performance: Performance) -> Result<ReviewOutcome, VocabError> {
        self.review_at(id, performance, Utc::now())
    }

    /// Record a review at `now`.
    ///
    /// Counters are advanced before the algorithm runs, so the next interval
    /// and the promotion decision both see the post-review history.
    pub fn review_at(
        &self,
        id: Uuid,
        performance: Performance,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome, VocabError> {
        let algorithm = &self.shared.algorithm;
        let outcome = {
            let mut state = self.shared.state();
            let word = state.words.get_mut(&id).ok_or(VocabError::NotFound(id))?;

            word.learning_data
                .record_review(performance.is_correct(), now);
            let next_review = algorithm.calculate_next_review(word, performance, now);
            word.learning_data.next_review = Some(next_review);

            let previous_status = word.status;
            let mut promoted = None;
            if algorithm.should_promote_status(word) {
                if let Some(next) = previous_status.promoted() {
                    word.status = next;
                    promoted = Some(next);
                }
            }

            let outcome = ReviewOutcome {
                word: word.clone(),
                next_review,
                previous_status,
                promoted,
            };
            state.touch();
            outcome
        };

        tracing::debug!(
            %id,
            %performance,
            next_review = %outcome.next_review,
            promoted = ?outcome.promoted,
            "review recorded"
        );
        self.shared.notify(|o| o.on_word_updated(&outcome.word));
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get(&self, id: Uuid) -> Option<Word> {
        self.shared.state().words.get(&id).cloned()
    }

    /// First word (oldest) with this headword.
    pub fn find_by_headword(&self, headword: &str) -> Option<Word> {
        let needle = normalize_headword(headword);
        let state = self.shared.state();
        let found = query::stable_order(state.words.values())
            .into_iter()
            .find(|w| w.headword == needle)
            .cloned();
        found
    }

    /// Every word, oldest first.
    pub fn words(&self) -> Vec<Word> {
        self.filtered(|_| true)
    }

    pub fn words_by_status(&self, status: WordStatus) -> Vec<Word> {
        self.filtered(|w| w.status == status)
    }

    pub fn words_by_tag(&self, tag: &str) -> Vec<Word> {
        let tag = tag.trim();
        self.filtered(|w| w.tags.contains(tag))
    }

    /// Distinct tags across the collection, sorted.
    pub fn all_tags(&self) -> Vec<String> {
        let state = self.shared.state();
        let tags: std::collections::BTreeSet<String> = state
            .words
            .values()
            .flat_map(|w| w.tags.iter().cloned())
            .collect();
        tags.into_iter().collect()
    }

    fn filtered(&self, keep: impl Fn(&Word) -> bool) -> Vec<Word> {
        let state = self.shared.state();
        let words = query::stable_order(state.words.values())
            .into_iter()
            .filter(|w| keep(w))
            .cloned()
            .collect();
        words
    }

    /// Ranked search; `limit` defaults to the configured result limit.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<Word> {
        let limit = limit.unwrap_or(self.shared.config.search_result_limit);
        let state = self.shared.state();
        let hits = query::search(state.words.values(), query, limit)
            .into_iter()
            .cloned()
            .collect();
        hits
    }

    pub fn words_for_review(&self) -> Vec<Word> {
        self.words_for_review_at(Utc::now())
    }

    /// Words due at `now`, unscheduled ones first, then by due time.
    pub fn words_for_review_at(&self, now: DateTime<Utc>) -> Vec<Word> {
        let mut due = self.filtered(|w| w.is_due(now));
        due.sort_by_key(|w| w.learning_data.next_review);
        due
    }

    pub fn paginate(
        &self,
        page: usize,
        page_size: usize,
        key: SortKey,
        reverse: bool,
    ) -> Page<Word> {
        let state = self.shared.state();
        let page = query::paginate(state.words.values(), page, page_size, key, reverse);
        page.map(Word::clone)
    }

    pub fn statistics(&self) -> CollectionStats {
        self.statistics_at(Utc::now())
    }

    pub fn statistics_at(&self, now: DateTime<Utc>) -> CollectionStats {
        compute_stats(self.shared.state().words.values(), now)
    }

    pub fn len(&self) -> usize {
        self.shared.state().words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether there are mutations not yet persisted.
    pub fn is_dirty(&self) -> bool {
        self.shared.state().dirty
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Persist now. Without `force`, a clean collection is not written.
    ///
    /// On failure the collection stays dirty and the error is returned.
    pub async fn save(&self, force: bool) -> Result<bool, StorageError> {
        self.shared.persist(force).await
    }

    pub async fn backup(&self) -> Result<BackupInfo, StorageError> {
        if !self.shared.config.backup_enabled {
            return Err(StorageError::BackupDisabled);
        }
        let info = self.shared.storage.backup().await?;
        tracing::info!(location = %info.location.display(), "backup created");
        Ok(info)
    }

    /// Start the background auto-save cycle. No-op if one is already running
    /// or `period` is zero.
    pub fn start_auto_save(&self, period: Duration) {
        if period.is_zero() {
            tracing::warn!("auto-save period is zero, auto-save disabled");
            return;
        }
        let mut slot = self.autosave.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            tracing::debug!("auto-save already running");
            return;
        }
        *slot = Some(AutoSave::spawn(Arc::clone(&self.shared), period));
    }

    pub fn is_auto_saving(&self) -> bool {
        self.autosave
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stop auto-save, then persist unconditionally.
    pub async fn shutdown(&self) -> Result<(), StorageError> {
        let autosave = self
            .autosave
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(autosave) = autosave {
            autosave.stop().await;
        }
        self.shared.persist(true).await.map(|_| ())
    }
}

impl Drop for VocabularyEngine {
    fn drop(&mut self) {
        let slot = self
            .autosave
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(autosave) = slot.take() {
            autosave.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn manual_config() -> VocabConfig {
        VocabConfig {
            auto_save: false,
            ..VocabConfig::default()
        }
    }

    async fn engine() -> (VocabularyEngine, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let engine = VocabularyEngine::open(manual_config(), storage.clone()).await;
        (engine, storage)
    }

    #[derive(Default)]
    struct Recorder {
        added: AtomicUsize,
        updated: AtomicUsize,
        deleted: AtomicUsize,
        saved: AtomicUsize,
        failed: AtomicUsize,
    }

    impl VocabularyObserver for Recorder {
        fn on_word_added(&self, _: &Word) {
            self.added.fetch_add(1, Ordering::SeqCst);
        }
        fn on_word_updated(&self, _: &Word) {
            self.updated.fetch_add(1, Ordering::SeqCst);
        }
        fn on_word_deleted(&self, _: Uuid) {
            self.deleted.fetch_add(1, Ordering::SeqCst);
        }
        fn on_saved(&self, _: usize) {
            self.saved.fetch_add(1, Ordering::SeqCst);
        }
        fn on_save_failed(&self, _: &StorageError) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Panicky;

    impl VocabularyObserver for Panicky {
        fn on_word_added(&self, _: &Word) {
            panic!("observer failure");
        }
    }

    #[tokio::test]
    async fn add_normalizes_and_marks_dirty() {
        let (engine, _) = engine().await;
        assert!(!engine.is_dirty());

        let word = engine.add("  Ephemeral ", WordUpdate::new()).unwrap();
        assert_eq!(word.headword, "ephemeral");
        assert_eq!(word.status, WordStatus::Draft);
        assert_eq!(word.completeness(), 0.0);
        assert!(engine.is_dirty());
        assert_eq!(engine.len(), 1);
    }

    #[tokio::test]
    async fn add_rejects_blank_headword() {
        let (engine, _) = engine().await;
        let err = engine.add("   ", WordUpdate::new()).unwrap_err();
        assert!(matches!(err, VocabError::EmptyHeadword));
        assert!(!engine.is_dirty());
    }

    #[tokio::test]
    async fn definition_promotes_to_learning() {
        let (engine, _) = engine().await;
        let word = engine
            .add("lucid", WordUpdate::new().primary_definition("clear"))
            .unwrap();
        assert_eq!(word.status, WordStatus::Learning);
        assert!((word.completeness() - 0.2).abs() < 1e-9);

        let draft = engine.add("opaque", WordUpdate::new()).unwrap();
        let updated = engine
            .update(draft.id, &WordUpdate::new().primary_definition("not clear"))
            .unwrap();
        assert_eq!(updated.status, WordStatus::Learning);
    }

    #[tokio::test]
    async fn auto_promotion_can_be_disabled() {
        let mut config = manual_config();
        config.add_word.auto_promote_to_learning = false;
        config.add_word.default_tags = vec!["inbox".into()];
        let engine = VocabularyEngine::open(config, Arc::new(MemoryStorage::new())).await;

        let word = engine
            .add("terse", WordUpdate::new().primary_definition("brief"))
            .unwrap();
        assert_eq!(word.status, WordStatus::Draft);
        assert!(word.tags.contains("inbox"));
    }

    #[tokio::test]
    async fn update_missing_word_is_not_found() {
        let (engine, _) = engine().await;
        let err = engine.update(Uuid::new_v4(), &WordUpdate::new()).unwrap_err();
        assert!(err.is_not_found());
        assert!(!engine.is_dirty());
    }

    #[tokio::test]
    async fn notes_and_context() {
        let (engine, _) = engine().await;
        let word = engine.add("gist", WordUpdate::new()).unwrap();

        let note = engine
            .add_note_with_context(word.id, "the main point", "podcast")
            .unwrap();
        assert_eq!(note.content, "[podcast] the main point");

        let review_note = engine.add_note_during_review(word.id, "confused with jest").unwrap();
        assert_eq!(review_note.content, "[review] confused with jest");
        assert_eq!(review_note.tags, vec!["review", "learning"]);

        assert!(matches!(
            engine.add_note(word.id, "  ", Vec::<String>::new()),
            Err(VocabError::EmptyNote)
        ));

        let stored = engine.get(word.id).unwrap();
        assert_eq!(stored.notes.len(), 2);
        assert!((stored.completeness() - 0.05).abs() < 1e-9);
    }

    #[tokio::test]
    async fn delete_batch_reports_partial_failure() {
        let (engine, _) = engine().await;
        let present = engine.add("here", WordUpdate::new()).unwrap();
        let missing = Uuid::new_v4();

        let outcome = engine.delete_batch(&[present.id, missing]);
        assert_eq!(outcome.counts(), (1, 1));
        assert_eq!(outcome.failed, vec![missing]);
        assert!(engine.is_empty());
        assert!(engine.delete(present.id).unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn update_batch_applies_to_each() {
        let (engine, _) = engine().await;
        let a = engine.add("a", WordUpdate::new()).unwrap();
        let b = engine.add("b", WordUpdate::new()).unwrap();
        let outcome = engine.update_batch(&[a.id, Uuid::new_v4(), b.id], &WordUpdate::new().add_tags(["gre"]));
        assert_eq!(outcome.counts(), (2, 1));
        assert_eq!(engine.words_by_tag("gre").len(), 2);
        assert_eq!(engine.all_tags(), vec!["gre"]);
    }

    #[tokio::test]
    async fn first_poor_review_schedule() {
        let (engine, _) = engine().await;
        let word = engine
            .add("wane", WordUpdate::new().primary_definition("decrease"))
            .unwrap();
        let now = Utc::now();

        let outcome = engine.review_at(word.id, Performance::Poor, now).unwrap();
        assert_eq!(outcome.next_review - now, chrono::Duration::seconds(28_080));
        assert_eq!(outcome.word.learning_data.review_count(), 1);
        assert_eq!(outcome.word.learning_data.correct_count(), 0);
        assert_eq!(outcome.word.learning_data.last_reviewed, Some(now));
        assert!(outcome.promoted.is_none());
    }

    #[tokio::test]
    async fn promotion_is_one_step_per_review() {
        let (engine, _) = engine().await;
        let word = engine
            .add("wax", WordUpdate::new().primary_definition("increase"))
            .unwrap();
        let now = Utc::now();

        let first = engine.review_at(word.id, Performance::Excellent, now).unwrap();
        let second = engine.review_at(word.id, Performance::Excellent, now).unwrap();
        assert!(first.promoted.is_none() && second.promoted.is_none());

        let third = engine.review_at(word.id, Performance::Excellent, now).unwrap();
        assert_eq!(third.previous_status, WordStatus::Learning);
        assert_eq!(third.promoted, Some(WordStatus::Reviewing));

        let fourth = engine.review_at(word.id, Performance::Good, now).unwrap();
        assert_eq!(fourth.promoted, Some(WordStatus::Mastered));

        let fifth = engine.review_at(word.id, Performance::Good, now).unwrap();
        assert!(fifth.promoted.is_none());
        assert_eq!(fifth.word.status, WordStatus::Mastered);

        let data = &fifth.word.learning_data;
        assert!(data.correct_count() <= data.review_count());
    }

    #[tokio::test]
    async fn huge_intervals_do_not_break_reviews() {
        let mut config = manual_config();
        config.max_interval_days = 1e9;
        config.base_intervals.excellent = 1e9;
        let engine = VocabularyEngine::open(config, Arc::new(MemoryStorage::new())).await;
        let word = engine
            .add("aeon", WordUpdate::new().primary_definition("an age"))
            .unwrap();
        let now = Utc::now();

        let outcome = engine.review_at(word.id, Performance::Excellent, now).unwrap();
        assert_eq!(outcome.next_review - now, chrono::Duration::days(36_500));

        let stored = engine.get(word.id).unwrap();
        assert_eq!(stored.learning_data.review_count(), 1);
        assert_eq!(stored.learning_data.next_review, Some(outcome.next_review));
    }

    #[tokio::test]
    async fn draft_words_are_never_promoted_by_reviews() {
        let (engine, _) = engine().await;
        let word = engine.add("draft", WordUpdate::new()).unwrap();
        for _ in 0..5 {
            engine.review(word.id, Performance::Excellent).unwrap();
        }
        assert_eq!(engine.get(word.id).unwrap().status, WordStatus::Draft);
    }

    #[tokio::test]
    async fn review_queue() {
        let (engine, _) = engine().await;
        let now = Utc::now();
        let due = engine
            .add("due", WordUpdate::new().primary_definition("owed"))
            .unwrap();
        let later = engine
            .add("later", WordUpdate::new().primary_definition("after"))
            .unwrap();
        engine.add("draft", WordUpdate::new()).unwrap();
        engine.review_at(later.id, Performance::Excellent, now).unwrap();

        let queue = engine.words_for_review_at(now);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, due.id);

        let far = now + chrono::Duration::days(60);
        assert_eq!(engine.words_for_review_at(far).len(), 2);
    }

    #[tokio::test]
    async fn search_and_paginate_through_engine() {
        let (engine, _) = engine().await;
        engine
            .add("feline", WordUpdate::new().primary_definition("like a cat"))
            .unwrap();
        engine.add("cat", WordUpdate::new()).unwrap();
        for i in 0..23 {
            engine.add(&format!("filler{i}"), WordUpdate::new()).unwrap();
        }

        let hits = engine.search("cat", None);
        assert_eq!(hits[0].headword, "cat");
        assert_eq!(hits.len(), 2);
        assert!(engine.search("", None).is_empty());

        let page = engine.paginate(2, 10, SortKey::Headword, false);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_count, 25);
        assert!(engine.paginate(4, 10, SortKey::Headword, false).items.is_empty());
    }

    #[tokio::test]
    async fn reads_do_not_clear_dirty() {
        let (engine, _) = engine().await;
        engine.add("x", WordUpdate::new()).unwrap();
        let _ = engine.statistics();
        let _ = engine.search("x", None);
        let _ = engine.words_for_review();
        assert!(engine.is_dirty());
    }

    #[tokio::test]
    async fn save_clears_dirty_and_skips_when_clean() {
        let (engine, storage) = engine().await;
        engine.add("persist", WordUpdate::new()).unwrap();

        assert!(engine.save(false).await.unwrap());
        assert!(!engine.is_dirty());
        assert_eq!(storage.saved().len(), 1);

        assert!(!engine.save(false).await.unwrap());
        assert!(engine.save(true).await.unwrap());
        assert_eq!(storage.save_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn mutation_during_save_keeps_collection_dirty() {
        let (engine, storage) = engine().await;
        engine.add("first", WordUpdate::new()).unwrap();
        storage.set_save_delay(Duration::from_millis(50));

        let (saved, _) = tokio::join!(engine.save(false), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            engine.add("second", WordUpdate::new()).unwrap();
        });
        assert!(saved.unwrap());
        assert_eq!(storage.saved().len(), 1);
        assert!(engine.is_dirty());

        assert!(engine.save(false).await.unwrap());
        assert_eq!(storage.saved().len(), 2);
        assert!(!engine.is_dirty());
    }

    #[tokio::test]
    async fn failed_save_stays_dirty_and_notifies() {
        let (engine, storage) = engine().await;
        let recorder = Arc::new(Recorder::default());
        engine.subscribe(recorder.clone());
        engine.add("fragile", WordUpdate::new()).unwrap();

        storage.set_fail_saves(true);
        assert!(engine.save(false).await.is_err());
        assert!(engine.is_dirty());
        assert_eq!(engine.len(), 1);
        assert_eq!(recorder.failed.load(Ordering::SeqCst), 1);

        storage.set_fail_saves(false);
        assert!(engine.save(false).await.unwrap());
        assert_eq!(recorder.saved.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn observers_receive_events() {
        let (engine, _) = engine().await;
        let recorder = Arc::new(Recorder::default());
        engine.subscribe(recorder.clone());

        let word = engine.add("event", WordUpdate::new()).unwrap();
        engine.update(word.id, &WordUpdate::new().etymology("latin")).unwrap();
        engine.add_note(word.id, "note", ["t"]).unwrap();
        engine.delete(word.id).unwrap();

        assert_eq!(recorder.added.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.updated.load(Ordering::SeqCst), 2);
        assert_eq!(recorder.deleted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panicking_observer_is_isolated() {
        let (engine, _) = engine().await;
        let recorder = Arc::new(Recorder::default());
        engine.subscribe(Arc::new(Panicky));
        engine.subscribe(recorder.clone());

        let word = engine.add("sturdy", WordUpdate::new()).unwrap();
        assert_eq!(engine.get(word.id).unwrap().headword, "sturdy");
        assert_eq!(recorder.added.load(Ordering::SeqCst), 1);
        engine.update(word.id, &WordUpdate::new().pronunciation("/ˈstɜː.di/")).unwrap();
    }

    #[tokio::test]
    async fn load_failure_starts_empty() {
        let storage = Arc::new(MemoryStorage::with_words([Word::new("lost")]));
        storage.set_fail_loads(true);
        let engine = VocabularyEngine::open(manual_config(), storage.clone()).await;
        assert!(engine.is_empty());
        assert!(!engine.is_dirty());
    }

    #[tokio::test]
    async fn loaded_words_are_normalized() {
        let mut word = Word::new("x");
        word.headword = "  MiXed ".into();
        word.core_info.primary_definition = "def".into();
        let storage = Arc::new(MemoryStorage::with_words([word.clone()]));

        let engine = VocabularyEngine::open(manual_config(), storage).await;
        let loaded = engine.get(word.id).unwrap();
        assert_eq!(loaded.headword, "mixed");
        assert!((loaded.completeness() - 0.2).abs() < 1e-9);
        assert_eq!(engine.find_by_headword("MIXED").map(|w| w.id), Some(word.id));
    }

    #[tokio::test]
    async fn backup_respects_config() {
        let (engine, storage) = engine().await;
        engine.backup().await.unwrap();
        assert_eq!(storage.backup_count(), 1);

        let config = VocabConfig {
            backup_enabled: false,
            ..manual_config()
        };
        let disabled = VocabularyEngine::open(config, Arc::new(MemoryStorage::new())).await;
        assert!(matches!(disabled.backup().await, Err(StorageError::BackupDisabled)));
    }

    #[tokio::test]
    async fn zero_auto_save_period_is_ignored() {
        let config = VocabConfig {
            auto_save: true,
            auto_save_interval_secs: 0,
            ..VocabConfig::default()
        };
        let engine = VocabularyEngine::open(config, Arc::new(MemoryStorage::new())).await;
        assert!(!engine.is_auto_saving());

        engine.start_auto_save(Duration::ZERO);
        assert!(!engine.is_auto_saving());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_save_flushes_only_dirty_state() {
        let storage = Arc::new(MemoryStorage::new());
        let config = VocabConfig {
            auto_save: true,
            auto_save_interval_secs: 300,
            ..VocabConfig::default()
        };
        let engine = VocabularyEngine::open(config, storage.clone()).await;
        assert!(engine.is_auto_saving());

        engine.add("tick", WordUpdate::new()).unwrap();
        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(storage.save_count(), 1);
        assert!(!engine.is_dirty());

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(storage.save_count(), 1, "clean collection is not rewritten");

        engine.shutdown().await.unwrap();
        assert_eq!(storage.save_count(), 2, "shutdown always saves");
        assert!(!engine.is_auto_saving());

        tokio::time::sleep(Duration::from_secs(900)).await;
        assert_eq!(storage.save_count(), 2);
    }
}

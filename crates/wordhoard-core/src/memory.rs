//! In-memory storage collaborator.
//!
//! Keeps the last saved collection in a mutex and counts calls. Used by the
//! orchestrator tests and handy for embedding without touching disk.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StorageError;
use crate::model::Word;
use crate::traits::{BackupInfo, Collection, VocabularyStorage};

pub struct MemoryStorage {
    words: Mutex<Collection>,
    backups: Mutex<Vec<Collection>>,
    save_count: AtomicU32,
    load_count: AtomicU32,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
    save_delay_ms: AtomicU64,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            words: Mutex::new(Collection::new()),
            backups: Mutex::new(Vec::new()),
            save_count: AtomicU32::new(0),
            load_count: AtomicU32::new(0),
            fail_saves: AtomicBool::new(false),
            fail_loads: AtomicBool::new(false),
            save_delay_ms: AtomicU64::new(0),
        }
    }

    /// Start with `words` already persisted.
    pub fn with_words(words: impl IntoIterator<Item = Word>) -> Self {
        let storage = Self::new();
        *lock(&storage.words) = words.into_iter().map(|w| (w.id, w)).collect();
        storage
    }

    /// Make every following `save` fail with [`StorageError::Unavailable`].
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Make every following `save` sleep for `delay` before storing.
    pub fn set_save_delay(&self, delay: Duration) {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.save_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// The collection as of the last successful save.
    pub fn saved(&self) -> Collection {
        lock(&self.words).clone()
    }

    pub fn save_count(&self) -> u32 {
        self.save_count.load(Ordering::SeqCst)
    }

    pub fn load_count(&self) -> u32 {
        self.load_count.load(Ordering::SeqCst)
    }

    pub fn backup_count(&self) -> usize {
        lock(&self.backups).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl VocabularyStorage for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> Result<Collection, StorageError> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("load disabled".into()));
        }
        Ok(lock(&self.words).clone())
    }

    async fn save(&self, words: &Collection) -> Result<(), StorageError> {
        let delay = self.save_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("save disabled".into()));
        }
        *lock(&self.words) = words.clone();
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn backup(&self) -> Result<BackupInfo, StorageError> {
        let snapshot = lock(&self.words).clone();
        let mut backups = lock(&self.backups);
        backups.push(snapshot);
        Ok(BackupInfo {
            location: format!("memory://backup/{}", backups.len()).into(),
            created_at: Utc::now(),
        })
    }
}

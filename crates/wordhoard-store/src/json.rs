//! JSON file storage.
//!
//! The whole collection lives in one pretty-printed JSON document:
//!
//! ```json
//! { "version": "2", "saved_at": "...", "word_count": 1, "words": [ ... ] }
//! ```
//!
//! Files written by the earlier "1.1" format (`created_at` instead of
//! `saved_at`, naive timestamps, integer difficulty) load as well. Saves go
//! to a temporary file in the same directory which is then renamed over the
//! target, so a reader never sees a half-written document.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use wordhoard_core::model::Word;
use wordhoard_core::query::stable_order;
use wordhoard_core::traits::{BackupInfo, Collection, VocabularyStorage};
use wordhoard_core::{timestamp, StorageError};

use crate::backup::{create_backup, BackupPolicy};

/// Envelope version written by this build.
pub const FORMAT_VERSION: &str = "2";

/// Envelope versions this build can read.
pub const READABLE_VERSIONS: [&str; 2] = ["1.1", FORMAT_VERSION];

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    version: &'static str,
    saved_at: String,
    word_count: usize,
    words: Vec<&'a Word>,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    version: String,
    #[serde(default, alias = "created_at")]
    saved_at: Option<String>,
    #[serde(default)]
    word_count: Option<usize>,
    #[serde(default)]
    words: Vec<Word>,
}

/// Storage backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    backup: BackupPolicy,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup: BackupPolicy::default(),
        }
    }

    pub fn with_backup_policy(mut self, policy: BackupPolicy) -> Self {
        self.backup = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_policy(&self) -> BackupPolicy {
        self.backup
    }
}

/// Decode an envelope. Pure, so it can be tested without touching disk.
pub fn decode(bytes: &[u8], location: &Path) -> Result<Collection, StorageError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        tracing::warn!(path = %location.display(), "data file is empty, starting empty");
        return Ok(Collection::new());
    }

    let envelope: EnvelopeIn =
        serde_json::from_slice(bytes).map_err(|e| StorageError::Corrupt {
            location: location.display().to_string(),
            reason: e.to_string(),
        })?;

    if !READABLE_VERSIONS.contains(&envelope.version.as_str()) {
        return Err(StorageError::UnsupportedVersion(envelope.version));
    }
    if let Some(expected) = envelope.word_count {
        if expected != envelope.words.len() {
            tracing::warn!(
                expected,
                found = envelope.words.len(),
                "word_count does not match stored words"
            );
        }
    }
    tracing::debug!(
        version = %envelope.version,
        saved_at = envelope.saved_at.as_deref().unwrap_or(""),
        "decoded collection"
    );

    let mut words = Collection::with_capacity(envelope.words.len());
    for word in envelope.words {
        if let Some(previous) = words.insert(word.id, word) {
            tracing::warn!(id = %previous.id, "duplicate word id, keeping the later record");
        }
    }
    Ok(words)
}

/// Encode a collection as a current-version envelope, oldest word first.
pub fn encode(words: &Collection) -> Result<Vec<u8>, StorageError> {
    let envelope = EnvelopeOut {
        version: FORMAT_VERSION,
        saved_at: timestamp::format(&Utc::now()),
        word_count: words.len(),
        words: stable_order(words.values()),
    };
    Ok(serde_json::to_vec_pretty(&envelope)?)
}

fn read_file(path: &Path) -> Result<Collection, StorageError> {
    match std::fs::read(path) {
        Ok(bytes) => decode(&bytes, path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no data file yet");
            Ok(Collection::new())
        }
        Err(e) => Err(e.into()),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

async fn blocking<T, F>(task: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| StorageError::Unavailable(format!("storage task failed: {e}")))?
}

#[async_trait]
impl VocabularyStorage for JsonFileStorage {
    fn name(&self) -> &str {
        "json"
    }

    async fn load(&self) -> Result<Collection, StorageError> {
        let path = self.path.clone();
        blocking(move || read_file(&path)).await
    }

    async fn save(&self, words: &Collection) -> Result<(), StorageError> {
        let bytes = encode(words)?;
        let path = self.path.clone();
        blocking(move || write_atomic(&path, &bytes)).await?;
        tracing::debug!(path = %self.path.display(), words = words.len(), "data file written");
        Ok(())
    }

    async fn backup(&self) -> Result<BackupInfo, StorageError> {
        let path = self.path.clone();
        let policy = self.backup;
        blocking(move || create_backup(&path, policy, Utc::now())).await
    }
}

//! wordhoard-store: durable storage for wordhoard collections.
//!
//! Implements the `VocabularyStorage` trait on top of a single JSON file
//! with atomic replacement and rotating timestamped backups.

pub mod backup;
pub mod json;

use std::sync::Arc;

use wordhoard_core::traits::VocabularyStorage;
use wordhoard_core::VocabConfig;

pub use backup::BackupPolicy;
pub use json::JsonFileStorage;

/// Create the storage collaborator described by the configuration.
pub fn create_storage(config: &VocabConfig) -> Arc<dyn VocabularyStorage> {
    let policy = BackupPolicy {
        enabled: config.backup_enabled,
        keep: config.backup_count,
    };
    Arc::new(JsonFileStorage::new(config.data_file.clone()).with_backup_policy(policy))
}

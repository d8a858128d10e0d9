//! wordhoard-core: vocabulary model, scheduling and the collection engine.
//!
//! This crate defines the entity model, the storage/algorithm/observer
//! seams, the spaced-repetition algorithms and [`VocabularyEngine`], the
//! orchestrator every front end drives.

mod autosave;

pub mod algorithm;
pub mod config;
pub mod engine;
pub mod error;
pub mod memory;
pub mod model;
pub mod patch;
pub mod query;
pub mod statistics;
pub mod timestamp;
pub mod traits;

pub use algorithm::{algorithm_from_config, MasteryPolicy, SimpleSpacedRepetition, Sm2Algorithm};
pub use config::{load_config, load_config_from, AlgorithmKind, ConfigError, VocabConfig};
pub use engine::{BatchOutcome, ReviewOutcome, VocabularyEngine};
pub use error::{StorageError, VocabError};
pub use model::{
    CoreInfo, DifficultyLevel, ExtendedInfo, LearningData, Note, Performance, SortKey, Word,
    WordStatus,
};
pub use patch::WordUpdate;
pub use query::Page;
pub use statistics::CollectionStats;
pub use traits::{
    BackupInfo, Collection, LearningAlgorithm, NoopObserver, VocabularyObserver,
    VocabularyStorage,
};

pub mod add;
pub mod backup;
pub mod delete;
pub mod init;
pub mod list;
pub mod note;
pub mod review;
pub mod search;
pub mod show;
pub mod stats;
pub mod update;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use comfy_table::{Cell, Table};
use uuid::Uuid;

use wordhoard_core::{load_config_from, DifficultyLevel, VocabularyEngine, Word, WordUpdate};
use wordhoard_store::create_storage;

/// Shortest id prefix accepted when resolving a word.
const MIN_ID_PREFIX: usize = 4;

/// Options shared by every command that touches the collection.
pub struct Session {
    pub config_path: Option<PathBuf>,
    pub data_file: Option<PathBuf>,
}

impl Session {
    /// Load config and the collection.
    ///
    /// Auto-save is off: every command persists once before exiting.
    pub async fn open(&self) -> Result<VocabularyEngine> {
        let mut config = load_config_from(self.config_path.as_deref())
            .context("failed to load configuration")?;
        if let Some(path) = &self.data_file {
            config.data_file = path.clone();
        }
        config.auto_save = false;

        let storage = create_storage(&config);
        Ok(VocabularyEngine::open(config, storage).await)
    }
}

/// Persist pending changes, if any.
pub async fn finish(engine: &VocabularyEngine) -> Result<()> {
    engine
        .save(false)
        .await
        .context("failed to save collection")?;
    Ok(())
}

/// Find a word by id, headword, or unique id prefix.
pub fn resolve(engine: &VocabularyEngine, key: &str) -> Result<Word> {
    let key = key.trim();
    if let Ok(id) = Uuid::parse_str(key) {
        if let Some(word) = engine.get(id) {
            return Ok(word);
        }
    }
    if let Some(word) = engine.find_by_headword(key) {
        return Ok(word);
    }

    let prefix = key.to_lowercase();
    if prefix.len() >= MIN_ID_PREFIX && prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
        let mut matches = engine
            .words()
            .into_iter()
            .filter(|w| w.id.to_string().starts_with(&prefix));
        if let Some(first) = matches.next() {
            if matches.next().is_some() {
                bail!("'{key}' matches more than one word id");
            }
            return Ok(first);
        }
    }
    bail!("no word matches '{key}'")
}

/// First eight characters of an id.
pub fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Field flags shared by `add` and `update`.
#[derive(Args, Debug, Default)]
pub struct FieldArgs {
    /// Primary definition
    #[arg(short, long)]
    pub definition: Option<String>,

    /// Pronunciation
    #[arg(long)]
    pub pronunciation: Option<String>,

    /// Part of speech
    #[arg(long = "pos")]
    pub part_of_speech: Option<String>,

    /// Tag to add (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Additional definition (repeatable)
    #[arg(long = "also")]
    pub definitions: Vec<String>,

    /// Example sentence (repeatable)
    #[arg(long = "example")]
    pub examples: Vec<String>,

    /// Synonym (repeatable)
    #[arg(long = "synonym")]
    pub synonyms: Vec<String>,

    /// Antonym (repeatable)
    #[arg(long = "antonym")]
    pub antonyms: Vec<String>,

    #[arg(long)]
    pub etymology: Option<String>,

    /// Memory tip
    #[arg(long = "tip")]
    pub memory_tips: Option<String>,

    /// Where the word was encountered
    #[arg(long)]
    pub context: Option<String>,

    /// Where the word came from (default "manual_input")
    #[arg(long)]
    pub source: Option<String>,

    /// easy, medium, hard or very_hard
    #[arg(long)]
    pub difficulty: Option<String>,
}

impl FieldArgs {
    /// Build an update carrying only the flags that were given.
    pub fn into_update(self) -> Result<WordUpdate> {
        let mut update = WordUpdate::new();
        if let Some(v) = self.definition {
            update = update.primary_definition(v);
        }
        if let Some(v) = self.pronunciation {
            update = update.pronunciation(v);
        }
        if let Some(v) = self.part_of_speech {
            update = update.part_of_speech(v);
        }
        if !self.tags.is_empty() {
            update = update.add_tags(self.tags);
        }
        if !self.definitions.is_empty() {
            update = update.definitions(self.definitions);
        }
        if !self.examples.is_empty() {
            update = update.examples(self.examples);
        }
        if !self.synonyms.is_empty() {
            update = update.synonyms(self.synonyms);
        }
        if !self.antonyms.is_empty() {
            update = update.antonyms(self.antonyms);
        }
        if let Some(v) = self.etymology {
            update = update.etymology(v);
        }
        if let Some(v) = self.memory_tips {
            update = update.memory_tips(v);
        }
        if let Some(v) = self.context {
            update = update.context(v);
        }
        if let Some(v) = self.source {
            update = update.source(v);
        }
        if let Some(v) = self.difficulty {
            let level: DifficultyLevel = v.parse().map_err(anyhow::Error::msg)?;
            update = update.difficulty(level);
        }
        Ok(update)
    }
}

/// Render words as a table.
pub fn word_table<'a>(words: impl IntoIterator<Item = &'a Word>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Id",
        "Word",
        "Status",
        "Complete",
        "Reviews",
        "Definition",
    ]);
    for word in words {
        let data = &word.learning_data;
        table.add_row(vec![
            Cell::new(short_id(&word.id)),
            Cell::new(&word.headword),
            Cell::new(word.status),
            Cell::new(format!("{:.0}%", word.completeness() * 100.0)),
            Cell::new(format!("{}/{}", data.correct_count(), data.review_count())),
            Cell::new(&word.core_info.primary_definition),
        ]);
    }
    table
}

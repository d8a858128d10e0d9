//! Typed partial updates.
//!
//! A [`WordUpdate`] carries one optional patch per sub-record. Only fields
//! set to `Some` are written; everything else is left untouched. Status and
//! review counters are not reachable from here.

use crate::model::{DifficultyLevel, Word};

/// Word-level fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordPatch {
    pub headword: Option<String>,
    /// Replaces the whole tag set.
    pub tags: Option<Vec<String>>,
    /// Added to the existing tag set.
    pub add_tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreInfoPatch {
    pub pronunciation: Option<String>,
    pub primary_definition: Option<String>,
    pub part_of_speech: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedInfoPatch {
    pub definitions: Option<Vec<String>>,
    pub examples: Option<Vec<String>>,
    pub synonyms: Option<Vec<String>>,
    pub antonyms: Option<Vec<String>>,
    pub etymology: Option<String>,
    pub memory_tips: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LearningDataPatch {
    pub source: Option<String>,
    pub context: Option<String>,
    pub difficulty: Option<DifficultyLevel>,
}

/// A bundle of per-record patches applied in one step.
///
/// ```
/// use wordhoard_core::WordUpdate;
///
/// let update = WordUpdate::new()
///     .primary_definition("present everywhere")
///     .part_of_speech("adjective")
///     .add_tags(["gre"]);
/// assert!(!update.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordUpdate {
    pub word: WordPatch,
    pub core: CoreInfoPatch,
    pub extended: ExtendedInfoPatch,
    pub learning: LearningDataPatch,
}

fn owned<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl WordUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headword(mut self, headword: impl Into<String>) -> Self {
        self.word.headword = Some(headword.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.word.tags = Some(owned(tags));
        self
    }

    pub fn add_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.word
            .add_tags
            .get_or_insert_with(Vec::new)
            .extend(owned(tags));
        self
    }

    pub fn pronunciation(mut self, value: impl Into<String>) -> Self {
        self.core.pronunciation = Some(value.into());
        self
    }

    pub fn primary_definition(mut self, value: impl Into<String>) -> Self {
        self.core.primary_definition = Some(value.into());
        self
    }

    pub fn part_of_speech(mut self, value: impl Into<String>) -> Self {
        self.core.part_of_speech = Some(value.into());
        self
    }

    pub fn definitions<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extended.definitions = Some(owned(values));
        self
    }

    pub fn examples<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extended.examples = Some(owned(values));
        self
    }

    pub fn synonyms<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extended.synonyms = Some(owned(values));
        self
    }

    pub fn antonyms<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extended.antonyms = Some(owned(values));
        self
    }

    pub fn etymology(mut self, value: impl Into<String>) -> Self {
        self.extended.etymology = Some(value.into());
        self
    }

    pub fn memory_tips(mut self, value: impl Into<String>) -> Self {
        self.extended.memory_tips = Some(value.into());
        self
    }

    pub fn source(mut self, value: impl Into<String>) -> Self {
        self.learning.source = Some(value.into());
        self
    }

    pub fn context(mut self, value: impl Into<String>) -> Self {
        self.learning.context = Some(value.into());
        self
    }

    pub fn difficulty(mut self, value: DifficultyLevel) -> Self {
        self.learning.difficulty = Some(value);
        self
    }

    /// Returns `true` if applying this update would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write every supplied field into `word`.
    ///
    /// An empty replacement headword is ignored so the word keeps a usable
    /// name. Completeness is not refreshed here; the caller owns that step.
    pub fn apply_to(&self, word: &mut Word) {
        let WordPatch {
            headword,
            tags,
            add_tags,
        } = &self.word;
        if let Some(headword) = headword {
            let normalized = crate::model::normalize_headword(headword);
            if !normalized.is_empty() {
                word.headword = normalized;
            }
        }
        if let Some(tags) = tags {
            word.set_tags(tags);
        }
        if let Some(extra) = add_tags {
            word.add_tags(extra);
        }

        let core = &mut word.core_info;
        set(&mut core.pronunciation, &self.core.pronunciation);
        set(&mut core.primary_definition, &self.core.primary_definition);
        set(&mut core.part_of_speech, &self.core.part_of_speech);

        let ext = &mut word.extended_info;
        set(&mut ext.definitions, &self.extended.definitions);
        set(&mut ext.examples, &self.extended.examples);
        set(&mut ext.synonyms, &self.extended.synonyms);
        set(&mut ext.antonyms, &self.extended.antonyms);
        set(&mut ext.etymology, &self.extended.etymology);
        set(&mut ext.memory_tips, &self.extended.memory_tips);

        let learning = &mut word.learning_data;
        set(&mut learning.source, &self.learning.source);
        set(&mut learning.context, &self.learning.context);
        set(&mut learning.difficulty, &self.learning.difficulty);
    }
}

fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

//! Core data model types for wordhoard.
//!
//! A [`Word`] owns its notes and three sub-records: [`CoreInfo`],
//! [`ExtendedInfo`] and [`LearningData`]. Derived values (completeness) are
//! recomputed by the word itself and never set from outside; review counters
//! only move through [`LearningData::record_review`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::timestamp;

/// Default width of a note's single-line form.
pub const DEFAULT_NOTE_WIDTH: usize = 50;

const ELLIPSIS: &str = "...";

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Lifecycle state of a word.
///
/// Variants are declared in lifecycle order, so the derived `Ord` sorts
/// draft words first and mastered words last.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WordStatus {
    #[default]
    Draft,
    Learning,
    Reviewing,
    Mastered,
}

impl WordStatus {
    pub const ALL: [WordStatus; 4] = [
        WordStatus::Draft,
        WordStatus::Learning,
        WordStatus::Reviewing,
        WordStatus::Mastered,
    ];

    /// The state an algorithmic promotion moves to, one step at a time.
    ///
    /// Draft words leave draft only by gaining a primary definition, and
    /// mastered words have nowhere further to go.
    pub fn promoted(self) -> Option<WordStatus> {
        match self {
            WordStatus::Learning => Some(WordStatus::Reviewing),
            WordStatus::Reviewing => Some(WordStatus::Mastered),
            WordStatus::Draft | WordStatus::Mastered => None,
        }
    }

    /// Whether words in this state take part in the review queue.
    pub fn is_reviewable(self) -> bool {
        matches!(self, WordStatus::Learning | WordStatus::Reviewing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WordStatus::Draft => "draft",
            WordStatus::Learning => "learning",
            WordStatus::Reviewing => "reviewing",
            WordStatus::Mastered => "mastered",
        }
    }
}

impl fmt::Display for WordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(WordStatus::Draft),
            "learning" => Ok(WordStatus::Learning),
            "reviewing" => Ok(WordStatus::Reviewing),
            "mastered" => Ok(WordStatus::Mastered),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// How hard the learner finds a word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Medium,
    Hard,
    VeryHard,
}

impl DifficultyLevel {
    /// Map the numeric 1..=4 scale used by older data files.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(DifficultyLevel::Easy),
            2 => Some(DifficultyLevel::Medium),
            3 => Some(DifficultyLevel::Hard),
            4 => Some(DifficultyLevel::VeryHard),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "easy",
            DifficultyLevel::Medium => "medium",
            DifficultyLevel::Hard => "hard",
            DifficultyLevel::VeryHard => "very_hard",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "easy" | "1" => Ok(DifficultyLevel::Easy),
            "medium" | "2" => Ok(DifficultyLevel::Medium),
            "hard" | "3" => Ok(DifficultyLevel::Hard),
            "very_hard" | "veryhard" | "4" => Ok(DifficultyLevel::VeryHard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for DifficultyLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Level(u8),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Level(level) => DifficultyLevel::from_level(level)
                .ok_or_else(|| D::Error::custom(format!("difficulty level out of range: {level}"))),
            Repr::Name(name) => name.parse().map_err(D::Error::custom),
        }
    }
}

/// Self-assessed quality of a single review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Performance {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Performance {
    pub const ALL: [Performance; 4] = [
        Performance::Excellent,
        Performance::Good,
        Performance::Fair,
        Performance::Poor,
    ];

    /// Excellent and good reviews count as correct answers.
    pub fn is_correct(self) -> bool {
        matches!(self, Performance::Excellent | Performance::Good)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Performance::Excellent => "excellent",
            Performance::Good => "good",
            Performance::Fair => "fair",
            Performance::Poor => "poor",
        }
    }
}

impl fmt::Display for Performance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Performance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "excellent" | "e" => Ok(Performance::Excellent),
            "good" | "g" => Ok(Performance::Good),
            "fair" | "f" => Ok(Performance::Fair),
            "poor" | "p" => Ok(Performance::Poor),
            other => Err(format!("unknown performance rating: {other}")),
        }
    }
}

/// Orderings available when listing the collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Headword,
    AddedTime,
    ReviewTime,
    Completeness,
    Status,
    ReviewCount,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Headword => "headword",
            SortKey::AddedTime => "added",
            SortKey::ReviewTime => "reviewed",
            SortKey::Completeness => "completeness",
            SortKey::Status => "status",
            SortKey::ReviewCount => "review_count",
        };
        f.write_str(name)
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "headword" | "word" | "alphabetical" => Ok(SortKey::Headword),
            "added" | "added_time" => Ok(SortKey::AddedTime),
            "reviewed" | "review_time" | "last_reviewed" => Ok(SortKey::ReviewTime),
            "completeness" => Ok(SortKey::Completeness),
            "status" => Ok(SortKey::Status),
            "review_count" | "reviews" => Ok(SortKey::ReviewCount),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

/// A free-text note attached to a word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub content: String,
    #[serde(with = "timestamp::required")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Note {
    pub fn new(content: impl Into<String>, tags: impl IntoIterator<Item = String>) -> Self {
        let mut note_tags: Vec<String> = Vec::new();
        for tag in tags.into_iter().filter_map(|t| normalize_tag(&t)) {
            if !note_tags.contains(&tag) {
                note_tags.push(tag);
            }
        }
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            created_at: Utc::now(),
            tags: note_tags,
        }
    }

    /// Single-line form, at most `max_len` characters, ending in `...` when cut.
    pub fn simplified(&self, max_len: usize) -> String {
        let flat: String = self
            .content
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        if flat.chars().count() <= max_len {
            return flat;
        }
        if max_len < ELLIPSIS.len() {
            return flat.chars().take(max_len).collect();
        }
        let keep = max_len.saturating_sub(ELLIPSIS.len());
        let mut out: String = flat.chars().take(keep).collect();
        out.push_str(ELLIPSIS);
        out
    }

    /// Full form: `[YYYY-MM-DD HH:MM] content #tag1 #tag2`.
    pub fn full(&self) -> String {
        let mut out = format!(
            "[{}] {}",
            self.created_at.format("%Y-%m-%d %H:%M"),
            self.content
        );
        for tag in &self.tags {
            out.push_str(" #");
            out.push_str(tag);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Sub-records
// ---------------------------------------------------------------------------

/// The essentials of a dictionary entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreInfo {
    pub pronunciation: String,
    pub primary_definition: String,
    pub part_of_speech: String,
}

/// Optional enrichment beyond the core entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedInfo {
    pub definitions: Vec<String>,
    pub examples: Vec<String>,
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
    pub etymology: String,
    pub memory_tips: String,
}

/// Provenance and review history of a word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningData {
    #[serde(rename = "added_date", with = "timestamp::required", default = "Utc::now")]
    pub added_at: DateTime<Utc>,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub context: String,
    #[serde(default, with = "timestamp::optional")]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional")]
    pub next_review: Option<DateTime<Utc>>,
    #[serde(default)]
    review_count: u32,
    #[serde(default)]
    correct_count: u32,
    #[serde(default)]
    pub difficulty: DifficultyLevel,
}

fn default_source() -> String {
    "manual_input".to_string()
}

impl Default for LearningData {
    fn default() -> Self {
        Self {
            added_at: Utc::now(),
            source: default_source(),
            context: String::new(),
            last_reviewed: None,
            next_review: None,
            review_count: 0,
            correct_count: 0,
            difficulty: DifficultyLevel::default(),
        }
    }
}

impl LearningData {
    pub fn review_count(&self) -> u32 {
        self.review_count
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    /// Fraction of reviews answered correctly, `None` before the first review.
    pub fn accuracy(&self) -> Option<f64> {
        (self.review_count > 0).then(|| f64::from(self.correct_count) / f64::from(self.review_count))
    }

    /// Count one review. Both counters move together so
    /// `correct_count <= review_count` always holds.
    pub fn record_review(&mut self, correct: bool, at: DateTime<Utc>) {
        self.review_count = self.review_count.saturating_add(1);
        if correct {
            self.correct_count = self.correct_count.saturating_add(1);
        }
        self.last_reviewed = Some(at);
    }

    /// Restore the counter invariant on data that came from outside.
    pub(crate) fn clamp_counts(&mut self) -> bool {
        if self.correct_count > self.review_count {
            self.correct_count = self.review_count;
            return true;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Word
// ---------------------------------------------------------------------------

/// Completeness weights; the score is their sum over present fields divided
/// by [`COMPLETENESS_DIVISOR`], capped at 1.0.
pub mod weights {
    pub const PRONUNCIATION: f64 = 1.5;
    pub const PRIMARY_DEFINITION: f64 = 2.0;
    pub const PART_OF_SPEECH: f64 = 1.0;
    pub const DEFINITIONS: f64 = 1.5;
    pub const EXAMPLES: f64 = 1.5;
    pub const SYNONYMS: f64 = 1.0;
    pub const ETYMOLOGY: f64 = 0.5;
    pub const MEMORY_TIPS: f64 = 0.5;
    pub const NOTES: f64 = 0.5;
}

pub const COMPLETENESS_DIVISOR: f64 = 10.0;

/// A vocabulary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Stable identifier, never changes after creation.
    pub id: Uuid,
    /// Normalized (trimmed, lower-cased) dictionary form.
    #[serde(rename = "word")]
    pub headword: String,
    #[serde(default)]
    pub status: WordStatus,
    #[serde(default)]
    completeness: f64,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub core_info: CoreInfo,
    #[serde(default)]
    pub extended_info: ExtendedInfo,
    #[serde(default)]
    pub learning_data: LearningData,
}

impl Word {
    /// Create a draft word with a fresh identifier.
    pub fn new(headword: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            headword: normalize_headword(headword),
            status: WordStatus::Draft,
            completeness: 0.0,
            tags: BTreeSet::new(),
            notes: Vec::new(),
            core_info: CoreInfo::default(),
            extended_info: ExtendedInfo::default(),
            learning_data: LearningData::default(),
        }
    }

    pub fn completeness(&self) -> f64 {
        self.completeness
    }

    /// Score the informational content of the word from its current fields.
    pub fn compute_completeness(&self) -> f64 {
        let core = &self.core_info;
        let ext = &self.extended_info;
        let present = [
            (!core.pronunciation.is_empty(), weights::PRONUNCIATION),
            (!core.primary_definition.is_empty(), weights::PRIMARY_DEFINITION),
            (!core.part_of_speech.is_empty(), weights::PART_OF_SPEECH),
            (!ext.definitions.is_empty(), weights::DEFINITIONS),
            (!ext.examples.is_empty(), weights::EXAMPLES),
            (!ext.synonyms.is_empty(), weights::SYNONYMS),
            (!ext.etymology.is_empty(), weights::ETYMOLOGY),
            (!ext.memory_tips.is_empty(), weights::MEMORY_TIPS),
            (!self.notes.is_empty(), weights::NOTES),
        ];
        let score: f64 = present
            .iter()
            .filter(|(has, _)| *has)
            .map(|(_, weight)| weight)
            .sum();
        (score / COMPLETENESS_DIVISOR).min(1.0)
    }

    /// Recompute and store completeness. This is its only writer.
    pub fn refresh_completeness(&mut self) -> f64 {
        self.completeness = self.compute_completeness();
        self.completeness
    }

    pub fn has_primary_definition(&self) -> bool {
        !self.core_info.primary_definition.trim().is_empty()
    }

    /// Replace the tag set with the normalized form of `tags`.
    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags.into_iter().filter_map(|t| normalize_tag(t.as_ref())).collect();
    }

    pub fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags
            .extend(tags.into_iter().filter_map(|t| normalize_tag(t.as_ref())));
    }

    /// Due for review: in the review cycle and never scheduled, or scheduled
    /// at or before `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status.is_reviewable()
            && self
                .learning_data
                .next_review
                .map_or(true, |next| next <= now)
    }

    /// Case-insensitive substring match over headword, primary definition,
    /// tags and note contents. `needle` must already be lower-cased.
    pub fn matches(&self, needle: &str) -> bool {
        self.headword.contains(needle)
            || self
                .core_info
                .primary_definition
                .to_lowercase()
                .contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
            || self
                .notes
                .iter()
                .any(|n| n.content.to_lowercase().contains(needle))
    }

    /// Single-line forms of every note, in insertion order.
    pub fn notes_simplified(&self, max_len: usize) -> Vec<String> {
        self.notes.iter().map(|n| n.simplified(max_len)).collect()
    }

    /// Re-establish derived values and invariants on a word read from storage.
    pub(crate) fn normalize_loaded(&mut self) {
        let normalized = normalize_headword(&self.headword);
        if normalized != self.headword {
            self.headword = normalized;
        }
        if self.learning_data.clamp_counts() {
            tracing::warn!(id = %self.id, "correct_count exceeded review_count, clamped");
        }
        self.refresh_completeness();
    }
}

/// Trim and lower-case a headword.
pub fn normalize_headword(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim();
    (!tag.is_empty()).then(|| tag.to_string())
}

fn deserialize_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<String>, D::Error> {
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(raw.iter().filter_map(|t| normalize_tag(t)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn new_word_is_normalized_draft() {
        let word = Word::new("  Ubiquitous ");
        assert_eq!(word.headword, "ubiquitous");
        assert_eq!(word.status, WordStatus::Draft);
        assert_eq!(word.completeness(), 0.0);
        assert_eq!(word.learning_data.review_count(), 0);
    }

    #[test]
    fn completeness_weights() {
        let mut word = Word::new("cat");
        word.core_info.primary_definition = "a small feline".into();
        assert!((word.refresh_completeness() - 0.2).abs() < 1e-9);

        word.core_info.pronunciation = "/kæt/".into();
        word.core_info.part_of_speech = "noun".into();
        word.notes.push(Note::new("seen in a book", Vec::new()));
        // 2 + 1.5 + 1 + 0.5
        assert!((word.refresh_completeness() - 0.5).abs() < 1e-9);

        // antonyms carry no weight
        word.extended_info.antonyms = vec!["dog".into()];
        assert!((word.refresh_completeness() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn completeness_full_word_is_one_and_idempotent() {
        let mut word = Word::new("full");
        word.core_info = CoreInfo {
            pronunciation: "p".into(),
            primary_definition: "d".into(),
            part_of_speech: "n".into(),
        };
        word.extended_info = ExtendedInfo {
            definitions: vec!["d2".into()],
            examples: vec!["e".into()],
            synonyms: vec!["s".into()],
            antonyms: vec![],
            etymology: "et".into(),
            memory_tips: "tip".into(),
        };
        word.notes.push(Note::new("n", Vec::new()));
        let first = word.refresh_completeness();
        let second = word.refresh_completeness();
        assert!((first - 1.0).abs() < 1e-9);
        assert_eq!(first, second);
    }

    #[test]
    fn promotion_is_single_step() {
        assert_eq!(WordStatus::Learning.promoted(), Some(WordStatus::Reviewing));
        assert_eq!(WordStatus::Reviewing.promoted(), Some(WordStatus::Mastered));
        assert_eq!(WordStatus::Mastered.promoted(), None);
        assert_eq!(WordStatus::Draft.promoted(), None);
        assert!(WordStatus::Draft < WordStatus::Learning);
        assert!(WordStatus::Reviewing < WordStatus::Mastered);
    }

    #[test]
    fn record_review_keeps_counter_invariant() {
        let mut data = LearningData::default();
        let now = Utc::now();
        data.record_review(true, now);
        data.record_review(false, now);
        data.record_review(true, now);
        assert_eq!(data.review_count(), 3);
        assert_eq!(data.correct_count(), 2);
        assert_eq!(data.last_reviewed, Some(now));
        assert!((data.accuracy().unwrap() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let mut word = Word::new("tag");
        word.set_tags(["reading", " reading ", "", "gre"]);
        assert_eq!(word.tags.len(), 2);
        word.add_tags(["gre", "toefl"]);
        assert_eq!(
            word.tags.iter().cloned().collect::<Vec<_>>(),
            vec!["gre", "reading", "toefl"]
        );
    }

    #[test]
    fn note_simplified_truncates_on_characters() {
        let note = Note::new("a".repeat(60), Vec::new());
        let short = note.simplified(DEFAULT_NOTE_WIDTH);
        assert_eq!(short.chars().count(), 50);
        assert!(short.ends_with("..."));

        let cjk = Note::new("在经济学人文章中遇到这个词", Vec::new());
        assert_eq!(cjk.simplified(8), "在经济学人...");
        assert_eq!(Note::new("short", Vec::new()).simplified(50), "short");
        assert_eq!(Note::new("two\nlines", Vec::new()).simplified(50), "two lines");
    }

    #[test]
    fn note_simplified_never_exceeds_tiny_widths() {
        let note = Note::new("abcdef", Vec::new());
        assert_eq!(note.simplified(0), "");
        assert_eq!(note.simplified(2), "ab");
        assert_eq!(note.simplified(3), "...");
        assert_eq!(note.simplified(4), "a...");
    }

    #[test]
    fn note_full_display() {
        let mut note = Note::new("met it in an article", vec!["reading".into(), "reading".into()]);
        note.created_at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(note.full(), "[2024-05-06 07:08] met it in an article #reading");
    }

    #[test]
    fn due_only_in_review_cycle() {
        let now = Utc::now();
        let mut word = Word::new("due");
        assert!(!word.is_due(now), "draft words are never due");

        word.status = WordStatus::Learning;
        assert!(word.is_due(now), "unscheduled learning word is due");

        word.learning_data.next_review = Some(now + Duration::hours(1));
        assert!(!word.is_due(now));
        word.learning_data.next_review = Some(now);
        assert!(word.is_due(now));

        word.status = WordStatus::Mastered;
        assert!(!word.is_due(now + Duration::days(10)));
    }

    #[test]
    fn enum_parsing() {
        assert_eq!("E".parse::<Performance>().unwrap(), Performance::Excellent);
        assert_eq!("poor".parse::<Performance>().unwrap(), Performance::Poor);
        assert!("meh".parse::<Performance>().is_err());
        assert_eq!("very-hard".parse::<DifficultyLevel>().unwrap(), DifficultyLevel::VeryHard);
        assert_eq!("review_time".parse::<SortKey>().unwrap(), SortKey::ReviewTime);
        assert_eq!("Mastered".parse::<WordStatus>().unwrap(), WordStatus::Mastered);
    }

    #[test]
    fn legacy_record_loads() {
        let json = r#"{
            "id": "6f1c5a3e-4b7d-4d1e-9a55-2b0b8c1f7e10",
            "word": "Serendipity",
            "status": "learning",
            "completeness": 0.9,
            "tags": ["gre", "gre", " "],
            "notes": [{
                "id": "0a3b6f3c-8f9e-4d44-9a11-7b2f1c2d3e4f",
                "content": "found by chance",
                "created_at": "2024-01-02T03:04:05.678901",
                "tags": []
            }],
            "core_info": {"pronunciation": "", "primary_definition": "happy accident", "part_of_speech": ""},
            "extended_info": {"definitions": [], "examples": [], "synonyms": [], "antonyms": [], "etymology": "", "memory_tips": ""},
            "learning_data": {
                "added_date": "2024-01-01T10:00:00",
                "source": "manual_input",
                "context": "",
                "last_reviewed": "",
                "next_review": "not a date",
                "review_count": 2,
                "correct_count": 5,
                "difficulty": 3
            }
        }"#;
        let mut word: Word = serde_json::from_str(json).unwrap();
        word.normalize_loaded();

        assert_eq!(word.headword, "serendipity");
        assert_eq!(word.tags.len(), 1);
        assert_eq!(word.learning_data.difficulty, DifficultyLevel::Hard);
        assert_eq!(word.learning_data.last_reviewed, None);
        assert_eq!(word.learning_data.next_review, None, "malformed means unset");
        assert_eq!(word.learning_data.correct_count(), 2, "clamped to review_count");
        // stored 0.9 is not authoritative: definition 2 + note 0.5
        assert!((word.completeness() - 0.25).abs() < 1e-9);
        assert!(word.is_due(Utc::now()));
    }

    #[test]
    fn difficulty_rejects_out_of_range_level() {
        assert!(serde_json::from_str::<DifficultyLevel>("9").is_err());
        assert_eq!(
            serde_json::from_str::<DifficultyLevel>("\"very_hard\"").unwrap(),
            DifficultyLevel::VeryHard
        );
        assert_eq!(serde_json::to_string(&DifficultyLevel::VeryHard).unwrap(), "\"very_hard\"");
    }
}

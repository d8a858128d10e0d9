//! Aggregate statistics over the collection.
//!
//! Always computed from the live words; nothing here is cached.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Word, WordStatus};

/// A point-in-time summary of the collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionStats {
    pub total_words: usize,
    /// Count per status; every status is present, possibly with zero.
    pub by_status: BTreeMap<WordStatus, usize>,
    pub average_completeness: f64,
    pub due_for_review: usize,
    pub total_notes: usize,
    pub last_added: Option<DateTime<Utc>>,
    /// Most recent review, ignoring words never reviewed.
    pub last_reviewed: Option<DateTime<Utc>>,
    /// Distinct tags across all words.
    pub total_tags: usize,
    pub total_reviews: u64,
    pub total_correct: u64,
}

impl CollectionStats {
    pub fn count(&self, status: WordStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Overall accuracy across every review, `None` before the first one.
    pub fn accuracy(&self) -> Option<f64> {
        (self.total_reviews > 0).then(|| self.total_correct as f64 / self.total_reviews as f64)
    }
}

/// Compute statistics for `words` as of `now`.
pub fn compute_stats<'a, I>(words: I, now: DateTime<Utc>) -> CollectionStats
where
    I: IntoIterator<Item = &'a Word>,
{
    let mut by_status: BTreeMap<WordStatus, usize> =
        WordStatus::ALL.iter().map(|s| (*s, 0)).collect();
    let mut tags: BTreeSet<&str> = BTreeSet::new();
    let mut stats = CollectionStats {
        total_words: 0,
        by_status: BTreeMap::new(),
        average_completeness: 0.0,
        due_for_review: 0,
        total_notes: 0,
        last_added: None,
        last_reviewed: None,
        total_tags: 0,
        total_reviews: 0,
        total_correct: 0,
    };
    let mut completeness_sum = 0.0;

    for word in words {
        let data = &word.learning_data;
        stats.total_words += 1;
        *by_status.entry(word.status).or_insert(0) += 1;
        completeness_sum += word.completeness();
        if word.is_due(now) {
            stats.due_for_review += 1;
        }
        stats.total_notes += word.notes.len();
        stats.last_added = stats.last_added.max(Some(data.added_at));
        if data.last_reviewed.is_some() {
            stats.last_reviewed = stats.last_reviewed.max(data.last_reviewed);
        }
        tags.extend(word.tags.iter().map(String::as_str));
        stats.total_reviews += u64::from(data.review_count());
        stats.total_correct += u64::from(data.correct_count());
    }

    if stats.total_words > 0 {
        stats.average_completeness = completeness_sum / stats.total_words as f64;
    }
    stats.by_status = by_status;
    stats.total_tags = tags.len();
    stats
}

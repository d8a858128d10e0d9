//! Search ranking and pagination over a snapshot of the collection.
//!
//! Everything here is pure: it takes borrowed words and returns owned
//! results, so the orchestrator can run it under its lock without side
//! effects.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{SortKey, Word};

/// One page of a sorted listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number that was requested.
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_count: usize,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.page >= self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            total_count: self.total_count,
        }
    }
}

/// Deterministic base order: oldest first, identifier as tie-breaker.
///
/// Sorting starts from this order so equal keys always come out the same
/// way regardless of hash-map iteration.
pub fn stable_order<'a, I>(words: I) -> Vec<&'a Word>
where
    I: IntoIterator<Item = &'a Word>,
{
    let mut ordered: Vec<&Word> = words.into_iter().collect();
    ordered.sort_by(|a, b| {
        a.learning_data
            .added_at
            .cmp(&b.learning_data.added_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    ordered
}

/// Rank words matching `query`, best first, at most `limit` of them.
///
/// Ranking keys, highest priority first: exact headword match, headword
/// contains the query, completeness. An empty query matches nothing.
pub fn search<'a, I>(words: I, query: &str, limit: usize) -> Vec<&'a Word>
where
    I: IntoIterator<Item = &'a Word>,
{
    let needle = query.trim().to_lowercase();
    if needle.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut hits: Vec<&Word> = stable_order(words)
        .into_iter()
        .filter(|w| w.matches(&needle))
        .collect();

    let rank = |w: &Word| (w.headword == needle, w.headword.contains(&needle));
    hits.sort_by(|a, b| {
        rank(b)
            .cmp(&rank(a))
            .then_with(|| b.completeness().total_cmp(&a.completeness()))
    });
    hits.truncate(limit);
    hits
}

fn review_time(word: &Word) -> DateTime<Utc> {
    word.learning_data
        .last_reviewed
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn compare(key: SortKey, a: &Word, b: &Word) -> Ordering {
    match key {
        SortKey::Headword => a.headword.cmp(&b.headword),
        SortKey::AddedTime => a.learning_data.added_at.cmp(&b.learning_data.added_at),
        SortKey::ReviewTime => review_time(a).cmp(&review_time(b)),
        SortKey::Completeness => a.completeness().total_cmp(&b.completeness()),
        SortKey::Status => a.status.cmp(&b.status),
        SortKey::ReviewCount => a
            .learning_data
            .review_count()
            .cmp(&b.learning_data.review_count()),
    }
}

/// Sort every word by `key` and cut out page `page` (1-based).
///
/// Pages past the end, page 0 and a page size of 0 all yield an empty slice.
pub fn paginate<'a, I>(
    words: I,
    page: usize,
    page_size: usize,
    key: SortKey,
    reverse: bool,
) -> Page<&'a Word>
where
    I: IntoIterator<Item = &'a Word>,
{
    let mut sorted = stable_order(words);
    let total_count = sorted.len();
    let total_pages = if page_size == 0 {
        0
    } else {
        total_count.div_ceil(page_size)
    };

    // Reversing the comparator (not the output) keeps ties in base order.
    sorted.sort_by(|a, b| {
        let ordering = compare(key, a, b);
        if reverse {
            ordering.reverse()
        } else {
            ordering
        }
    });

    let items = if page == 0 || page_size == 0 {
        Vec::new()
    } else {
        let start = (page - 1).saturating_mul(page_size);
        sorted.into_iter().skip(start).take(page_size).collect()
    };

    Page {
        items,
        page,
        page_size,
        total_pages,
        total_count,
    }
}

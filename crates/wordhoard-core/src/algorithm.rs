//! Spaced-repetition scheduling algorithms.
//!
//! [`SimpleSpacedRepetition`] scales a per-rating base interval by review
//! count and accuracy. [`Sm2Algorithm`] follows the SuperMemo 2 interval
//! progression (1 day, 6 days, then geometric growth by an ease factor).
//! Both share one promotion rule, [`MasteryPolicy`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::config::{AlgorithmKind, BaseIntervals, VocabConfig, MAX_INTERVAL_DAYS};
use crate::model::{Performance, Word};
use crate::traits::LearningAlgorithm;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Ceiling of the review-count multiplier.
const MAX_REVIEW_MULTIPLIER: f64 = 3.0;

/// Floor of the accuracy multiplier.
const MIN_ACCURACY_MULTIPLIER: f64 = 0.5;

/// Convert a fractional number of days into a duration, to the millisecond.
///
/// Clamped to `[0, MAX_INTERVAL_DAYS]`; NaN counts as zero.
pub fn days(value: f64) -> Duration {
    let value = if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_INTERVAL_DAYS)
    };
    Duration::milliseconds((value * MS_PER_DAY).round() as i64)
}

/// `now` plus `interval` days, saturating at the latest representable instant.
pub fn schedule_after(now: DateTime<Utc>, interval: f64) -> DateTime<Utc> {
    now.checked_add_signed(days(interval))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Promotion rule: enough reviews, at high enough accuracy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasteryPolicy {
    pub review_count: u32,
    pub threshold: f64,
}

impl Default for MasteryPolicy {
    fn default() -> Self {
        Self {
            review_count: 3,
            threshold: 0.8,
        }
    }
}

impl MasteryPolicy {
    pub fn from_config(config: &VocabConfig) -> Self {
        Self {
            review_count: config.mastery_review_count,
            threshold: config.mastery_threshold,
        }
    }

    pub fn is_met(&self, word: &Word) -> bool {
        let data = &word.learning_data;
        if data.review_count() < self.review_count {
            return false;
        }
        data.accuracy()
            .is_some_and(|accuracy| accuracy >= self.threshold)
    }
}

// ---------------------------------------------------------------------------
// Simple
// ---------------------------------------------------------------------------

/// Base interval × review multiplier × accuracy multiplier, capped.
#[derive(Debug, Clone)]
pub struct SimpleSpacedRepetition {
    base_intervals: BaseIntervals,
    max_interval_days: f64,
    mastery: MasteryPolicy,
}

impl Default for SimpleSpacedRepetition {
    fn default() -> Self {
        Self::from_config(&VocabConfig::default())
    }
}

impl SimpleSpacedRepetition {
    pub fn from_config(config: &VocabConfig) -> Self {
        Self {
            base_intervals: config.base_intervals.clone(),
            max_interval_days: config.max_interval_days,
            mastery: MasteryPolicy::from_config(config),
        }
    }

    /// Interval in days for the word's current history.
    pub fn interval_days(&self, word: &Word, performance: Performance) -> f64 {
        let data = &word.learning_data;
        let base = self.base_intervals.get(performance);

        let review_count = f64::from(data.review_count());
        let review_multiplier = (review_count * 0.3 + 1.0).min(MAX_REVIEW_MULTIPLIER);

        let accuracy_multiplier = data
            .accuracy()
            .map_or(1.0, |accuracy| (accuracy * 1.5).max(MIN_ACCURACY_MULTIPLIER));

        (base * review_multiplier * accuracy_multiplier).min(self.max_interval_days)
    }
}

impl LearningAlgorithm for SimpleSpacedRepetition {
    fn name(&self) -> &str {
        "simple"
    }

    fn calculate_next_review(
        &self,
        word: &Word,
        performance: Performance,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        schedule_after(now, self.interval_days(word, performance))
    }

    fn should_promote_status(&self, word: &Word) -> bool {
        self.mastery.is_met(word)
    }
}

// ---------------------------------------------------------------------------
// SM-2
// ---------------------------------------------------------------------------

/// Starting ease factor.
const DEFAULT_EASE: f64 = 2.5;

/// Minimum ease factor allowed.
const MIN_EASE: f64 = 1.3;

/// Ease lost per incorrect answer.
const LAPSE_PENALTY: f64 = 0.2;

/// SuperMemo 2 quality (0..=5) for a rating.
fn quality(performance: Performance) -> u8 {
    match performance {
        Performance::Excellent => 5,
        Performance::Good => 4,
        Performance::Fair => 3,
        Performance::Poor => 1,
    }
}

/// SM-2-style scheduling.
///
/// No ease factor is persisted, so it is derived from the word's history:
/// the default ease, minus a penalty per incorrect answer, plus the usual
/// SM-2 adjustment for this rating, never below 1.3.
#[derive(Debug, Clone)]
pub struct Sm2Algorithm {
    max_interval_days: f64,
    mastery: MasteryPolicy,
}

impl Default for Sm2Algorithm {
    fn default() -> Self {
        Self::from_config(&VocabConfig::default())
    }
}

impl Sm2Algorithm {
    pub fn from_config(config: &VocabConfig) -> Self {
        Self {
            max_interval_days: config.max_interval_days,
            mastery: MasteryPolicy::from_config(config),
        }
    }

    pub fn ease_factor(&self, word: &Word, performance: Performance) -> f64 {
        let data = &word.learning_data;
        let lapses = f64::from(data.review_count() - data.correct_count());
        // EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
        let miss = f64::from(5 - quality(performance));
        let adjustment = 0.1 - miss * (0.08 + miss * 0.02);
        (DEFAULT_EASE - lapses * LAPSE_PENALTY + adjustment).max(MIN_EASE)
    }

    pub fn interval_days(&self, word: &Word, performance: Performance) -> f64 {
        if quality(performance) < 3 {
            return 1.0_f64.min(self.max_interval_days);
        }
        let interval = match word.learning_data.review_count() {
            0 | 1 => 1.0,
            2 => 6.0,
            n => {
                let ease = self.ease_factor(word, performance);
                let exponent = i32::try_from(n - 2).unwrap_or(i32::MAX);
                6.0 * ease.powi(exponent)
            }
        };
        interval.min(self.max_interval_days)
    }
}

impl LearningAlgorithm for Sm2Algorithm {
    fn name(&self) -> &str {
        "sm2"
    }

    fn calculate_next_review(
        &self,
        word: &Word,
        performance: Performance,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        schedule_after(now, self.interval_days(word, performance))
    }

    fn should_promote_status(&self, word: &Word) -> bool {
        self.mastery.is_met(word)
    }
}

/// Build the algorithm named in the configuration.
pub fn algorithm_from_config(config: &VocabConfig) -> Arc<dyn LearningAlgorithm> {
    match config.algorithm {
        AlgorithmKind::Simple => Arc::new(SimpleSpacedRepetition::from_config(config)),
        AlgorithmKind::Sm2 => Arc::new(Sm2Algorithm::from_config(config)),
    }
}

//! Shared risk thresholds and single-entry predicates.
//!
//! Both the write-time classifier and the dashboard aggregator evaluate
//! entries through this module so the boundaries live in one place.

use serde::{Deserialize, Serialize};

use crate::models::Entry;

/// Mood at or below this value is "very low".
pub const VERY_LOW_MOOD: i32 = 1;
/// Mood at or below this value raises a `high` write-time flag.
pub const HIGH_RISK_MOOD: i32 = 2;
/// Mood at or below this value counts as a low-mood entry.
pub const LOW_MOOD: i32 = 3;
/// Anxiety or stress at or above this value is "extreme".
pub const EXTREME_SCORE: i32 = 9;
/// A drop strictly greater than this between the two latest entries is a decline.
pub const MOOD_DECLINE_POINTS: i32 = 3;
/// Number of most-recent entries that must all be low for a streak.
pub const CONSECUTIVE_LOW_MOOD: usize = 3;
/// Low-mood entries in the window needed, with a streak, for a `high` alert.
pub const HIGH_LOW_MOOD_COUNT: usize = 3;
/// Low-mood entries in the window that raise a `medium` alert.
pub const MEDIUM_LOW_MOOD_COUNT: usize = 2;
/// Trailing window, in days, used by the dashboard.
pub const RISK_WINDOW_DAYS: i64 = 7;

pub const DEFAULT_RISK_PHRASES: &[&str] = &[
    "suicide",
    "suicidal",
    "kill myself",
    "end my life",
    "want to die",
    "better off dead",
    "no reason to live",
    "hurt myself",
    "self-harm",
    "self harm",
];

/// Configured set of self-harm phrases, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskPhrases {
    phrases: Vec<String>,
}

impl RiskPhrases {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        normalized.sort();
        normalized.dedup();
        Self { phrases: normalized }
    }

    pub fn matches(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.phrases.iter().any(|p| lowered.contains(p.as_str()))
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl Default for RiskPhrases {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_PHRASES.iter().copied())
    }
}

pub fn is_very_low_mood(mood: i32) -> bool {
    mood <= VERY_LOW_MOOD
}

pub fn is_low_mood(mood: i32) -> bool {
    mood <= LOW_MOOD
}

pub fn is_extreme(score: i32) -> bool {
    score >= EXTREME_SCORE
}

/// Predicates evaluated against a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntrySignals {
    pub has_risk_phrase: bool,
    pub very_low_mood: bool,
    pub extreme_anxiety: bool,
    pub extreme_stress: bool,
}

impl EntrySignals {
    pub fn evaluate(entry: &Entry, phrases: &RiskPhrases) -> Self {
        Self {
            has_risk_phrase: phrases.matches(entry.text.as_deref().unwrap_or("")),
            very_low_mood: entry.valid_mood().is_some_and(is_very_low_mood),
            extreme_anxiety: entry.valid_anxiety().is_some_and(is_extreme),
            extreme_stress: entry.valid_stress().is_some_and(is_extreme),
        }
    }

    pub fn is_critical(&self) -> bool {
        self.has_risk_phrase
            || (self.very_low_mood && (self.extreme_anxiety || self.extreme_stress))
    }
}

//! Domain models: quiz items, per-session presentations, attempt history,
//! per-item counters and the derived user statistics.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QuizError;

/// Which pool a quiz (and its attempt record) belongs to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
  Words,
  Sentences,
}

impl ItemKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ItemKind::Words => "words",
      ItemKind::Sentences => "sentences",
    }
  }
}

impl fmt::Display for ItemKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ItemKind {
  type Err = QuizError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "words" => Ok(ItemKind::Words),
      "sentences" => Ok(ItemKind::Sentences),
      other => Err(QuizError::InvalidArgument(format!("unknown item type '{other}'"))),
    }
  }
}

/// One entry of the static pool. Immutable once loaded.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizItem {
  pub id: u32,
  /// Chinese word or sentence shown to the learner.
  pub prompt: String,
  #[serde(default)]
  pub pinyin: String,
  /// English translation; must appear exactly once among `options`.
  pub correct_text: String,
  pub options: Vec<String>,
}

/// A per-request copy of a `QuizItem` with shuffled options.
/// Invariant: `options[correct_index]` matches `correct_text`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizSessionItem {
  pub id: u32,
  pub prompt: String,
  pub pinyin: String,
  pub correct_text: String,
  pub options: Vec<String>,
  pub correct_index: usize,
}

/// One completed quiz, as submitted by its owner. Never mutated after storage.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
  pub id: Uuid,
  pub item_type: ItemKind,
  pub correct_count: u32,
  pub total_count: u32,
  pub time_taken_seconds: u32,
  pub timestamp: DateTime<Utc>,
}

impl AttemptRecord {
  pub fn new(item_type: ItemKind, correct_count: u32, total_count: u32, time_taken_seconds: u32, timestamp: DateTime<Utc>) -> Self {
    Self { id: Uuid::new_v4(), item_type, correct_count, total_count, time_taken_seconds, timestamp }
  }

  pub fn incorrect_count(&self) -> u32 {
    self.total_count.saturating_sub(self.correct_count)
  }

  /// Score of this attempt in percent (0 for an empty quiz).
  pub fn percentage(&self) -> f64 {
    if self.total_count == 0 { 0.0 } else { 100.0 * self.correct_count as f64 / self.total_count as f64 }
  }

  pub fn is_perfect(&self) -> bool {
    self.total_count > 0 && self.correct_count == self.total_count
  }
}

/// Running answer tally for a single vocabulary item.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerformanceCounter {
  pub correct: u32,
  pub incorrect: u32,
}

impl PerformanceCounter {
  pub fn total(&self) -> u32 {
    self.correct + self.incorrect
  }

  pub fn record(&mut self, was_correct: bool) {
    if was_correct { self.correct += 1 } else { self.incorrect += 1 }
  }
}

/// Per-item counters of one user, keyed by the item's prompt text.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerformanceCounters {
  #[serde(default)]
  pub words: BTreeMap<String, PerformanceCounter>,
  #[serde(default)]
  pub sentences: BTreeMap<String, PerformanceCounter>,
}

impl PerformanceCounters {
  pub fn for_kind_mut(&mut self, kind: ItemKind) -> &mut BTreeMap<String, PerformanceCounter> {
    match kind {
      ItemKind::Words => &mut self.words,
      ItemKind::Sentences => &mut self.sentences,
    }
  }
}

/// Learner tier derived from mastery counts and accuracy.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Level {
  #[serde(rename = "HSK1 Expert")]
  Expert,
  #[serde(rename = "HSK1 Advanced")]
  Advanced,
  #[serde(rename = "HSK1 Intermediate")]
  Intermediate,
  #[serde(rename = "HSK1 Learner")]
  Learner,
  #[serde(rename = "HSK1 Beginner")]
  Beginner,
}

/// Snapshot derived from a user's history. Recomputed on every read.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
  pub words_mastered: u32,
  pub sentences_mastered: u32,
  /// Integer percent, 0..=100.
  pub accuracy_rate: u32,
  pub streak_days: u32,
  pub total_score: u64,
  pub level: Level,
}

//! Statistics aggregation: turn a user's attempt history and per-item
//! counters into one deterministic `UserStats` snapshot.
//!
//! There is exactly one scoring formula (`SCORING_VERSION`). Weights live in
//! a `Scoring` value owned by the application state so every caller shares
//! them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AttemptRecord, ItemKind, Level, PerformanceCounter, PerformanceCounters, UserStats};

pub const SCORING_VERSION: &str = "hsk1-score.v1";

/// Targets used for the progress bars on the profile page.
pub const WORDS_TARGET: u32 = 150;
pub const SENTENCES_TARGET: u32 = 100;
pub const STREAK_TARGET: u32 = 7;

/// Points per unit of each component of the composite score.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScoreWeights {
  pub word: u32,
  pub sentence: u32,
  pub streak: u32,
  pub accuracy: u32,
}

impl ScoreWeights {
  pub const CANONICAL: ScoreWeights = ScoreWeights { word: 10, sentence: 15, streak: 5, accuracy: 2 };
}

impl Default for ScoreWeights {
  fn default() -> Self {
    Self::CANONICAL
  }
}

/// Everything the aggregator needs besides the user's own data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scoring {
  pub weights: ScoreWeights,
  /// An item is mastered once its accuracy reaches this percentage.
  pub mastery_threshold_percent: u32,
}

impl Default for Scoring {
  fn default() -> Self {
    Self { weights: ScoreWeights::CANONICAL, mastery_threshold_percent: 70 }
  }
}

struct LevelTier {
  level: Level,
  min_words: u32,
  min_sentences: u32,
  min_accuracy: u32,
}

// Highest first; the first tier whose thresholds all hold wins.
const LEVEL_TIERS: [LevelTier; 4] = [
  LevelTier { level: Level::Expert, min_words: 140, min_sentences: 90, min_accuracy: 90 },
  LevelTier { level: Level::Advanced, min_words: 120, min_sentences: 75, min_accuracy: 85 },
  LevelTier { level: Level::Intermediate, min_words: 80, min_sentences: 50, min_accuracy: 75 },
  LevelTier { level: Level::Learner, min_words: 40, min_sentences: 25, min_accuracy: 0 },
];

/// Derive the full stats snapshot. `now` is the single clock reading used for
/// the streak; everything else depends on the inputs alone.
pub fn compute_stats(
  attempts: &[AttemptRecord],
  counters: &PerformanceCounters,
  scoring: &Scoring,
  now: DateTime<Utc>,
) -> UserStats {
  let words_mastered = mastered_count(&counters.words, scoring.mastery_threshold_percent);
  let sentences_mastered = mastered_count(&counters.sentences, scoring.mastery_threshold_percent);
  let accuracy_rate = accuracy_rate(attempts);
  let streak_days = streak_days(attempts, now.date_naive());

  let w = scoring.weights;
  let total_score = u64::from(words_mastered) * u64::from(w.word)
    + u64::from(sentences_mastered) * u64::from(w.sentence)
    + u64::from(streak_days) * u64::from(w.streak)
    + u64::from(accuracy_rate) * u64::from(w.accuracy);

  UserStats {
    words_mastered,
    sentences_mastered,
    accuracy_rate,
    streak_days,
    total_score,
    level: level_for(words_mastered, sentences_mastered, accuracy_rate),
  }
}

/// Number of items whose accuracy meets the threshold. Unanswered items never count.
pub fn mastered_count(items: &BTreeMap<String, PerformanceCounter>, threshold_percent: u32) -> u32 {
  let mastered = items
    .values()
    .filter(|c| c.total() > 0 && u64::from(c.correct) * 100 >= u64::from(threshold_percent) * u64::from(c.total()))
    .count();
  u32::try_from(mastered).unwrap_or(u32::MAX)
}

/// Overall accuracy in whole percent, rounded half-up; 0 when nothing was answered.
pub fn accuracy_rate(attempts: &[AttemptRecord]) -> u32 {
  let (correct, total) = attempts.iter().fold((0u64, 0u64), |(c, t), a| {
    (c + u64::from(a.correct_count.min(a.total_count)), t + u64::from(a.total_count))
  });
  if total == 0 {
    return 0;
  }
  ((200 * correct + total) / (2 * total)) as u32
}

/// Consecutive UTC calendar days with at least one attempt, ending `today`.
/// Zero when there is no attempt today. Attempts dated after `today` are ignored.
pub fn streak_days(attempts: &[AttemptRecord], today: NaiveDate) -> u32 {
  let days: BTreeSet<NaiveDate> = attempts.iter().map(|a| a.timestamp.date_naive()).collect();
  if !days.contains(&today) {
    return 0;
  }

  let mut streak = 0;
  let mut day = today;
  while days.contains(&day) {
    streak += 1;
    match day.checked_sub_days(Days::new(1)) {
      Some(prev) => day = prev,
      None => break,
    }
  }
  streak
}

pub fn level_for(words: u32, sentences: u32, accuracy: u32) -> Level {
  LEVEL_TIERS
    .iter()
    .find(|t| words >= t.min_words && sentences >= t.min_sentences && accuracy >= t.min_accuracy)
    .map(|t| t.level)
    .unwrap_or(Level::Beginner)
}

/// Aggregate numbers over a user's quiz history.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
  pub total_quizzes: u32,
  pub average_percentage: f64,
  pub total_time_seconds: u64,
  pub best_percentage: f64,
  pub worst_percentage: f64,
  pub total_correct: u64,
  pub total_incorrect: u64,
  pub accuracy_rate: f64,
}

fn round2(x: f64) -> f64 {
  (x * 100.0).round() / 100.0
}

/// Summarize attempts, optionally restricted to one item kind.
pub fn summarize_history(attempts: &[AttemptRecord], kind: Option<ItemKind>) -> HistorySummary {
  let selected: Vec<&AttemptRecord> = attempts.iter().filter(|a| kind.map_or(true, |k| a.item_type == k)).collect();
  if selected.is_empty() {
    return HistorySummary::default();
  }

  let percentages: Vec<f64> = selected.iter().map(|a| a.percentage()).collect();
  let total_correct: u64 = selected.iter().map(|a| u64::from(a.correct_count.min(a.total_count))).sum();
  let total_incorrect: u64 = selected.iter().map(|a| u64::from(a.incorrect_count())).sum();
  let answered = total_correct + total_incorrect;

  HistorySummary {
    total_quizzes: selected.len() as u32,
    average_percentage: round2(percentages.iter().sum::<f64>() / percentages.len() as f64),
    total_time_seconds: selected.iter().map(|a| u64::from(a.time_taken_seconds)).sum(),
    best_percentage: round2(percentages.iter().copied().fold(f64::MIN, f64::max)),
    worst_percentage: round2(percentages.iter().copied().fold(f64::MAX, f64::min)),
    total_correct,
    total_incorrect,
    accuracy_rate: if answered == 0 { 0.0 } else { round2(100.0 * total_correct as f64 / answered as f64) },
  }
}

/// Attempts of one UTC calendar day.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DayGroup {
  pub date: NaiveDate,
  pub attempts: Vec<AttemptRecord>,
}

/// Group attempts by UTC date, newest day first, newest attempt first within a day.
pub fn group_by_date(attempts: &[AttemptRecord]) -> Vec<DayGroup> {
  let mut by_day: BTreeMap<NaiveDate, Vec<AttemptRecord>> = BTreeMap::new();
  for a in attempts {
    by_day.entry(a.timestamp.date_naive()).or_default().push(a.clone());
  }
  by_day
    .into_iter()
    .rev()
    .map(|(date, mut attempts)| {
      attempts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
      DayGroup { date, attempts }
    })
    .collect()
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct ProgressBar {
  pub current: u32,
  pub total: u32,
  pub percentage: u32,
}

impl ProgressBar {
  fn new(current: u32, total: u32) -> Self {
    let percentage = if total == 0 { 0 } else { ((u64::from(current) * 100 + u64::from(total) / 2) / u64::from(total)).min(100) as u32 };
    Self { current, total, percentage }
  }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct LearningProgress {
  pub words: ProgressBar,
  pub sentences: ProgressBar,
  pub streak: ProgressBar,
}

pub fn progress(stats: &UserStats) -> LearningProgress {
  LearningProgress {
    words: ProgressBar::new(stats.words_mastered, WORDS_TARGET),
    sentences: ProgressBar::new(stats.sentences_mastered, SENTENCES_TARGET),
    streak: ProgressBar::new(stats.streak_days, STREAK_TARGET),
  }
}

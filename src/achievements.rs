//! Achievements derived from stats and history. Nothing here is stored;
//! the list is recomputed alongside `UserStats`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{AttemptRecord, UserStats};

pub const WORD_MASTER_GOAL: u32 = 100;
pub const SENTENCE_BUILDER_GOAL: u32 = 50;
pub const WEEK_WARRIOR_GOAL: u32 = 7;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
  pub id: &'static str,
  pub name: &'static str,
  pub description: &'static str,
  pub icon: &'static str,
  pub unlocked: bool,
  /// 0..=100
  pub progress: u32,
  /// Known only for history-based achievements.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub unlocked_on: Option<NaiveDate>,
}

fn percent_of(current: u32, goal: u32) -> u32 {
  if goal == 0 {
    return 100;
  }
  ((u64::from(current) * 100) / u64::from(goal)).min(100) as u32
}

fn goal_achievement(id: &'static str, name: &'static str, description: &'static str, icon: &'static str, current: u32, goal: u32) -> Achievement {
  Achievement {
    id,
    name,
    description,
    icon,
    unlocked: current >= goal,
    progress: percent_of(current, goal),
    unlocked_on: None,
  }
}

/// Full achievement list in display order.
pub fn evaluate(stats: &UserStats, attempts: &[AttemptRecord]) -> Vec<Achievement> {
  let first_day = attempts.iter().map(|a| a.timestamp).min().map(|t| t.date_naive());
  let first_perfect = attempts.iter().filter(|a| a.is_perfect()).map(|a| a.timestamp).min().map(|t| t.date_naive());

  vec![
    Achievement {
      id: "first_steps",
      name: "First Steps",
      description: "Complete your first quiz",
      icon: "fas fa-shoe-prints",
      unlocked: first_day.is_some(),
      progress: if first_day.is_some() { 100 } else { 0 },
      unlocked_on: first_day,
    },
    goal_achievement("word_master", "Word Master", "Master 100+ words", "fas fa-book", stats.words_mastered, WORD_MASTER_GOAL),
    goal_achievement(
      "sentence_builder",
      "Sentence Builder",
      "Master 50+ sentences",
      "fas fa-comments",
      stats.sentences_mastered,
      SENTENCE_BUILDER_GOAL,
    ),
    Achievement {
      id: "perfect_score",
      name: "Perfect Score",
      description: "Get 100% on any quiz",
      icon: "fas fa-star",
      unlocked: first_perfect.is_some(),
      progress: if first_perfect.is_some() { 100 } else { 0 },
      unlocked_on: first_perfect,
    },
    goal_achievement("week_warrior", "Week Warrior", "7-day learning streak", "fas fa-fire", stats.streak_days, WEEK_WARRIOR_GOAL),
  ]
}

//! Leaderboard ranking and pagination.
//!
//! The displayed rank is always the position under the `overall` ordering,
//! whatever criterion the page is sorted by. Ties keep input order.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::UserStats;
use crate::error::QuizError;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
  Overall,
  Words,
  Sentences,
  Streak,
  Accuracy,
}

impl Criterion {
  pub fn as_str(&self) -> &'static str {
    match self {
      Criterion::Overall => "overall",
      Criterion::Words => "words",
      Criterion::Sentences => "sentences",
      Criterion::Streak => "streak",
      Criterion::Accuracy => "accuracy",
    }
  }

  fn key(&self, s: &UserStats) -> u64 {
    match self {
      Criterion::Overall => s.total_score,
      Criterion::Words => u64::from(s.words_mastered),
      Criterion::Sentences => u64::from(s.sentences_mastered),
      Criterion::Streak => u64::from(s.streak_days),
      Criterion::Accuracy => u64::from(s.accuracy_rate),
    }
  }
}

impl fmt::Display for Criterion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Criterion {
  type Err = QuizError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "overall" => Ok(Criterion::Overall),
      "words" => Ok(Criterion::Words),
      "sentences" => Ok(Criterion::Sentences),
      "streak" => Ok(Criterion::Streak),
      "accuracy" => Ok(Criterion::Accuracy),
      other => Err(QuizError::InvalidArgument(format!("unknown ranking criterion '{other}'"))),
    }
  }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
  /// 1-based position under the overall ordering.
  pub rank: usize,
  pub user_id: String,
  pub stats: UserStats,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Page {
  pub entries: Vec<RankedEntry>,
  pub total_count: usize,
}

/// Stable descending order of indices into `users` by `criterion`.
fn order(users: &[(String, UserStats)], criterion: Criterion) -> Vec<usize> {
  let mut idx: Vec<usize> = (0..users.len()).collect();
  // sort_by_key is stable, so equal keys keep input order.
  idx.sort_by_key(|&i| std::cmp::Reverse(criterion.key(&users[i].1)));
  idx
}

/// Parse `criterion` and rank. Unknown criteria are an `InvalidArgument`.
pub fn rank(users: &[(String, UserStats)], criterion: &str, offset: usize, limit: usize) -> Result<Page, QuizError> {
  let criterion = criterion.parse::<Criterion>()?;
  Ok(rank_by(users, criterion, offset, limit))
}

pub fn rank_by(users: &[(String, UserStats)], criterion: Criterion, offset: usize, limit: usize) -> Page {
  let mut overall_rank = vec![0usize; users.len()];
  for (pos, i) in order(users, Criterion::Overall).into_iter().enumerate() {
    overall_rank[i] = pos + 1;
  }

  let entries = order(users, criterion)
    .into_iter()
    .skip(offset)
    .take(limit)
    .map(|i| RankedEntry { rank: overall_rank[i], user_id: users[i].0.clone(), stats: users[i].1.clone() })
    .collect();

  Page { entries, total_count: users.len() }
}

/// Overall rank of one user, if present.
pub fn rank_of(users: &[(String, UserStats)], user_id: &str) -> Option<usize> {
  order(users, Criterion::Overall).into_iter().position(|i| users[i].0 == user_id).map(|pos| pos + 1)
}

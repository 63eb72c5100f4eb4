//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Serving quizzes from a learner's round and grading submissions
//!   - Recomputing stats, progress and achievements from a store snapshot
//!   - Result history listings and summaries
//!   - Leaderboard pages and single-user ranks
//!   - Item pool search and inventory
//!
//! `now` is read once per request by the caller and passed down.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::achievements;
use crate::domain::{AttemptRecord, ItemKind, PerformanceCounters, QuizItem, UserStats};
use crate::error::{QuizError, StoreError};
use crate::leaderboard::{rank_by, rank_of, Criterion};
use crate::protocol::*;
use crate::quiz::QuizRound;
use crate::state::AppState;
use crate::stats::{compute_stats, group_by_date, progress, summarize_history, SCORING_VERSION};
use crate::store::{ItemOutcome, UserSnapshot};
use crate::util::{sentence_shape, trunc_for_log};

const SEARCH_LIMIT: usize = 20;
const RESULTS_DEFAULT_LIMIT: usize = 50;

/// Who is calling. Identity comes from an upstream auth layer.
#[derive(Clone, Debug)]
pub struct Caller {
  pub user_id: String,
  pub username: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Quiz(#[from] QuizError),
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error("{0}")]
  NotFound(String),
  #[error("missing user identity")]
  Unauthorized,
}

impl ApiError {
  fn invalid(msg: impl Into<String>) -> Self {
    ApiError::Quiz(QuizError::InvalidArgument(msg.into()))
  }
}

//
// Quiz
//

#[instrument(level = "info", skip(state, rng), fields(user = %caller.user_id, %kind, ?count))]
pub async fn start_quiz<R: Rng + Send>(
  state: &AppState,
  caller: &Caller,
  kind: ItemKind,
  count: Option<i64>,
  rng: &mut R,
) -> Result<QuizOut, ApiError> {
  let requested = count.unwrap_or(state.config.quiz.default_count as i64);
  if requested <= 0 {
    return Err(ApiError::invalid("question count must be positive"));
  }
  let count = (requested as usize).min(state.config.quiz.max_count.max(1));

  state.store.ensure_user(&caller.user_id, caller.username.as_deref()).await?;

  let pool = state.pool(kind);
  let build = {
    let mut rounds = state.rounds.write().await;
    let round = rounds.entry((caller.user_id.clone(), kind)).or_insert_with(QuizRound::new);
    round.next(rng, pool, count)
  };
  let build = build.map_err(|e| {
    error!(target: "quiz", user = %caller.user_id, %kind, error = %e, "Quiz build failed");
    e
  })?;

  info!(target: "quiz", user = %caller.user_id, %kind, served = build.items.len(), new_round = build.reset, "Quiz served");
  Ok(QuizOut { kind, items: build.items, new_round: build.reset, pool_size: pool.len() })
}

#[instrument(level = "info", skip(state, body), fields(user = %caller.user_id, %kind, answers = body.answers.len()))]
pub async fn submit_quiz(
  state: &AppState,
  caller: &Caller,
  kind: ItemKind,
  body: SubmitIn,
  now: DateTime<Utc>,
) -> Result<SubmitOut, ApiError> {
  let (served, selected) = {
    let mut rounds = state.rounds.write().await;
    let round = rounds
      .get_mut(&(caller.user_id.clone(), kind))
      .filter(|r| !r.served().is_empty())
      .ok_or_else(|| ApiError::invalid(format!("no {kind} quiz in progress")))?;

    // Validate before consuming, so a bad request does not lose the quiz.
    let mut selected: HashMap<u32, usize> = HashMap::new();
    for a in &body.answers {
      let item = round
        .served()
        .iter()
        .find(|it| it.id == a.item_id)
        .ok_or_else(|| ApiError::invalid(format!("item {} is not part of this quiz", a.item_id)))?;
      if a.selected_index >= item.options.len() {
        return Err(ApiError::invalid(format!("selected index {} out of range for item {}", a.selected_index, a.item_id)));
      }
      if selected.insert(a.item_id, a.selected_index).is_some() {
        return Err(ApiError::invalid(format!("item {} answered twice", a.item_id)));
      }
    }
    (round.take_served(), selected)
  };

  let mut results = Vec::with_capacity(served.len());
  let mut outcomes = Vec::with_capacity(served.len());
  for item in &served {
    let choice = selected.get(&item.id).copied();
    let correct = choice == Some(item.correct_index);
    outcomes.push(ItemOutcome { prompt: item.prompt.clone(), correct });
    results.push(AnswerResultOut { item_id: item.id, selected_index: choice, correct_index: item.correct_index, correct });
  }

  let correct_count = results.iter().filter(|r| r.correct).count() as u32;
  let attempt = AttemptRecord::new(kind, correct_count, served.len() as u32, body.time_taken_seconds, now);

  let recorded = async {
    state.store.ensure_user(&caller.user_id, caller.username.as_deref()).await?;
    state.store.record_attempt(&caller.user_id, attempt.clone(), &outcomes).await
  }
  .await;
  if let Err(e) = recorded {
    // Nothing was recorded; reopen the quiz so the learner can resubmit.
    if let Some(round) = state.rounds.write().await.get_mut(&(caller.user_id.clone(), kind)) {
      round.restore_served(served);
    }
    error!(target: "quiz", user = %caller.user_id, %kind, error = %e, "Grading not recorded; quiz reopened");
    return Err(e.into());
  }
  info!(target: "quiz", user = %caller.user_id, %kind, correct = correct_count, total = served.len(), "Quiz graded");

  let stats = stats_for(state, &caller.user_id, now).await.1;
  Ok(SubmitOut { attempt, results, stats })
}

/// End the caller's quiz session: forget served ids and any open quiz.
#[instrument(level = "info", skip(state), fields(user = %caller.user_id))]
pub async fn end_session(state: &AppState, caller: &Caller) -> SessionEndOut {
  let rounds_dropped = state.end_session(&caller.user_id).await;
  info!(target: "quiz", user = %caller.user_id, rounds_dropped, "Quiz session ended");
  SessionEndOut { rounds_dropped }
}

//
// Profile
//

/// Stats of one user from a single store snapshot; unknown users get empty history.
async fn stats_for(state: &AppState, user_id: &str, now: DateTime<Utc>) -> (UserSnapshot, UserStats) {
  let snap = state.store.snapshot(user_id).await.unwrap_or_else(|| UserSnapshot {
    user_id: user_id.to_string(),
    username: "Anonymous".into(),
    attempts: Vec::new(),
    counters: PerformanceCounters::default(),
  });
  let stats = compute_stats(&snap.attempts, &snap.counters, &state.scoring, now);
  (snap, stats)
}

#[instrument(level = "info", skip(state), fields(user = %caller.user_id))]
pub async fn user_stats(state: &AppState, caller: &Caller, now: DateTime<Utc>) -> StatsOut {
  let (snap, stats) = stats_for(state, &caller.user_id, now).await;
  StatsOut { user_id: snap.user_id, username: snap.username, progress: progress(&stats), stats, scoring_version: SCORING_VERSION }
}

#[instrument(level = "info", skip(state), fields(user = %caller.user_id))]
pub async fn user_achievements(state: &AppState, caller: &Caller, now: DateTime<Utc>) -> AchievementsOut {
  let (snap, stats) = stats_for(state, &caller.user_id, now).await;
  AchievementsOut { achievements: achievements::evaluate(&stats, &snap.attempts) }
}

//
// Results history
//

async fn attempts_of(state: &AppState, user_id: &str) -> Vec<AttemptRecord> {
  state.store.snapshot(user_id).await.map(|s| s.attempts).unwrap_or_default()
}

#[instrument(level = "info", skip(state), fields(user = %caller.user_id))]
pub async fn list_results(state: &AppState, caller: &Caller, q: ResultsQuery) -> ResultsOut {
  let mut attempts: Vec<AttemptRecord> = attempts_of(state, &caller.user_id)
    .await
    .into_iter()
    .filter(|a| q.kind.map_or(true, |k| a.item_type == k))
    .collect();
  attempts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

  let offset = q.offset.unwrap_or(0);
  let limit = q.limit.unwrap_or(RESULTS_DEFAULT_LIMIT);
  let total = attempts.len();
  let results = attempts.into_iter().skip(offset).take(limit).collect();
  ResultsOut { results, total, offset, limit }
}

#[instrument(level = "info", skip(state), fields(user = %caller.user_id, %id))]
pub async fn get_result(state: &AppState, caller: &Caller, id: Uuid) -> Result<AttemptRecord, ApiError> {
  attempts_of(state, &caller.user_id)
    .await
    .into_iter()
    .find(|a| a.id == id)
    .ok_or_else(|| ApiError::NotFound(format!("quiz result {id} not found")))
}

pub async fn results_summary(state: &AppState, caller: &Caller, kind: Option<ItemKind>) -> SummaryOut {
  SummaryOut { summary: summarize_history(&attempts_of(state, &caller.user_id).await, kind) }
}

pub async fn results_by_date(state: &AppState, caller: &Caller) -> ByDateOut {
  ByDateOut { days: group_by_date(&attempts_of(state, &caller.user_id).await) }
}

//
// Leaderboard
//

/// Stats for every user from one snapshot, in user-id order.
async fn all_stats(state: &AppState, now: DateTime<Utc>) -> (Vec<(String, UserStats)>, HashMap<String, String>) {
  let snaps = state.store.snapshot_all().await;
  let mut names = HashMap::with_capacity(snaps.len());
  let mut users = Vec::with_capacity(snaps.len());
  for s in snaps {
    let stats = compute_stats(&s.attempts, &s.counters, &state.scoring, now);
    names.insert(s.user_id.clone(), s.username);
    users.push((s.user_id, stats));
  }
  (users, names)
}

#[instrument(level = "info", skip(state, caller), fields(sort_by = ?q.sort_by))]
pub async fn leaderboard(
  state: &AppState,
  caller: Option<&Caller>,
  q: LeaderboardQuery,
  now: DateTime<Utc>,
) -> Result<LeaderboardOut, ApiError> {
  let criterion = match q.sort_by.as_deref() {
    None => Criterion::Overall,
    Some(s) => s.parse::<Criterion>()?,
  };
  let offset = q.offset.unwrap_or(0);
  let limit = q.limit.unwrap_or(state.config.leaderboard.max_page_size).min(state.config.leaderboard.max_page_size);

  let (users, names) = all_stats(state, now).await;
  let page = rank_by(&users, criterion, offset, limit);
  let current = caller.map(|c| c.user_id.as_str());

  let entries = page
    .entries
    .into_iter()
    .map(|e| LeaderboardEntryOut {
      rank: e.rank,
      username: names.get(&e.user_id).cloned().unwrap_or_else(|| "Anonymous".into()),
      is_current_user: current == Some(e.user_id.as_str()),
      user_id: e.user_id,
      stats: e.stats,
    })
    .collect();

  Ok(LeaderboardOut {
    sort_by: criterion.to_string(),
    entries,
    total_count: page.total_count,
    offset,
    limit,
    scoring_version: SCORING_VERSION,
  })
}

#[instrument(level = "info", skip(state))]
pub async fn user_rank(state: &AppState, user_id: &str, now: DateTime<Utc>) -> Result<UserRankOut, ApiError> {
  let (users, names) = all_stats(state, now).await;
  let rank = rank_of(&users, user_id).ok_or_else(|| {
    warn!(target: "hsk_quiz", %user_id, "Rank requested for unknown user");
    ApiError::NotFound(format!("user {user_id} not found"))
  })?;
  let stats = users.iter().find(|(id, _)| id == user_id).map(|(_, s)| s.clone()).ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;

  Ok(UserRankOut {
    user_id: user_id.to_string(),
    username: names.get(user_id).cloned().unwrap_or_else(|| "Anonymous".into()),
    stats,
    rank,
    total_users: users.len(),
  })
}

//
// Item pool
//

#[instrument(level = "info", skip(state, query), fields(%kind, query = %trunc_for_log(query, 40)))]
pub fn search_items(state: &AppState, kind: ItemKind, query: &str) -> Vec<QuizItem> {
  let q = query.trim().to_lowercase();
  if q.is_empty() {
    return Vec::new();
  }
  state
    .pool(kind)
    .iter()
    .filter(|it| it.prompt.to_lowercase().contains(&q) || it.correct_text.to_lowercase().contains(&q))
    .take(SEARCH_LIMIT)
    .cloned()
    .collect()
}

/// The whole pool in bank order, one page at a time.
pub fn list_items(state: &AppState, kind: ItemKind, q: ItemsPageQuery) -> ItemsPageOut {
  let pool = state.pool(kind);
  let offset = q.offset.unwrap_or(0);
  let limit = q.limit.unwrap_or(pool.len());
  let items = pool.iter().skip(offset).take(limit).cloned().collect();
  ItemsPageOut { kind, items, total: pool.len(), offset, limit }
}

pub fn item_detail(state: &AppState, kind: ItemKind, id: u32) -> Result<QuizItem, ApiError> {
  state.find_item(kind, id).cloned().ok_or_else(|| ApiError::NotFound(format!("{kind} item {id} not found")))
}

pub fn pool_stats(state: &AppState, kind: ItemKind) -> PoolStatsOut {
  let pool = state.pool(kind);
  let mut shapes = BTreeMap::new();
  for it in pool {
    *shapes.entry(sentence_shape(&it.prompt)).or_insert(0usize) += 1;
  }
  PoolStatsOut { kind, total_items: pool.len(), shapes: shapes.into_iter().collect() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::AppConfig;
  use crate::store::UserStore;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn state() -> AppState {
    AppState::new(AppConfig::default(), UserStore::in_memory())
  }

  fn caller(id: &str) -> Caller {
    Caller { user_id: id.into(), username: Some(format!("name-{id}")) }
  }

  #[tokio::test]
  async fn all_correct_submission_records_a_perfect_attempt() {
    let state = state();
    let me = caller("u1");
    let mut rng = StdRng::seed_from_u64(9);
    let quiz = start_quiz(&state, &me, ItemKind::Words, Some(5), &mut rng).await.unwrap();
    assert_eq!(quiz.items.len(), 5);

    let answers = quiz.items.iter().map(|it| AnswerIn { item_id: it.id, selected_index: it.correct_index }).collect();
    let out = submit_quiz(&state, &me, ItemKind::Words, SubmitIn { answers, time_taken_seconds: 42 }, Utc::now()).await.unwrap();

    assert_eq!(out.attempt.correct_count, 5);
    assert_eq!(out.attempt.total_count, 5);
    assert_eq!(out.stats.accuracy_rate, 100);
    assert_eq!(out.stats.words_mastered, 5);
    assert_eq!(out.stats.streak_days, 1);
  }

  #[tokio::test]
  async fn unanswered_items_count_as_wrong_and_quiz_is_graded_once() {
    let state = state();
    let me = caller("u1");
    let mut rng = StdRng::seed_from_u64(2);
    let quiz = start_quiz(&state, &me, ItemKind::Sentences, Some(4), &mut rng).await.unwrap();
    let first = &quiz.items[0];
    let answers = vec![AnswerIn { item_id: first.id, selected_index: first.correct_index }];

    let out = submit_quiz(&state, &me, ItemKind::Sentences, SubmitIn { answers, time_taken_seconds: 0 }, Utc::now()).await.unwrap();
    assert_eq!(out.attempt.correct_count, 1);
    assert_eq!(out.attempt.total_count, 4);
    assert_eq!(out.results.iter().filter(|r| r.selected_index.is_none()).count(), 3);

    let again = submit_quiz(&state, &me, ItemKind::Sentences, SubmitIn { answers: vec![], time_taken_seconds: 0 }, Utc::now()).await;
    assert!(matches!(again, Err(ApiError::Quiz(QuizError::InvalidArgument(_)))));
  }

  #[tokio::test]
  async fn invalid_submission_keeps_quiz_open() {
    let state = state();
    let me = caller("u1");
    let mut rng = StdRng::seed_from_u64(4);
    let quiz = start_quiz(&state, &me, ItemKind::Words, Some(2), &mut rng).await.unwrap();

    let bad = vec![AnswerIn { item_id: 9999, selected_index: 0 }];
    assert!(submit_quiz(&state, &me, ItemKind::Words, SubmitIn { answers: bad, time_taken_seconds: 0 }, Utc::now()).await.is_err());

    let ok = vec![AnswerIn { item_id: quiz.items[0].id, selected_index: 0 }];
    assert!(submit_quiz(&state, &me, ItemKind::Words, SubmitIn { answers: ok, time_taken_seconds: 0 }, Utc::now()).await.is_ok());
  }

  #[tokio::test]
  async fn non_positive_count_is_rejected() {
    let state = state();
    let mut rng = StdRng::seed_from_u64(1);
    let err = start_quiz(&state, &caller("u1"), ItemKind::Words, Some(0), &mut rng).await.unwrap_err();
    assert!(matches!(err, ApiError::Quiz(QuizError::InvalidArgument(_))));
  }

  #[tokio::test]
  async fn leaderboard_marks_current_user_and_rejects_unknown_sort() {
    let state = state();
    let mut rng = StdRng::seed_from_u64(6);
    for id in ["a", "b"] {
      let me = caller(id);
      let quiz = start_quiz(&state, &me, ItemKind::Words, Some(3), &mut rng).await.unwrap();
      let answers = quiz.items.iter().map(|it| AnswerIn { item_id: it.id, selected_index: it.correct_index }).collect();
      submit_quiz(&state, &me, ItemKind::Words, SubmitIn { answers, time_taken_seconds: 1 }, Utc::now()).await.unwrap();
    }

    let q = LeaderboardQuery { sort_by: Some("streak".into()), offset: None, limit: None };
    let board = leaderboard(&state, Some(&caller("b")), q, Utc::now()).await.unwrap();
    assert_eq!(board.total_count, 2);
    assert_eq!(board.entries.iter().filter(|e| e.is_current_user).count(), 1);
    assert_eq!(board.entries[0].username, "name-a");

    let q = LeaderboardQuery { sort_by: Some("xp".into()), offset: None, limit: None };
    assert!(leaderboard(&state, None, q, Utc::now()).await.is_err());
  }

  #[test]
  fn search_matches_prompt_or_translation() {
    let state = state();
    assert!(search_items(&state, ItemKind::Sentences, "").is_empty());
    let hits = search_items(&state, ItemKind::Sentences, "TAXI");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].prompt, "我们坐出租车去。");
    assert!(!search_items(&state, ItemKind::Words, "老师").is_empty());
  }

  #[tokio::test]
  async fn failed_record_keeps_quiz_open_and_stats_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let state = AppState::new(AppConfig::default(), UserStore::open(data_dir.join("users.json")).unwrap());
    let me = caller("u1");
    let mut rng = StdRng::seed_from_u64(12);
    let quiz = start_quiz(&state, &me, ItemKind::Words, Some(3), &mut rng).await.unwrap();
    let answers = || -> Vec<AnswerIn> {
      quiz.items.iter().map(|it| AnswerIn { item_id: it.id, selected_index: it.correct_index }).collect()
    };

    std::fs::remove_dir_all(&data_dir).unwrap();
    std::fs::write(&data_dir, b"blocks the store").unwrap();
    let err = submit_quiz(&state, &me, ItemKind::Words, SubmitIn { answers: answers(), time_taken_seconds: 9 }, Utc::now())
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Store(_)));

    let stats = user_stats(&state, &me, Utc::now()).await.stats;
    assert_eq!((stats.accuracy_rate, stats.words_mastered, stats.streak_days), (0, 0, 0));

    std::fs::remove_file(&data_dir).unwrap();
    let out = submit_quiz(&state, &me, ItemKind::Words, SubmitIn { answers: answers(), time_taken_seconds: 9 }, Utc::now())
      .await
      .unwrap();
    assert_eq!(out.attempt.correct_count, 3);
    assert_eq!(out.stats.words_mastered, 3);
  }

  #[tokio::test]
  async fn ended_session_has_no_quiz_to_submit() {
    let state = state();
    let me = caller("u1");
    let mut rng = StdRng::seed_from_u64(3);
    start_quiz(&state, &me, ItemKind::Words, Some(2), &mut rng).await.unwrap();
    start_quiz(&state, &me, ItemKind::Sentences, Some(2), &mut rng).await.unwrap();

    assert_eq!(end_session(&state, &me).await.rounds_dropped, 2);
    let err = submit_quiz(&state, &me, ItemKind::Words, SubmitIn { answers: vec![], time_taken_seconds: 0 }, Utc::now()).await;
    assert!(matches!(err, Err(ApiError::Quiz(QuizError::InvalidArgument(_)))));
  }

  #[test]
  fn list_items_pages_through_the_whole_pool() {
    let state = state();
    let all = list_items(&state, ItemKind::Sentences, ItemsPageQuery::default());
    assert_eq!(all.items.len(), all.total);
    assert_eq!(all.total, state.pool(ItemKind::Sentences).len());

    let page = list_items(&state, ItemKind::Sentences, ItemsPageQuery { offset: Some(2), limit: Some(3) });
    assert_eq!(page.items, all.items[2..5].to_vec());
    let past_end = list_items(&state, ItemKind::Sentences, ItemsPageQuery { offset: Some(all.total), limit: None });
    assert!(past_end.items.is_empty());
  }

  #[test]
  fn pool_stats_count_every_item_once() {
    let state = state();
    let out = pool_stats(&state, ItemKind::Sentences);
    assert_eq!(out.shapes.iter().map(|(_, n)| n).sum::<usize>(), out.total_items);
  }
}

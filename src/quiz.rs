//! Quiz set building: sample items from a pool, shuffle each item's options
//! and relocate the correct answer.
//!
//! Flow:
//! 1) Drop ids already served in the current round; if fewer than `count`
//!    remain, start a new round over the full pool.
//! 2) Sample without replacement.
//! 3) Shuffle a copy of each item's options and find the correct text again.
//!
//! The rng is always injected so callers (and tests) decide the source.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::domain::{QuizItem, QuizSessionItem};
use crate::error::QuizError;
use crate::util::normalize_option;

/// Result of one `build_quiz` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizBuild {
  pub items: Vec<QuizSessionItem>,
  /// True when the exclusion set was discarded because the pool ran out.
  pub reset: bool,
}

/// Select `count` items from `pool`, skipping `exclude_ids` until the pool is
/// exhausted, and present each with independently shuffled options.
///
/// # Errors
/// * [`QuizError::InvalidArgument`] for an empty pool or `count == 0`.
/// * [`QuizError::DataIntegrity`] when a selected item's correct text is not
///   among its options.
pub fn build_quiz<R: Rng + ?Sized>(
  rng: &mut R,
  pool: &[QuizItem],
  count: usize,
  exclude_ids: &HashSet<u32>,
) -> Result<QuizBuild, QuizError> {
  if pool.is_empty() {
    return Err(QuizError::InvalidArgument("quiz pool is empty".into()));
  }
  if count == 0 {
    return Err(QuizError::InvalidArgument("question count must be positive".into()));
  }

  let mut available: Vec<&QuizItem> = pool.iter().filter(|it| !exclude_ids.contains(&it.id)).collect();
  let reset = available.len() < count;
  if reset {
    debug!(target: "quiz", remaining = available.len(), count, "Pool exhausted for this round; starting over");
    available = pool.iter().collect();
  }

  let take = count.min(available.len());
  let chosen: Vec<&QuizItem> = available.choose_multiple(rng, take).copied().collect();

  let mut items = Vec::with_capacity(chosen.len());
  for item in chosen {
    items.push(present(rng, item)?);
  }
  Ok(QuizBuild { items, reset })
}

/// Shuffle one item's options and recompute where the correct text landed.
pub fn present<R: Rng + ?Sized>(rng: &mut R, item: &QuizItem) -> Result<QuizSessionItem, QuizError> {
  let mut options = item.options.clone();
  options.shuffle(rng);
  let correct_index = locate_correct(item.id, &options, &item.correct_text)?;
  Ok(QuizSessionItem {
    id: item.id,
    prompt: item.prompt.clone(),
    pinyin: item.pinyin.clone(),
    correct_text: item.correct_text.clone(),
    options,
    correct_index,
  })
}

/// Index of `correct_text` in `options`: exact match first, then trimmed and
/// case-insensitive. Never guesses.
pub fn locate_correct(item_id: u32, options: &[String], correct_text: &str) -> Result<usize, QuizError> {
  if let Some(i) = options.iter().position(|o| o == correct_text) {
    return Ok(i);
  }
  let wanted = normalize_option(correct_text);
  match options.iter().position(|o| normalize_option(o) == wanted) {
    Some(i) => Ok(i),
    None => {
      warn!(target: "quiz", item_id, correct_text, "Correct answer missing from options");
      Err(QuizError::DataIntegrity { item_id })
    }
  }
}

/// Exclusion state for one learner and one pool, plus the quiz currently
/// awaiting submission. Created on a learner's first quiz of a kind and
/// dropped when their session ends (`AppState::end_session`).
#[derive(Clone, Debug, Default)]
pub struct QuizRound {
  used_ids: HashSet<u32>,
  served: Vec<QuizSessionItem>,
}

impl QuizRound {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build the next quiz and remember its ids so the round does not repeat
  /// them until the pool is exhausted.
  pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R, pool: &[QuizItem], count: usize) -> Result<QuizBuild, QuizError> {
    let build = build_quiz(rng, pool, count, &self.used_ids)?;
    if build.reset {
      self.used_ids.clear();
    }
    self.used_ids.extend(build.items.iter().map(|it| it.id));
    self.served = build.items.clone();
    Ok(build)
  }

  pub fn used_ids(&self) -> &HashSet<u32> {
    &self.used_ids
  }

  /// Items of the quiz awaiting submission (empty once graded).
  pub fn served(&self) -> &[QuizSessionItem] {
    &self.served
  }

  /// Hand over the served items for grading; a quiz is graded once.
  pub fn take_served(&mut self) -> Vec<QuizSessionItem> {
    std::mem::take(&mut self.served)
  }

  /// Put back items taken for grading when the grade could not be recorded.
  /// A quiz served in the meantime wins.
  pub fn restore_served(&mut self, items: Vec<QuizSessionItem>) {
    if self.served.is_empty() {
      self.served = items;
    }
  }
}

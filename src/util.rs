//! Small utility helpers used across modules.

use serde::Serialize;

/// Lenient form of an answer option: trimmed and lowercased.
/// Used as the fallback comparison when exact matching fails.
pub fn normalize_option(s: &str) -> String {
  s.trim().to_lowercase()
}

/// Rough sentence shape, judged from punctuation (ASCII or full-width).
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SentenceShape {
  Question,
  Exclamation,
  Statement,
}

pub fn sentence_shape(text: &str) -> SentenceShape {
  if text.contains('?') || text.contains('？') {
    SentenceShape::Question
  } else if text.contains('!') || text.contains('！') {
    SentenceShape::Exclamation
  } else {
    SentenceShape::Statement
  }
}

/// Log-safe truncation for user supplied strings (char boundary aware).
pub fn trunc_for_log(s: &str, max_chars: usize) -> String {
  let count = s.chars().count();
  if count <= max_chars {
    s.to_string()
  } else {
    let head: String = s.chars().take(max_chars).collect();
    format!("{head}… ({count} chars total)")
  }
}

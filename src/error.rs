//! Error types for the quiz core and the user store.

use thiserror::Error;

/// Failures raised by the quiz builder, the aggregator and the ranker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuizError {
  /// The item's correct text is not among its own options (malformed bank data).
  #[error("quiz item {item_id} has no option matching its correct text")]
  DataIntegrity { item_id: u32 },

  /// Caller supplied a value the operation cannot work with.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),
}

/// Failures from loading or persisting the user store.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("store file I/O failed: {0}")]
  Io(#[from] std::io::Error),

  #[error("store file is not valid JSON: {0}")]
  Json(#[from] serde_json::Error),
}

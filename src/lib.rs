//! HSK1 quiz backend: quiz building with shuffled options, stats derived
//! from quiz history, achievements, and leaderboard ranking, served over Axum.

pub mod achievements;
pub mod config;
pub mod domain;
pub mod error;
pub mod leaderboard;
pub mod logic;
pub mod pinyin;
pub mod protocol;
pub mod quiz;
pub mod routes;
pub mod seeds;
pub mod state;
pub mod stats;
pub mod store;
pub mod telemetry;
pub mod util;

pub use error::{QuizError, StoreError};
pub use leaderboard::{rank, rank_by, Criterion, Page};
pub use quiz::{build_quiz, QuizBuild, QuizRound};
pub use routes::build_router;
pub use state::AppState;
pub use stats::{compute_stats, ScoreWeights, Scoring};

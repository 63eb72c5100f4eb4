//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::achievements::Achievement;
use crate::domain::{AttemptRecord, ItemKind, QuizItem, QuizSessionItem, UserStats};
use crate::stats::{DayGroup, HistorySummary, LearningProgress};
use crate::util::SentenceShape;

//
// Quiz
//

#[derive(Debug, Deserialize, Default)]
pub struct QuizQuery {
    /// Signed so that negative values reach validation instead of failing to parse.
    pub count: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOut {
    pub kind: ItemKind,
    pub items: Vec<QuizSessionItem>,
    /// True when this quiz started a new pass over the pool.
    pub new_round: bool,
    pub pool_size: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerIn {
    pub item_id: u32,
    pub selected_index: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitIn {
    pub answers: Vec<AnswerIn>,
    #[serde(default)]
    pub time_taken_seconds: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResultOut {
    pub item_id: u32,
    /// None when the item was left unanswered.
    pub selected_index: Option<usize>,
    pub correct_index: usize,
    pub correct: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOut {
    pub attempt: AttemptRecord,
    pub results: Vec<AnswerResultOut>,
    pub stats: UserStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEndOut {
    pub rounds_dropped: usize,
}

//
// Item pool
//

#[derive(Debug, Deserialize, Default)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemsOut {
    pub items: Vec<QuizItem>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ItemsPageQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ItemsPageOut {
    pub kind: ItemKind,
    pub items: Vec<QuizItem>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatsOut {
    pub kind: ItemKind,
    pub total_items: usize,
    pub shapes: Vec<(SentenceShape, usize)>,
}

//
// Profile / results
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOut {
    pub user_id: String,
    pub username: String,
    pub stats: UserStats,
    pub progress: LearningProgress,
    pub scoring_version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AchievementsOut {
    pub achievements: Vec<Achievement>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ResultsQuery {
    pub kind: Option<ItemKind>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsOut {
    pub results: Vec<AttemptRecord>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Deserialize, Default)]
pub struct SummaryQuery {
    pub kind: Option<ItemKind>,
}

#[derive(Debug, Serialize)]
pub struct SummaryOut {
    pub summary: HistorySummary,
}

#[derive(Debug, Serialize)]
pub struct ByDateOut {
    pub days: Vec<DayGroup>,
}

//
// Leaderboard
//

#[derive(Debug, Deserialize, Default)]
pub struct LeaderboardQuery {
    pub sort_by: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryOut {
    pub rank: usize,
    pub user_id: String,
    pub username: String,
    pub stats: UserStats,
    pub is_current_user: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardOut {
    pub sort_by: String,
    pub entries: Vec<LeaderboardEntryOut>,
    pub total_count: usize,
    pub offset: usize,
    pub limit: usize,
    pub scoring_version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRankOut {
    pub user_id: String,
    pub username: String,
    pub stats: UserStats,
    pub rank: usize,
    pub total_users: usize,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

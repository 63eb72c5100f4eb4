//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; failures map to a JSON `{message, status}` body.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{AttemptRecord, ItemKind};
use crate::error::QuizError;
use crate::logic::{self, ApiError, Caller};
use crate::protocol::*;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USERNAME_HEADER: &str = "x-username";

pub const TRY_AGAIN: &str = "Something went wrong. Please try again.";

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Quiz(QuizError::InvalidArgument(m)) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Quiz(QuizError::DataIntegrity { item_id }) => {
        error!(target: "quiz", item_id, "Malformed quiz item reached a learner request");
        (StatusCode::INTERNAL_SERVER_ERROR, TRY_AGAIN.to_string())
      }
      ApiError::Store(e) => {
        error!(target: "hsk_quiz", error = %e, "User store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, TRY_AGAIN.to_string())
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "User not authenticated".to_string()),
    };
    let body = serde_json::json!({ "message": message, "status": status.as_u16() });
    (status, Json(body)).into_response()
  }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|s| !s.is_empty())
}

fn optional_caller(headers: &HeaderMap) -> Option<Caller> {
  header_str(headers, USER_ID_HEADER).map(|id| Caller {
    user_id: id.to_string(),
    username: header_str(headers, USERNAME_HEADER).map(str::to_string),
  })
}

fn caller(headers: &HeaderMap) -> Result<Caller, ApiError> {
  optional_caller(headers).ok_or_else(|| {
    warn!(target: "hsk_quiz", "Request without user identity");
    ApiError::Unauthorized
  })
}

fn parse_kind(raw: &str) -> Result<ItemKind, ApiError> {
  Ok(raw.parse::<ItemKind>()?)
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

//
// Quiz
//

#[instrument(level = "info", skip(state, headers))]
pub async fn http_get_quiz(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(raw_kind): Path<String>,
  Query(q): Query<QuizQuery>,
) -> Result<Json<QuizOut>, ApiError> {
  let me = caller(&headers)?;
  let kind = parse_kind(&raw_kind)?;
  let mut rng = StdRng::from_entropy();
  let out = logic::start_quiz(&state, &me, kind, q.count, &mut rng).await?;
  info!(target: "quiz", user = %me.user_id, %kind, items = out.items.len(), "HTTP quiz served");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, headers, body), fields(answers = body.answers.len()))]
pub async fn http_post_submit(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(raw_kind): Path<String>,
  Json(body): Json<SubmitIn>,
) -> Result<(StatusCode, Json<SubmitOut>), ApiError> {
  let me = caller(&headers)?;
  let kind = parse_kind(&raw_kind)?;
  let out = logic::submit_quiz(&state, &me, kind, body, Utc::now()).await?;
  info!(target: "quiz", user = %me.user_id, %kind, correct = out.attempt.correct_count, total = out.attempt.total_count, "HTTP quiz submitted");
  Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_end_session(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Json<SessionEndOut>, ApiError> {
  let me = caller(&headers)?;
  Ok(Json(logic::end_session(&state, &me).await))
}

//
// Item pool
//

#[instrument(level = "info", skip(state))]
pub async fn http_search_items(
  State(state): State<Arc<AppState>>,
  Path(raw_kind): Path<String>,
  Query(q): Query<SearchQuery>,
) -> Result<Json<ItemsOut>, ApiError> {
  let kind = parse_kind(&raw_kind)?;
  let items = logic::search_items(&state, kind, q.q.as_deref().unwrap_or(""));
  Ok(Json(ItemsOut { items }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_items(
  State(state): State<Arc<AppState>>,
  Path(raw_kind): Path<String>,
  Query(q): Query<ItemsPageQuery>,
) -> Result<Json<ItemsPageOut>, ApiError> {
  Ok(Json(logic::list_items(&state, parse_kind(&raw_kind)?, q)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_pool_stats(
  State(state): State<Arc<AppState>>,
  Path(raw_kind): Path<String>,
) -> Result<Json<PoolStatsOut>, ApiError> {
  Ok(Json(logic::pool_stats(&state, parse_kind(&raw_kind)?)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_item_detail(
  State(state): State<Arc<AppState>>,
  Path((raw_kind, id)): Path<(String, u32)>,
) -> Result<Json<crate::domain::QuizItem>, ApiError> {
  Ok(Json(logic::item_detail(&state, parse_kind(&raw_kind)?, id)?))
}

//
// Profile / results
//

#[instrument(level = "info", skip(state, headers))]
pub async fn http_get_stats(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Json<StatsOut>, ApiError> {
  let me = caller(&headers)?;
  Ok(Json(logic::user_stats(&state, &me, Utc::now()).await))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_get_achievements(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Json<AchievementsOut>, ApiError> {
  let me = caller(&headers)?;
  Ok(Json(logic::user_achievements(&state, &me, Utc::now()).await))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_list_results(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(q): Query<ResultsQuery>,
) -> Result<Json<ResultsOut>, ApiError> {
  let me = caller(&headers)?;
  Ok(Json(logic::list_results(&state, &me, q).await))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_results_summary(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(q): Query<SummaryQuery>,
) -> Result<Json<SummaryOut>, ApiError> {
  let me = caller(&headers)?;
  Ok(Json(logic::results_summary(&state, &me, q.kind).await))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_results_by_date(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Json<ByDateOut>, ApiError> {
  let me = caller(&headers)?;
  Ok(Json(logic::results_by_date(&state, &me).await))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_get_result(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(raw_id): Path<String>,
) -> Result<Json<AttemptRecord>, ApiError> {
  let me = caller(&headers)?;
  let id = Uuid::parse_str(&raw_id).map_err(|_| QuizError::InvalidArgument(format!("'{raw_id}' is not a result id")))?;
  Ok(Json(logic::get_result(&state, &me, id).await?))
}

//
// Leaderboard
//

#[instrument(level = "info", skip(state, headers))]
pub async fn http_leaderboard(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(q): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardOut>, ApiError> {
  let me = optional_caller(&headers);
  let out = logic::leaderboard(&state, me.as_ref(), q, Utc::now()).await?;
  info!(target: "hsk_quiz", sort_by = %out.sort_by, entries = out.entries.len(), total = out.total_count, "HTTP leaderboard served");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_leaderboard_me(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Json<UserRankOut>, ApiError> {
  let me = caller(&headers)?;
  Ok(Json(logic::user_rank(&state, &me.user_id, Utc::now()).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_leaderboard_user(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
) -> Result<Json<UserRankOut>, ApiError> {
  Ok(Json(logic::user_rank(&state, &user_id, Utc::now()).await?))
}

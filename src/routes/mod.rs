//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers); tighten for production
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        // Quiz
        .route("/api/v1/quiz/:kind", get(http::http_get_quiz))
        .route("/api/v1/quiz/:kind/submit", post(http::http_post_submit))
        .route("/api/v1/session", delete(http::http_end_session))
        // Item pool
        .route("/api/v1/items/:kind", get(http::http_search_items))
        .route("/api/v1/items/:kind/all", get(http::http_list_items))
        .route("/api/v1/items/:kind/stats", get(http::http_pool_stats))
        .route("/api/v1/items/:kind/:id", get(http::http_item_detail))
        // Profile / results
        .route("/api/v1/stats", get(http::http_get_stats))
        .route("/api/v1/achievements", get(http::http_get_achievements))
        .route("/api/v1/results", get(http::http_list_results))
        .route("/api/v1/results/summary", get(http::http_results_summary))
        .route("/api/v1/results/by-date", get(http::http_results_by_date))
        .route("/api/v1/results/:id", get(http::http_get_result))
        // Leaderboard
        .route("/api/v1/leaderboard", get(http::http_leaderboard))
        .route("/api/v1/leaderboard/me", get(http::http_leaderboard_me))
        .route("/api/v1/leaderboard/users/:user_id", get(http::http_leaderboard_user))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

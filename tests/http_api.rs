use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use hsk_quiz_backend::{
    build_router,
    config::{parse_config, AppConfig},
    routes::http::TRY_AGAIN,
    store::UserStore,
    AppState,
};

fn app() -> Router {
    build_router(Arc::new(AppState::new(AppConfig::default(), UserStore::in_memory())))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().uri(uri);
    if let Some(u) = user {
        b = b.header("x-user-id", u).header("x-username", format!("learner {u}"));
    }
    b.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, user: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-user-id", user)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Serve a quiz and answer every item correctly.
async fn play_perfect(app: &Router, user: &str, kind: &str, count: usize) -> Value {
    let (status, quiz) = send(app, get(&format!("/api/v1/quiz/{kind}?count={count}"), Some(user))).await;
    assert_eq!(status, StatusCode::OK);
    let answers: Vec<Value> = quiz["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|it| json!({ "itemId": it["id"], "selectedIndex": it["correctIndex"] }))
        .collect();
    let (status, out) = send(
        app,
        post_json(&format!("/api/v1/quiz/{kind}/submit"), user, &json!({ "answers": answers, "timeTakenSeconds": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    out
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = send(&app(), get("/api/v1/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn quiz_requires_identity() {
    let (status, body) = send(&app(), get("/api/v1/quiz/words", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn served_quiz_has_four_options_and_valid_correct_index() {
    let (status, quiz) = send(&app(), get("/api/v1/quiz/sentences?count=6", Some("u1"))).await;
    assert_eq!(status, StatusCode::OK);
    let items = quiz["items"].as_array().unwrap();
    assert_eq!(items.len(), 6);
    for it in items {
        let options = it["options"].as_array().unwrap();
        let idx = it["correctIndex"].as_u64().unwrap() as usize;
        assert_eq!(options.len(), 4);
        assert_eq!(options[idx], it["correctText"]);
    }
}

#[tokio::test]
async fn perfect_submission_updates_stats() {
    let app = app();
    let out = play_perfect(&app, "u1", "words", 5).await;
    assert_eq!(out["attempt"]["correctCount"], 5);
    assert_eq!(out["attempt"]["totalCount"], 5);

    let (status, stats) = send(&app, get("/api/v1/stats", Some("u1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["stats"]["wordsMastered"], 5);
    assert_eq!(stats["stats"]["accuracyRate"], 100);
    assert_eq!(stats["stats"]["streakDays"], 1);
    // 5*10 + 1*5 + 100*2
    assert_eq!(stats["stats"]["totalScore"], 255);
    assert_eq!(stats["username"], "learner u1");
}

#[tokio::test]
async fn bad_kind_and_count_are_rejected() {
    let app = app();
    let (status, _) = send(&app, get("/api/v1/quiz/grammar", Some("u1"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, get("/api/v1/quiz/words?count=0", Some("u1"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_without_quiz_is_rejected() {
    let (status, _) = send(&app(), post_json("/api/v1/quiz/words/submit", "u1", &json!({ "answers": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn leaderboard_sorting_and_pagination() {
    let app = app();
    play_perfect(&app, "a", "words", 3).await;
    play_perfect(&app, "b", "sentences", 4).await;

    let (status, board) = send(&app, get("/api/v1/leaderboard?sort_by=words", Some("b"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["totalCount"], 2);
    assert_eq!(board["entries"][0]["userId"], "a");
    // Displayed rank is by overall score: b has 4*15 + 5 + 200 over a's 3*10 + 5 + 200.
    assert_eq!(board["entries"][0]["rank"], 2);
    assert_eq!(board["entries"][1]["isCurrentUser"], true);

    let (status, page) = send(&app, get("/api/v1/leaderboard?offset=5", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["entries"], json!([]));
    assert_eq!(page["totalCount"], 2);

    let (status, _) = send(&app, get("/api/v1/leaderboard?sort_by=score", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, me) = send(&app, get("/api/v1/leaderboard/me", Some("b"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["rank"], 1);
    assert_eq!(me["totalUsers"], 2);
}

#[tokio::test]
async fn results_history_and_lookup() {
    let app = app();
    let out = play_perfect(&app, "u1", "words", 2).await;
    let id = out["attempt"]["id"].as_str().unwrap().to_string();

    let (status, list) = send(&app, get("/api/v1/results?kind=words", Some("u1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);

    let (status, one) = send(&app, get(&format!("/api/v1/results/{id}"), Some("u1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["id"], id.as_str());

    let (status, _) = send(&app, get(&format!("/api/v1/results/{id}"), Some("someone-else"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/api/v1/results/not-a-uuid", Some("u1"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn achievements_unlock_after_first_quiz() {
    let app = app();
    play_perfect(&app, "u1", "words", 3).await;
    let (status, body) = send(&app, get("/api/v1/achievements", Some("u1"))).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["achievements"].as_array().unwrap();
    let unlocked = |id: &str| list.iter().find(|a| a["id"] == id).map(|a| a["unlocked"].clone());
    assert_eq!(unlocked("first_steps"), Some(json!(true)));
    assert_eq!(unlocked("perfect_score"), Some(json!(true)));
    assert_eq!(unlocked("word_master"), Some(json!(false)));
}

#[tokio::test]
async fn item_lookup() {
    let app = app();
    let (status, item) = send(&app, get("/api/v1/items/words/2", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["correctText"], "eight");

    let (status, _) = send(&app, get("/api/v1/items/words/9999", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn full_pool_listing_pages() {
    let app = app();
    let (status, all) = send(&app, get("/api/v1/items/sentences/all", None)).await;
    assert_eq!(status, StatusCode::OK);
    let total = all["total"].as_u64().unwrap() as usize;
    assert!(total > 0);
    assert_eq!(all["items"].as_array().unwrap().len(), total);

    let (status, page) = send(&app, get("/api/v1/items/words/all?offset=1&limit=2", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert_eq!(page["items"][0]["id"], 2);

    let (status, _) = send(&app, get("/api/v1/items/grammar/all", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bank_item_is_a_generic_server_error() {
    let cfg = parse_config(
        r#"
          [[words]]
          id = 900
          prompt = "猫"
          correct = "cat"
          options = ["dog", "fish", "bird", "cow"]
        "#,
    )
    .unwrap();
    let app = build_router(Arc::new(AppState::new(cfg, UserStore::in_memory())));

    // Asking for more than the pool holds serves every item, the malformed one included.
    let (status, body) = send(&app, get("/api/v1/quiz/words?count=50", Some("u1"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "message": TRY_AGAIN, "status": 500 }));
}

#[tokio::test]
async fn ending_the_session_closes_the_open_quiz() {
    let app = app();
    let (status, _) = send(&app, get("/api/v1/quiz/words?count=2", Some("u1"))).await;
    assert_eq!(status, StatusCode::OK);

    let end = Request::builder().method("DELETE").uri("/api/v1/session").header("x-user-id", "u1").body(Body::empty()).unwrap();
    let (status, body) = send(&app, end).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roundsDropped"], 1);

    let (status, _) = send(&app, post_json("/api/v1/quiz/words/submit", "u1", &json!({ "answers": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

//! Integration tests for the dramawave-server HTTP API
//!
//! Each test builds the full router over an in-memory database and drives
//! it with `oneshot` requests. Identity is supplied the way the gateway
//! does it, through the `x-user-*` headers.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use dramawave_common::db::init_memory_database;
use dramawave_server::config::ServerConfig;
use dramawave_server::services::generator::{GeneratorError, RecommendationGenerator};
use dramawave_server::services::users::bootstrap_admins;
use dramawave_server::session::{USER_ID_HEADER, USER_NAME_HEADER};
use dramawave_server::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

const ADMIN: &str = "admin";

struct CannedGenerator;

#[async_trait]
impl RecommendationGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
        Ok("Lovely Runner, Queen of Tears".to_string())
    }
}

/// Test helper: router over a fresh database with one bootstrap admin
async fn setup_app() -> Router {
    let db = init_memory_database().await.expect("Should create database");
    bootstrap_admins(&db, &[ADMIN.to_string()])
        .await
        .expect("Should promote admin");

    let state = AppState::with_generator(db, ServerConfig::default(), Arc::new(CannedGenerator));
    build_router(state)
}

/// Test helper: build a request, optionally signed in and with a JSON body
fn test_request(method: &str, uri: &str, uid: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(uid) = uid {
        builder = builder
            .header(USER_ID_HEADER, uid)
            .header(USER_NAME_HEADER, format!("{} name", uid));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Test helper: extract JSON body from response (Null when empty)
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

fn series_body() -> Value {
    json!({
        "kind": "series",
        "title": "Crash Landing on You",
        "description": "A paraglider lands in the wrong country",
        "image_url": "https://img.example.com/cloy.jpg",
        "genres": ["Romance", "Comedy"],
        "in_emission": true,
        "episodes": [
            {"title": "Episode 1", "video_url": "https://cdn.example.com/cloy1.mp4"}
        ]
    })
}

async fn create_series(app: &Router) -> String {
    let (status, body) = send(
        app,
        test_request("POST", "/api/content", Some(ADMIN), Some(series_body())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_str().unwrap().to_string()
}

async fn post_comment(app: &Router, content_id: &str, uid: &str, text: &str, parent: Option<&str>) -> String {
    let (status, body) = send(
        app,
        test_request(
            "POST",
            &format!("/api/content/{}/comments", content_id),
            Some(uid),
            Some(json!({
                "body": {"type": "text", "content": text},
                "parent_id": parent,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_str().unwrap().to_string()
}

// =============================================================================
// Health and sessions
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_session_required() {
    let app = setup_app().await;

    let (status, body) = send(&app, test_request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "dramawave-server");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_session_required_for_profile() {
    let app = setup_app().await;

    let (status, body) = send(&app, test_request("GET", "/api/me", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, body) = send(&app, test_request("GET", "/api/me", Some("u1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uid"], "u1");
    assert_eq!(body["display_name"], "u1 name");
    assert_eq!(body["is_admin"], false);
    assert_eq!(body["avatar_url"], "https://avatar.vercel.sh/u1.png");
}

#[tokio::test]
async fn test_rename_bounds() {
    let app = setup_app().await;

    let (status, _) = send(
        &app,
        test_request("PUT", "/api/me", Some("u1"), Some(json!({"display_name": "X"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        test_request("PUT", "/api/me", Some("u1"), Some(json!({"display_name": " Mina "}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["display_name"], "Mina");
}

#[tokio::test]
async fn test_event_stream_is_sse() {
    let app = setup_app().await;

    let response = app
        .oneshot(test_request("GET", "/api/events", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}

// =============================================================================
// Catalog, notifications and likes
// =============================================================================

#[tokio::test]
async fn test_catalog_writes_are_admin_only_and_validated() {
    let app = setup_app().await;

    let (status, _) = send(
        &app,
        test_request("POST", "/api/content", Some("u1"), Some(series_body())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut invalid = series_body();
    invalid["description"] = json!("short");
    let (status, body) = send(
        &app,
        test_request("POST", "/api/content", Some(ADMIN), Some(invalid)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    // Nothing was written
    let (_, list) = send(&app, test_request("GET", "/api/content", None, None)).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_publish_series_and_episode_notifications() {
    let app = setup_app().await;
    let id = create_series(&app).await;

    let (status, content) = send(&app, test_request("GET", &format!("/api/content/{}", id), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content["episodes"].as_array().unwrap().len(), 1);
    assert!(content.get("video_url").is_none());

    let (status, episode) = send(
        &app,
        test_request(
            "POST",
            &format!("/api/content/{}/episodes", id),
            Some(ADMIN),
            Some(json!({"title": "Episode 2"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(episode["episode_number"], 2);

    let (_, feed) = send(&app, test_request("GET", "/api/notifications", None, None)).await;
    let feed = feed.as_array().unwrap();
    assert_eq!(feed.len(), 2);
    assert!(feed.iter().all(|n| n["kind"] == "series"));

    let (_, unread) = send(&app, test_request("GET", "/api/notifications/unread", Some("u1"), None)).await;
    assert_eq!(unread["unread"], 2);

    let (status, seen) = send(&app, test_request("POST", "/api/notifications/seen", Some("u1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seen["marked"].as_array().unwrap().len(), 2);

    let (_, unread) = send(&app, test_request("GET", "/api/notifications/unread", Some("u1"), None)).await;
    assert_eq!(unread["unread"], 0);

    // Other users keep their own seen set
    let (_, unread) = send(&app, test_request("GET", "/api/notifications/unread", Some("u2"), None)).await;
    assert_eq!(unread["unread"], 2);
}

#[tokio::test]
async fn test_switching_to_movie_drops_episodes() {
    let app = setup_app().await;
    let id = create_series(&app).await;

    let mut movie = series_body();
    movie["kind"] = json!("movie");
    movie["video_url"] = json!("https://cdn.example.com/cloy-movie.mp4");

    let (status, body) = send(
        &app,
        test_request("PUT", &format!("/api/content/{}", id), Some(ADMIN), Some(movie)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["kind"], "movie");
    assert_eq!(body["episodes"].as_array().unwrap().len(), 0);

    let (_, movies) = send(&app, test_request("GET", "/api/content?kind=movie", None, None)).await;
    assert_eq!(movies.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_like_toggle_and_favorites() {
    let app = setup_app().await;
    let id = create_series(&app).await;
    let like = format!("/api/content/{}/like", id);

    let (status, body) = send(&app, test_request("POST", &like, None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", body);

    let (_, on) = send(&app, test_request("POST", &like, Some("u1"), None)).await;
    assert_eq!(on, json!({"liked": true, "likes": 1}));

    let (_, favs) = send(&app, test_request("GET", "/api/favorites", Some("u1"), None)).await;
    assert_eq!(favs.as_array().unwrap().len(), 1);

    let (_, off) = send(&app, test_request("POST", &like, Some("u1"), None)).await;
    assert_eq!(off, json!({"liked": false, "likes": 0}));

    let (_, content) = send(&app, test_request("GET", &format!("/api/content/{}", id), None, None)).await;
    assert_eq!(content["likes"], 0);
    assert_eq!(content["liked_by"].as_array().unwrap().len(), 0);

    let (status, _) = send(&app, test_request("POST", "/api/content/missing/like", Some("u1"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Comments and moderation
// =============================================================================

#[tokio::test]
async fn test_comment_threads_and_cascade() {
    let app = setup_app().await;
    let id = create_series(&app).await;

    let t = post_comment(&app, &id, "u1", "What an ending!", None).await;
    let r1 = post_comment(&app, &id, "u2", "Agreed", Some(&t)).await;
    let _r2 = post_comment(&app, &id, "u3", "Not for me", Some(&t)).await;
    let g1 = post_comment(&app, &id, "u1", "Why not?", Some(&r1)).await;
    let h1 = post_comment(&app, &id, "u2", "Too slow", Some(&g1)).await;
    post_comment(&app, &id, "u3", "Orphan", Some("gone")).await;

    let comments = format!("/api/content/{}/comments", id);
    let (status, threads) = send(&app, test_request("GET", &comments, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let threads = threads.as_array().unwrap();
    // Reply to an unknown parent is top-level
    assert_eq!(threads.len(), 2);
    assert!(threads.iter().any(|n| n["body"]["content"] == "Orphan"));

    let top = threads.iter().find(|n| n["id"] == t.as_str()).unwrap();
    assert_eq!(top["id"], t.as_str());
    assert_eq!(top["author_name"], "u1 name");
    let replies = top["replies"].as_array().unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["id"], r1.as_str());
    // Deeper replies flattened under the first reply level
    let flattened = replies[0]["replies"].as_array().unwrap();
    assert_eq!(flattened.len(), 2);
    assert_eq!(flattened[1]["id"], h1.as_str());

    // Only the author or an admin may cancel
    let target = format!("{}/{}", comments, t);
    let (status, _) = send(&app, test_request("DELETE", &target, Some("u2"), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, report) = send(&app, test_request("DELETE", &target, Some("u1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["removed"].as_array().unwrap().len(), 4);
    assert_eq!(report["failed"].as_array().unwrap().len(), 0);

    // Third-level reply survives and degrades to top level
    let (_, threads) = send(&app, test_request("GET", &comments, None, None)).await;
    let ids: Vec<&str> = threads
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&h1.as_str()));

    let (status, _) = send(&app, test_request("DELETE", &target, Some(ADMIN), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Nested levels below `node`, following the first reply
fn nesting(node: &Value) -> usize {
    let mut levels = 0;
    let mut current = node;
    while let Some(first) = current["replies"].as_array().and_then(|r| r.first()) {
        levels += 1;
        current = first;
    }
    levels
}

#[tokio::test]
async fn test_requested_depth_is_capped() {
    let app = setup_app().await;
    let id = create_series(&app).await;

    let mut parent = post_comment(&app, &id, "u1", "level 0", None).await;
    for level in 1..30 {
        parent = post_comment(&app, &id, "u2", &format!("level {}", level), Some(&parent)).await;
    }

    let max = ServerConfig::default().comments.max_display_depth;
    let (status, threads) = send(
        &app,
        test_request(
            "GET",
            &format!("/api/content/{}/comments?depth=1000000", id),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let threads = threads.as_array().unwrap();
    assert_eq!(threads.len(), 1);
    // `max` nested levels; the rest flattened one level below
    assert_eq!(nesting(&threads[0]), max + 1);

    let (_, shallow) = send(
        &app,
        test_request("GET", &format!("/api/content/{}/comments?depth=0", id), None, None),
    )
    .await;
    assert_eq!(nesting(&shallow[0]), 2);
}

#[tokio::test]
async fn test_comment_body_validation() {
    let app = setup_app().await;
    let id = create_series(&app).await;
    let uri = format!("/api/content/{}/comments", id);

    let too_long = "x".repeat(501);
    for body in [
        json!({"type": "text", "content": "   "}),
        json!({"type": "text", "content": too_long}),
        json!({"type": "image", "content": "sticker.png"}),
    ] {
        let (status, _) = send(&app, test_request("POST", &uri, Some("u1"), Some(json!({"body": body})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = send(
        &app,
        test_request(
            "POST",
            "/api/content/missing/comments",
            Some("u1"),
            Some(json!({"body": {"type": "emoji", "content": "😭"}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// User management
// =============================================================================

#[tokio::test]
async fn test_suspension_blocks_posting() {
    let app = setup_app().await;
    let id = create_series(&app).await;
    // Profiles exist once seen
    send(&app, test_request("GET", "/api/me", Some("u1"), None)).await;

    let (status, _) = send(
        &app,
        test_request("POST", "/api/users/u1/suspend", Some(ADMIN), Some(json!({"days": 0}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        test_request("POST", "/api/users/u1/suspend", Some(ADMIN), Some(json!({"days": 7}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_suspended"], true);

    let (status, _) = send(
        &app,
        test_request(
            "POST",
            &format!("/api/content/{}/comments", id),
            Some("u1"),
            Some(json!({"body": {"type": "text", "content": "hello"}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        test_request("POST", "/api/chat", Some("u1"), Some(json!({"body": {"type": "text", "content": "hi"}}))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, test_request("DELETE", "/api/users/u1/suspend", Some(ADMIN), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_suspended"], false);

    post_comment(&app, &id, "u1", "back again", None).await;
}

#[tokio::test]
async fn test_admins_cannot_modify_admins() {
    let app = setup_app().await;
    send(&app, test_request("GET", "/api/me", Some("u2"), None)).await;

    let (status, _) = send(&app, test_request("GET", "/api/users", Some("u2"), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        test_request("POST", "/api/users/admin/suspend", Some(ADMIN), Some(json!({"days": 1}))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, test_request("POST", "/api/users/u2/admin", Some(ADMIN), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_admin"], true);

    // u2 is now an admin and out of reach
    let (status, _) = send(&app, test_request("POST", "/api/users/u2/admin", Some(ADMIN), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, test_request("POST", "/api/users/nobody/admin", Some(ADMIN), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, users) = send(&app, test_request("GET", "/api/users", Some("u2"), None)).await;
    assert_eq!(users.as_array().unwrap().len(), 2);
}

// =============================================================================
// Chat, stickers and the daily card
// =============================================================================

#[tokio::test]
async fn test_chat_history() {
    let app = setup_app().await;

    let (status, _) = send(
        &app,
        test_request("POST", "/api/chat", None, Some(json!({"body": {"type": "text", "content": "hi"}}))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for text in ["first", "second"] {
        let (status, _) = send(
            &app,
            test_request("POST", "/api/chat", Some("u1"), Some(json!({"body": {"type": "text", "content": text}}))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, history) = send(&app, test_request("GET", "/api/chat", None, None)).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["body"]["content"], "first");
    assert_eq!(history[1]["author_name"], "u1 name");
}

#[tokio::test]
async fn test_sticker_management() {
    let app = setup_app().await;

    let (status, _) = send(
        &app,
        test_request("POST", "/api/stickers", Some("u1"), Some(json!({"emoji": "🎉"}))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        test_request(
            "POST",
            "/api/stickers",
            Some(ADMIN),
            Some(json!({"emoji": "🎉", "image_url": "https://img.example.com/s.png"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, sticker) = send(
        &app,
        test_request("POST", "/api/stickers", Some(ADMIN), Some(json!({"emoji": "🎉"}))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sticker["type"], "emoji");

    let (_, list) = send(&app, test_request("GET", "/api/stickers", None, None)).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let uri = format!("/api/stickers/{}", sticker["id"].as_str().unwrap());
    let (status, _) = send(&app, test_request("DELETE", &uri, Some(ADMIN), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, test_request("DELETE", &uri, Some(ADMIN), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_daily_recommendation_fill() {
    let app = setup_app().await;
    let uri = "/api/recommendations/daily";

    let (status, body) = send(&app, test_request("GET", uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "hidden"}));

    let (_, body) = send(&app, test_request("GET", uri, Some("u1"), None)).await;
    assert_eq!(body["status"], "generated");
    assert_eq!(body["recommendations"], "Lovely Runner, Queen of Tears");

    // Filled cache is served to everyone
    let (_, body) = send(&app, test_request("GET", uri, None, None)).await;
    assert_eq!(body["status"], "fresh");
}

//! HTTP API tests over a SQLite-backed router.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use pr_reviewer_lib::db::{self, SqliteStore};
use pr_reviewer_lib::server;
use pr_reviewer_lib::services::{AssignmentPolicy, Services};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

async fn app() -> (Router, TempDir) {
    let dir = tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("api.db")).await.unwrap();
    let services = Services::new(Arc::new(SqliteStore::new(pool)), AssignmentPolicy::default());
    (server::router(services, Duration::from_secs(5)), dir)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_full_flow() {
    let (app, _dir) = app().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/team/add",
        Some(json!({
            "team_name": "backend",
            "members": [
                {"user_id": "u1", "username": "Alice", "is_active": true},
                {"user_id": "u2", "username": "Bob", "is_active": true},
                {"user_id": "u3", "username": "Carol", "is_active": true},
                {"user_id": "u4", "username": "Dan", "is_active": true}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/pullRequest/create",
        Some(json!({"pull_request_id": "pr-1", "pull_request_name": "Add X", "author_id": "u1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["pr"]["assigned_reviewers"], json!(["u2", "u3"]));
    assert!(body["pr"].get("merged_at").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/pullRequest/reassign",
        Some(json!({"pull_request_id": "pr-1", "old_user_id": "u2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["replaced_by"], "u4");

    let (status, body) = send(
        &app,
        Method::POST,
        "/users/setIsActive",
        Some(json!({"user_id": "u4", "is_active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["is_active"], false);

    let (status, body) = send(&app, Method::GET, "/users/getReview?user_id=u4", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pull_requests"][0]["status"], "OPEN");

    let (status, body) = send(&app, Method::GET, "/stats/reviews", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"].as_array().map(Vec::len), Some(4));

    let (status, body) = send(&app, Method::GET, "/stats/pr", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"][0]["reviewers_count"], 2);
}

#[tokio::test]
async fn test_error_bodies() {
    let (app, _dir) = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/pullRequest/create",
        Some(json!({
            "pull_request_id": "pr-1",
            "pull_request_name": "Add X",
            "author_id": "ghost"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = send(
        &app,
        Method::POST,
        "/team/add",
        Some(json!({"team_name": "empty", "members": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");

    let (status, body) = send(
        &app,
        Method::POST,
        "/team/deactivate",
        Some(json!({"team_name": "ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = send(&app, Method::GET, "/users/getReview", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use reviewd_core::{ServiceConfig, service::Services};
use reviewd_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

async fn make_app() -> Router {
  let store  = SqliteStore::open_in_memory().await.unwrap();
  let config = ServiceConfig { request_timeout_ms: 5_000, ..ServiceConfig::default() };
  api_router(Arc::new(Services::new(Arc::new(store), config)))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp   = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes  = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value  = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, value)
}

async fn seed_team(app: &Router, name: &str, members: &[(&str, bool)]) {
  let members: Vec<Value> = members
    .iter()
    .map(|(id, active)| json!({ "user_id": id, "username": id.to_uppercase(), "is_active": active }))
    .collect();
  let (status, _) = call(
    app,
    "POST",
    "/team/add",
    Some(json!({ "team_name": name, "members": members })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
}

fn error_code(body: &Value) -> &str { body["error"]["code"].as_str().unwrap_or_default() }

// ── Teams ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn team_add_and_get() {
  let app = make_app().await;
  seed_team(&app, "backend", &[("u1", true), ("u2", false)]).await;

  let (status, body) = call(&app, "GET", "/team/get?team_name=backend", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["team_name"], "backend");
  assert_eq!(body["members"][1]["user_id"], "u2");
  assert_eq!(body["members"][1]["is_active"], false);

  let (status, body) = call(
    &app,
    "POST",
    "/team/add",
    Some(json!({ "team_name": "backend", "members": [] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "TEAM_EXISTS");

  let (status, body) = call(&app, "GET", "/team/get?team_name=ghosts", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
  let app = make_app().await;
  let req = Request::builder()
    .method("POST")
    .uri("/pullRequest/create")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{not json"))
    .unwrap();
  let resp = app.oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(error_code(&body), "BAD_REQUEST");
}

#[tokio::test]
async fn missing_query_param_is_bad_request() {
  let app = make_app().await;
  let (status, body) = call(&app, "GET", "/users/getReview", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "BAD_REQUEST");
}

// ── Pull requests ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_merge_and_reassign() {
  let app = make_app().await;
  seed_team(&app, "backend", &[("u1", true), ("u2", true)]).await;

  let create = json!({ "pull_request_id": "pr-1", "pull_request_name": "Add search", "author_id": "u1" });
  let (status, body) = call(&app, "POST", "/pullRequest/create", Some(create.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["pr"]["status"], "OPEN");
  assert_eq!(body["pr"]["assigned_reviewers"], json!(["u2"]));

  let (status, body) = call(&app, "POST", "/pullRequest/create", Some(create)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error_code(&body), "PR_EXISTS");

  // u2 is the only teammate, nobody can take over.
  let reassign = json!({ "pull_request_id": "pr-1", "old_user_id": "u2" });
  let (status, body) = call(&app, "POST", "/pullRequest/reassign", Some(reassign.clone())).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error_code(&body), "NO_CANDIDATE");

  let merge = json!({ "pull_request_id": "pr-1" });
  let (status, first) = call(&app, "POST", "/pullRequest/merge", Some(merge.clone())).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(first["pr"]["status"], "MERGED");
  let (status, second) = call(&app, "POST", "/pullRequest/merge", Some(merge)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(first["pr"]["merged_at"], second["pr"]["merged_at"]);

  let (status, body) = call(&app, "POST", "/pullRequest/reassign", Some(reassign)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error_code(&body), "PR_MERGED");
}

#[tokio::test]
async fn reassign_adds_reviewer_up_to_cap() {
  let app = make_app().await;
  seed_team(&app, "backend", &[("u1", true), ("u2", true), ("u3", false)]).await;
  call(
    &app,
    "POST",
    "/pullRequest/create",
    Some(json!({ "pull_request_id": "pr-1", "pull_request_name": "n", "author_id": "u1" })),
  )
  .await;

  let (status, _) = call(
    &app,
    "POST",
    "/users/setIsActive",
    Some(json!({ "user_id": "u3", "is_active": true })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, body) = call(
    &app,
    "POST",
    "/pullRequest/reassign",
    Some(json!({ "pull_request_id": "pr-1", "old_user_id": "u1" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error_code(&body), "NOT_ASSIGNED");

  let add_one = json!({ "pull_request_id": "pr-1" });
  let (status, body) = call(&app, "POST", "/pullRequest/reassign", Some(add_one.clone())).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["replaced_by"], "u3");
  assert_eq!(body["pr"]["assigned_reviewers"], json!(["u2", "u3"]));

  let (status, body) = call(&app, "POST", "/pullRequest/reassign", Some(add_one)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["replaced_by"], "");
  assert_eq!(body["pr"]["assigned_reviewers"], json!(["u2", "u3"]));
}

#[tokio::test]
async fn create_requires_fields() {
  let app = make_app().await;
  let (status, body) = call(
    &app,
    "POST",
    "/pullRequest/create",
    Some(json!({ "pull_request_id": " ", "pull_request_name": "n", "author_id": "u1" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "BAD_REQUEST");
}

// ── Users ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn deactivation_and_review_listing() {
  let app = make_app().await;
  seed_team(&app, "backend", &[("u1", true), ("u2", true), ("u3", false)]).await;
  call(
    &app,
    "POST",
    "/pullRequest/create",
    Some(json!({ "pull_request_id": "pr-1", "pull_request_name": "n", "author_id": "u1" })),
  )
  .await;

  let (status, body) = call(&app, "GET", "/users/getReview?user_id=u2", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["user_id"], "u2");
  assert_eq!(body["pull_requests"][0]["pull_request_id"], "pr-1");

  let (status, body) = call(
    &app,
    "POST",
    "/users/setIsActive",
    Some(json!({ "user_id": "u2", "is_active": false })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["user"]["is_active"], false);
  assert_eq!(body["user"]["team_name"], "backend");

  let (_, body) = call(&app, "GET", "/users/getReview?user_id=u2", None).await;
  assert_eq!(body["pull_requests"], json!([]));

  let (status, body) = call(
    &app,
    "POST",
    "/users/setIsActive",
    Some(json!({ "user_id": "ghost", "is_active": false })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn mass_deactivate_endpoint() {
  let app = make_app().await;
  seed_team(&app, "backend", &[("u1", true), ("u2", true)]).await;
  seed_team(&app, "frontend", &[("f1", true)]).await;

  let (status, body) = call(
    &app,
    "POST",
    "/users/deactivate",
    Some(json!({ "users": [{ "user_id": "u1" }, { "user_id": "f1" }], "flag": false })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "USERS_FROM_DIFFERENT_TEAMS");

  let (status, body) = call(
    &app,
    "POST",
    "/users/deactivate",
    Some(json!({ "users": [{ "user_id": "u1" }], "flag": true })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "ONLY_DEACTIVATE");

  let (status, body) = call(
    &app,
    "POST",
    "/users/deactivate",
    Some(json!({ "users": [], "flag": false })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "EMPTY_REQUEST");

  let (status, body) = call(
    &app,
    "POST",
    "/users/deactivate",
    Some(json!({
      "users": [{ "user_id": "u1", "team_name": "backend" }, { "user_id": "u2" }],
      "flag": false
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["deactivated"], json!(["u1", "u2"]));

  let (_, team) = call(&app, "GET", "/team/get?team_name=backend", None).await;
  assert_eq!(team["members"][0]["is_active"], false);
  assert_eq!(team["members"][1]["is_active"], false);
}

#[tokio::test]
async fn mass_deactivate_lists_only_team_members() {
  let app = make_app().await;
  seed_team(&app, "backend", &[("u1", true), ("u2", true)]).await;
  seed_team(&app, "frontend", &[("f1", true)]).await;

  // f1 claims the backend team but is registered in frontend.
  let (status, body) = call(
    &app,
    "POST",
    "/users/deactivate",
    Some(json!({
      "users": [
        { "user_id": "f1", "team_name": "backend" },
        { "user_id": "u1", "team_name": "backend" }
      ],
      "flag": false
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["deactivated"], json!(["u1"]));

  let (_, team) = call(&app, "GET", "/team/get?team_name=frontend", None).await;
  assert_eq!(team["members"][0]["is_active"], true);
}

// ── Stats ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_endpoint() {
  let app = make_app().await;
  seed_team(&app, "backend", &[("u1", true), ("u2", true), ("u3", true)]).await;
  call(
    &app,
    "POST",
    "/pullRequest/create",
    Some(json!({ "pull_request_id": "pr-1", "pull_request_name": "n", "author_id": "u1" })),
  )
  .await;

  let (status, body) = call(&app, "GET", "/stats", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["assigned_reviewers_per_pr"]["pr-1"], 2);
  assert_eq!(body["open_prs_per_user"]["u2"], 1);
  assert_eq!(body["open_prs_per_user"]["u3"], 1);
}

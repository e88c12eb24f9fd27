//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users/setIsActive` | Body: `{"user_id":"u1","is_active":false}` |
//! | `GET`  | `/users/getReview` | `?user_id=<id>` |
//! | `POST` | `/users/deactivate` | Body: `{"users":[...],"flag":false}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
};
use reviewd_core::{
  pull_request::PullRequestShort,
  service::{Services, UserService},
  store::ReviewStore,
  user::User,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── Set active ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetIsActiveBody {
  pub user_id:   String,
  pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
  pub user: User,
}

/// `POST /users/setIsActive`
pub async fn set_is_active<S: ReviewStore>(
  State(services): State<Arc<Services<S>>>,
  payload: Result<Json<SetIsActiveBody>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
  let Json(body) = payload?;
  if body.user_id.trim().is_empty() {
    return Err(ApiError::BadRequest("user_id is required".into()));
  }
  let user = services
    .users
    .change_status(&services.context(), &body.user_id, body.is_active)
    .await?;
  Ok(Json(UserResponse { user }))
}

// ─── Reviews ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReviewParams {
  pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
  pub user_id:       String,
  pub pull_requests: Vec<PullRequestShort>,
}

/// `GET /users/getReview?user_id=<id>`
pub async fn get_review<S: ReviewStore>(
  State(services): State<Arc<Services<S>>>,
  params: Result<Query<ReviewParams>, QueryRejection>,
) -> Result<Json<ReviewResponse>, ApiError> {
  let Query(params) = params?;
  let (user_id, pull_requests) = services.users.reviews(&services.context(), &params.user_id).await?;
  Ok(Json(ReviewResponse { user_id, pull_requests }))
}

// ─── Mass deactivation ────────────────────────────────────────────────────────

/// A batch entry; only `user_id` is required.
#[derive(Debug, Deserialize)]
pub struct BatchUser {
  #[serde(default)]
  pub user_id:   String,
  #[serde(default)]
  pub username:  String,
  #[serde(default)]
  pub team_name: String,
  #[serde(default)]
  pub is_active: bool,
}

impl From<BatchUser> for User {
  fn from(u: BatchUser) -> Self {
    User {
      user_id:   u.user_id,
      username:  u.username,
      team_name: u.team_name,
      is_active: u.is_active,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct DeactivateBody {
  #[serde(default)]
  pub users: Vec<BatchUser>,
  pub flag:  bool,
}

#[derive(Debug, Serialize)]
pub struct DeactivateResponse {
  pub deactivated: Vec<String>,
}

/// `POST /users/deactivate`
pub async fn deactivate<S: ReviewStore>(
  State(services): State<Arc<Services<S>>>,
  payload: Result<Json<DeactivateBody>, JsonRejection>,
) -> Result<Json<DeactivateResponse>, ApiError> {
  let Json(body) = payload?;
  let users: Vec<User> = body.users.into_iter().map(User::from).collect();

  let deactivated = services
    .users
    .mass_deactivate(&services.context(), users, body.flag)
    .await?;
  Ok(Json(DeactivateResponse { deactivated }))
}

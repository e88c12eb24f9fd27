//! Handlers for `/pullRequest` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/pullRequest/create` | 201, 409 `PR_EXISTS` on a duplicate id |
//! | `POST` | `/pullRequest/merge` | Idempotent |
//! | `POST` | `/pullRequest/reassign` | `old_user_id` optional |

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use reviewd_core::{
  pull_request::PullRequest,
  service::{PullRequestService, Services},
  store::ReviewStore,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct PrResponse {
  pub pr: PullRequest,
}

fn required(field: &str, value: &str) -> Result<(), ApiError> {
  if value.trim().is_empty() {
    return Err(ApiError::BadRequest(format!("{field} is required")));
  }
  Ok(())
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub pull_request_id:   String,
  pub pull_request_name: String,
  pub author_id:         String,
}

/// `POST /pullRequest/create`
pub async fn create<S: ReviewStore>(
  State(services): State<Arc<Services<S>>>,
  payload: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = payload?;
  required("pull_request_id", &body.pull_request_id)?;
  required("pull_request_name", &body.pull_request_name)?;
  required("author_id", &body.author_id)?;

  let pr = services
    .pull_requests
    .create_pr(&services.context(), &body.pull_request_id, &body.pull_request_name, &body.author_id)
    .await?;
  Ok((StatusCode::CREATED, Json(PrResponse { pr })))
}

// ─── Merge ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MergeBody {
  pub pull_request_id: String,
}

/// `POST /pullRequest/merge`
pub async fn merge<S: ReviewStore>(
  State(services): State<Arc<Services<S>>>,
  payload: Result<Json<MergeBody>, JsonRejection>,
) -> Result<Json<PrResponse>, ApiError> {
  let Json(body) = payload?;
  required("pull_request_id", &body.pull_request_id)?;

  let pr = services.pull_requests.merge_pr(&services.context(), &body.pull_request_id).await?;
  Ok(Json(PrResponse { pr }))
}

// ─── Reassign ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReassignBody {
  pub pull_request_id: String,
  /// Absent or empty: add reviewers instead of replacing one.
  #[serde(default)]
  pub old_user_id:     Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReassignResponse {
  pub pr:          PullRequest,
  /// Comma-separated ids of the newly assigned reviewers.
  pub replaced_by: String,
}

/// `POST /pullRequest/reassign`
pub async fn reassign<S: ReviewStore>(
  State(services): State<Arc<Services<S>>>,
  payload: Result<Json<ReassignBody>, JsonRejection>,
) -> Result<Json<ReassignResponse>, ApiError> {
  let Json(body) = payload?;
  required("pull_request_id", &body.pull_request_id)?;
  let old = body.old_user_id.as_deref().map(str::trim).unwrap_or_default();

  let r = services
    .pull_requests
    .reassign_reviewer(&services.context(), &body.pull_request_id, old)
    .await?;
  Ok(Json(ReassignResponse {
    pr:          r.pull_request,
    replaced_by: r.replaced_by.join(","),
  }))
}

//! Handlers for `/team` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/team/add` | Body: a team with its members. 201 on success |
//! | `GET`  | `/team/get` | `?team_name=<name>`, 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
  http::StatusCode,
  response::IntoResponse,
};
use reviewd_core::{
  service::{Services, TeamService},
  store::ReviewStore,
  team::Team,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

// ─── Add ──────────────────────────────────────────────────────────────────────

/// `POST /team/add`, body: `{"team_name":"backend","members":[...]}`
pub async fn add<S: ReviewStore>(
  State(services): State<Arc<Services<S>>>,
  payload: Result<Json<Team>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(team) = payload?;
  let team = services.teams.add_team(&services.context(), team).await?;
  Ok((StatusCode::CREATED, Json(json!({ "team": team }))))
}

// ─── Get ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GetParams {
  pub team_name: String,
}

/// `GET /team/get?team_name=<name>`
pub async fn get<S: ReviewStore>(
  State(services): State<Arc<Services<S>>>,
  params: Result<Query<GetParams>, QueryRejection>,
) -> Result<Json<Team>, ApiError> {
  let Query(params) = params?;
  let team = services.teams.get_team(&services.context(), &params.team_name).await?;
  Ok(Json(team))
}

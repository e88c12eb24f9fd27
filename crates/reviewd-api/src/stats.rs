//! `GET /stats`: reviewer load over open pull requests.

use std::sync::Arc;

use axum::{Json, extract::State};
use reviewd_core::{
  service::{ReviewStats, Services},
  store::ReviewStore,
};

use crate::error::ApiError;

pub async fn handler<S: ReviewStore>(
  State(services): State<Arc<Services<S>>>,
) -> Result<Json<ReviewStats>, ApiError> {
  let stats = services.stats.snapshot(&services.context()).await?;
  Ok(Json(stats))
}

//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error is rendered as `{"error": {"code": "...", "message": "..."}}`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use reviewd_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Service(#[from] CoreError),

  /// Malformed body or query string, or a missing required field.
  #[error("bad request: {0}")]
  BadRequest(String),
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    let ApiError::Service(err) = self else {
      return StatusCode::BAD_REQUEST;
    };
    match err {
      CoreError::NotFound(_) => StatusCode::NOT_FOUND,
      CoreError::PrExists(_)
      | CoreError::PrMerged(_)
      | CoreError::NotAssigned { .. }
      | CoreError::NoCandidate(_)
      | CoreError::Conflict(_)
      | CoreError::MemberOfOtherTeam { .. } => StatusCode::CONFLICT,
      CoreError::TeamExists(_)
      | CoreError::UsersFromDifferentTeams
      | CoreError::EmptyRequest
      | CoreError::OnlyDeactivate
      | CoreError::InvalidUser
      | CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
      CoreError::Timeout => StatusCode::GATEWAY_TIMEOUT,
      CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      ApiError::Service(err) => err.code(),
      ApiError::BadRequest(_) => "BAD_REQUEST",
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::Service(CoreError::Internal(source)) => {
        tracing::error!(error = %source, "internal error");
        "internal server error".to_string()
      }
      other => other.to_string(),
    };
    let body = json!({ "error": { "code": self.code(), "message": message } });
    (status, Json(body)).into_response()
  }
}

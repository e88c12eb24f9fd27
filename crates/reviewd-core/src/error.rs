//! Error types for `reviewd-core`.
//!
//! Every variant maps to a stable machine-readable code (see [`Error::code`])
//! which the HTTP layer forwards to clients verbatim.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0} not found")]
  NotFound(String),

  #[error("pull request {0} already exists")]
  PrExists(String),

  #[error("team {0} already exists")]
  TeamExists(String),

  #[error("pull request {0} is merged")]
  PrMerged(String),

  #[error("user {reviewer} is not assigned to pull request {pr}")]
  NotAssigned { pr: String, reviewer: String },

  #[error("no active replacement candidate in team {0}")]
  NoCandidate(String),

  #[error("users belong to different teams")]
  UsersFromDifferentTeams,

  #[error("request contains no users")]
  EmptyRequest,

  #[error("only deactivation is supported")]
  OnlyDeactivate,

  #[error("user entry without user_id")]
  InvalidUser,

  #[error("user {user} already belongs to team {team}")]
  MemberOfOtherTeam { user: String, team: String },

  #[error("pull request {0} changed concurrently")]
  Conflict(String),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("deadline exceeded")]
  Timeout,

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap an unexpected backend failure.
  pub fn internal<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Internal(Box::new(err))
  }

  pub fn not_found(what: impl std::fmt::Display) -> Self {
    Self::NotFound(what.to_string())
  }

  /// The code reported to API clients.
  pub fn code(&self) -> &'static str {
    match self {
      Self::NotFound(_) => "NOT_FOUND",
      Self::PrExists(_) => "PR_EXISTS",
      Self::TeamExists(_) => "TEAM_EXISTS",
      Self::PrMerged(_) => "PR_MERGED",
      Self::NotAssigned { .. } => "NOT_ASSIGNED",
      Self::NoCandidate(_) => "NO_CANDIDATE",
      Self::UsersFromDifferentTeams => "USERS_FROM_DIFFERENT_TEAMS",
      Self::EmptyRequest => "EMPTY_REQUEST",
      Self::OnlyDeactivate => "ONLY_DEACTIVATE",
      Self::InvalidUser => "INVALID_USER",
      Self::MemberOfOtherTeam { .. } => "MEMBER_OF_OTHER_TEAM",
      Self::Conflict(_) => "CONFLICT",
      Self::InvalidInput(_) => "BAD_REQUEST",
      Self::Timeout => "TIMEOUT",
      Self::Internal(_) => "INTERNAL",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codes_are_stable() {
    assert_eq!(Error::not_found("user u1").code(), "NOT_FOUND");
    assert_eq!(Error::PrMerged("pr-1".into()).code(), "PR_MERGED");
    assert_eq!(
      Error::NotAssigned { pr: "pr-1".into(), reviewer: "u2".into() }.code(),
      "NOT_ASSIGNED"
    );
    assert_eq!(Error::UsersFromDifferentTeams.code(), "USERS_FROM_DIFFERENT_TEAMS");
    assert_eq!(Error::Conflict("pr-1".into()).code(), "CONFLICT");
    assert_eq!(Error::Timeout.code(), "TIMEOUT");
  }

  #[test]
  fn internal_keeps_source() {
    let io  = std::io::Error::other("disk on fire");
    let err = Error::internal(io);
    assert_eq!(err.code(), "INTERNAL");
    assert!(std::error::Error::source(&err).is_some());
    assert!(err.to_string().contains("disk on fire"));
  }
}

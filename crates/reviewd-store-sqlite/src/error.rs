//! Error type for `reviewd-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown pull request status: {0:?}")]
  UnknownStatus(String),

  /// A team registration named a user who already belongs to another team.
  #[error("user {user} already belongs to team {team}")]
  MemberOfOtherTeam { user: String, team: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for reviewd_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::MemberOfOtherTeam { user, team } => Self::MemberOfOtherTeam { user, team },
      other => Self::internal(other),
    }
  }
}

//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that lexical order matches chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use reviewd_core::{
  pull_request::{PrStatus, PullRequest, PullRequestShort},
  team::TeamMember,
  user::User,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── PrStatus ────────────────────────────────────────────────────────────────

pub fn encode_status(s: PrStatus) -> &'static str {
  match s {
    PrStatus::Open => "OPEN",
    PrStatus::Merged => "MERGED",
  }
}

pub fn decode_status(s: &str) -> Result<PrStatus> {
  match s {
    "OPEN" => Ok(PrStatus::Open),
    "MERGED" => Ok(PrStatus::Merged),
    other => Err(Error::UnknownStatus(other.to_owned())),
  }
}

// ─── SQL helpers ─────────────────────────────────────────────────────────────

/// `?, ?, ?` with `n` placeholders, for `IN (...)` lists.
pub fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `users` row as read from SQLite.
pub struct RawUser {
  pub user_id:   String,
  pub username:  String,
  pub team_name: String,
  pub is_active: bool,
}

impl RawUser {
  pub const COLUMNS: &'static str = "user_id, username, team_name, is_active";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:   row.get(0)?,
      username:  row.get(1)?,
      team_name: row.get(2)?,
      is_active: row.get(3)?,
    })
  }

  pub fn into_user(self) -> User {
    User {
      user_id:   self.user_id,
      username:  self.username,
      team_name: self.team_name,
      is_active: self.is_active,
    }
  }

  pub fn into_member(self) -> TeamMember { self.into_user().into() }
}

/// A `pull_requests` row plus its ordered reviewer ids.
pub struct RawPullRequest {
  pub pull_request_id:   String,
  pub pull_request_name: String,
  pub author_id:         String,
  pub status:            String,
  pub created_at:        String,
  pub merged_at:         Option<String>,
  pub reviewers:         Vec<String>,
}

impl RawPullRequest {
  pub fn into_pull_request(self) -> Result<PullRequest> {
    Ok(PullRequest {
      pull_request_id:    self.pull_request_id,
      pull_request_name:  self.pull_request_name,
      author_id:          self.author_id,
      status:             decode_status(&self.status)?,
      assigned_reviewers: self.reviewers,
      created_at:         Some(decode_dt(&self.created_at)?),
      merged_at:          self.merged_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// The columns needed for a [`PullRequestShort`].
pub struct RawPullRequestShort {
  pub pull_request_id:   String,
  pub pull_request_name: String,
  pub author_id:         String,
  pub status:            String,
}

impl RawPullRequestShort {
  pub fn into_short(self) -> Result<PullRequestShort> {
    Ok(PullRequestShort {
      pull_request_id:   self.pull_request_id,
      pull_request_name: self.pull_request_name,
      author_id:         self.author_id,
      status:            decode_status(&self.status)?,
    })
  }
}

//! Pull requests and their reviewer lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on reviewers per pull request.
pub const MAX_REVIEWERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrStatus {
  Open,
  Merged,
}

/// A pull request with its ordered reviewer list.
///
/// `merged_at` is `Some` exactly when `status` is [`PrStatus::Merged`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
  pub pull_request_id:    String,
  pub pull_request_name:  String,
  pub author_id:          String,
  pub status:             PrStatus,
  pub assigned_reviewers: Vec<String>,
  pub created_at:         Option<DateTime<Utc>>,
  pub merged_at:          Option<DateTime<Utc>>,
}

impl PullRequest {
  /// A new, not yet persisted, open pull request.
  pub fn open(
    id: impl Into<String>,
    name: impl Into<String>,
    author_id: impl Into<String>,
    reviewers: Vec<String>,
  ) -> Self {
    Self {
      pull_request_id:    id.into(),
      pull_request_name:  name.into(),
      author_id:          author_id.into(),
      status:             PrStatus::Open,
      assigned_reviewers: reviewers,
      created_at:         Some(Utc::now()),
      merged_at:          None,
    }
  }

  pub fn is_merged(&self) -> bool { self.status == PrStatus::Merged }

  pub fn has_reviewer(&self, user_id: &str) -> bool {
    self.assigned_reviewers.iter().any(|r| r == user_id)
  }

  /// Transition to merged. Returns `false` if already merged.
  pub fn merge(&mut self, at: DateTime<Utc>) -> bool {
    if self.is_merged() {
      return false;
    }
    self.status    = PrStatus::Merged;
    self.merged_at = Some(at);
    true
  }
}

/// Summary row used in reviewer listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestShort {
  pub pull_request_id:   String,
  pub pull_request_name: String,
  pub author_id:         String,
  pub status:            PrStatus,
}

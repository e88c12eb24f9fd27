//! Storage contracts consumed by the services.
//!
//! The traits are implemented by storage backends (e.g.
//! `reviewd-store-sqlite`). Each multi-row write documented below must be
//! atomic in the backend: either every row it touches is written, or none
//! are. Creation methods report a duplicate key by returning `false` rather
//! than erroring, and must detect it with a uniqueness constraint, not a
//! separate existence query.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::{collections::HashMap, future::Future};

use crate::{
  pull_request::{PullRequest, PullRequestShort},
  team::Team,
  user::User,
};

/// Shared error type of a storage backend.
pub trait Backend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;
}

// ─── Teams ───────────────────────────────────────────────────────────────────

pub trait TeamStore: Backend {
  fn team_exists(
    &self,
    name: &str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  /// Insert the team and upsert all of its members in one transaction.
  ///
  /// Returns `Ok(false)` without writing anything if the team name is taken.
  /// A member already registered in another team aborts the whole insert
  /// with [`crate::Error::MemberOfOtherTeam`] (converted from the backend
  /// error).
  fn add_team(
    &self,
    team: &Team,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  /// Members are returned in insertion order.
  fn get_team(
    &self,
    name: &str,
  ) -> impl Future<Output = Result<Option<Team>, Self::Error>> + Send;
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub trait UserStore: Backend {
  fn get_user(
    &self,
    user_id: &str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send;

  /// Returns `Ok(false)` if no such user exists.
  fn set_active(
    &self,
    user_id: &str,
    active: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  /// Active users of `team`, minus every id in `exclude`.
  fn active_users_by_team(
    &self,
    team: &str,
    exclude: &[String],
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send;

  /// Every pull request (open or merged) reviewed by `user_id`, newest first.
  fn prs_for_reviewer(
    &self,
    user_id: &str,
  ) -> impl Future<Output = Result<Vec<PullRequestShort>, Self::Error>> + Send;

  /// In a single transaction: deactivate `user_ids` within `team`, remove
  /// them from every open pull request they review, and give each pull
  /// request left without reviewers one active replacement from `team` (not
  /// its author, not one of `user_ids`) when one exists.
  fn mass_deactivate_and_reassign(
    &self,
    team: &str,
    user_ids: &[String],
  ) -> impl Future<Output = Result<MassDeactivation, Self::Error>> + Send;
}

/// What a mass deactivation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MassDeactivation {
  /// Ids that belonged to the team and were deactivated, in request order.
  pub deactivated:    Vec<String>,
  pub prs_touched:    usize,
  pub prs_backfilled: usize,
  /// Pull requests left with no reviewer because the team had nobody left.
  pub prs_left_empty: usize,
}

// ─── Pull requests ───────────────────────────────────────────────────────────

pub trait PullRequestStore: Backend {
  fn pr_exists(
    &self,
    pr_id: &str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  /// Insert the pull request row and its reviewer rows in one transaction.
  ///
  /// Returns `Ok(false)` without writing anything if the id is taken.
  fn create_pr(
    &self,
    pr: &PullRequest,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  /// Reviewers are returned in their canonical (persisted) order.
  fn get_pr(
    &self,
    pr_id: &str,
  ) -> impl Future<Output = Result<Option<PullRequest>, Self::Error>> + Send;

  /// Persist name, status and `merged_at` of an open pull request.
  ///
  /// Returns `Ok(false)` if the pull request is missing or already merged.
  fn update_pr(
    &self,
    pr: &PullRequest,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  /// Replace the reviewer list of an open pull request, keeping the
  /// assignment time of reviewers that stay.
  ///
  /// The write only happens if the stored list still equals `expected`
  /// (same ids, same order); otherwise nothing is written and
  /// [`ReviewerWrite::Stale`] is returned.
  fn update_reviewers(
    &self,
    pr_id: &str,
    expected: &[String],
    reviewer_ids: &[String],
  ) -> impl Future<Output = Result<ReviewerWrite, Self::Error>> + Send;

  /// Ids of open pull requests reviewed by `user_id`, oldest first.
  fn open_prs_by_reviewer(
    &self,
    user_id: &str,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send;
}

/// Outcome of [`PullRequestStore::update_reviewers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewerWrite {
  Written,
  /// Another writer changed the list since it was read.
  Stale,
  /// The pull request is missing or merged.
  Closed,
}

// ─── Read-side statistics ────────────────────────────────────────────────────

pub trait StatsStore: Backend {
  /// Reviewer count for every open pull request, including zero.
  fn reviewers_per_open_pr(
    &self,
  ) -> impl Future<Output = Result<HashMap<String, usize>, Self::Error>> + Send;

  /// Number of open pull requests each reviewer is assigned to.
  fn open_prs_per_reviewer(
    &self,
  ) -> impl Future<Output = Result<HashMap<String, usize>, Self::Error>> + Send;
}

/// Everything the services need from a backend.
pub trait ReviewStore: TeamStore + UserStore + PullRequestStore + StatsStore {}

impl<T> ReviewStore for T where T: TeamStore + UserStore + PullRequestStore + StatsStore {}

//! Stateless orchestrators over a [`ReviewStore`].
//!
//! Each service is exposed as a trait with a single concrete implementation
//! generic over the backend. Every method takes the caller's [`Context`];
//! storage calls are awaited through [`Context::run`].

mod assignment;
mod stats;
mod team;
mod user;

use std::{collections::BTreeMap, future::Future, sync::Arc};

pub use assignment::ReviewerAssigner;
pub use stats::{ReviewStats, StatsReader};
pub use team::TeamRegistry;
pub use user::UserStatusManager;

use crate::{
  Result,
  config::ServiceConfig,
  context::Context,
  pull_request::{PullRequest, PullRequestShort},
  store::ReviewStore,
  team::Team,
  user::User,
};

// ─── Traits ──────────────────────────────────────────────────────────────────

pub trait TeamService: Send + Sync {
  /// Register a team with its members. Fails with `TeamExists` if the name
  /// is taken.
  fn add_team(
    &self,
    ctx: &Context,
    team: Team,
  ) -> impl Future<Output = Result<Team>> + Send;

  fn get_team(
    &self,
    ctx: &Context,
    name: &str,
  ) -> impl Future<Output = Result<Team>> + Send;
}

/// Result of [`PullRequestService::reassign_reviewer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
  pub pull_request: PullRequest,
  /// Newly assigned reviewers; empty when nothing changed.
  pub replaced_by:  Vec<String>,
}

pub trait PullRequestService: Send + Sync {
  fn create_pr(
    &self,
    ctx: &Context,
    pr_id: &str,
    pr_name: &str,
    author_id: &str,
  ) -> impl Future<Output = Result<PullRequest>> + Send;

  /// Idempotent: merging a merged pull request returns it unchanged.
  fn merge_pr(
    &self,
    ctx: &Context,
    pr_id: &str,
  ) -> impl Future<Output = Result<PullRequest>> + Send;

  /// Replace `old_reviewer_id`, or add reviewers when it is empty.
  fn reassign_reviewer(
    &self,
    ctx: &Context,
    pr_id: &str,
    old_reviewer_id: &str,
  ) -> impl Future<Output = Result<Reassignment>> + Send;
}

pub trait UserService: Send + Sync {
  /// Set a user's active flag, cascading reviewer cleanup on deactivation.
  fn change_status(
    &self,
    ctx: &Context,
    user_id: &str,
    is_active: bool,
  ) -> impl Future<Output = Result<User>> + Send;

  /// Deactivate a whole batch of users from one team atomically.
  ///
  /// Returns the ids that were actually deactivated. Requested users that
  /// are not members of the team are skipped.
  fn mass_deactivate(
    &self,
    ctx: &Context,
    users: Vec<User>,
    flag: bool,
  ) -> impl Future<Output = Result<Vec<String>>> + Send;

  /// Pull requests `user_id` reviews, newest first.
  fn reviews(
    &self,
    ctx: &Context,
    user_id: &str,
  ) -> impl Future<Output = Result<(String, Vec<PullRequestShort>)>> + Send;
}

/// Read-only reviewer load counters over open pull requests.
pub trait StatsService: Send + Sync {
  /// Open pull request id → reviewer count, including zero.
  fn assigned_reviewers_per_pr(
    &self,
    ctx: &Context,
  ) -> impl Future<Output = Result<BTreeMap<String, usize>>> + Send;

  /// Reviewer id → number of open pull requests assigned.
  fn open_prs_per_user(
    &self,
    ctx: &Context,
  ) -> impl Future<Output = Result<BTreeMap<String, usize>>> + Send;
}

// ─── Bundle ──────────────────────────────────────────────────────────────────

/// All services wired to one backend.
///
/// Cloning is cheap; every service shares the same `Arc`'d store.
pub struct Services<S> {
  pub teams:         TeamRegistry<S>,
  pub users:         UserStatusManager<S>,
  pub pull_requests: ReviewerAssigner<S>,
  pub stats:         StatsReader<S>,
  pub config:        ServiceConfig,
}

impl<S: ReviewStore> Services<S> {
  pub fn new(store: Arc<S>, config: ServiceConfig) -> Self {
    let pull_requests = ReviewerAssigner::new(store.clone());
    Self {
      teams: TeamRegistry::new(store.clone()),
      users: UserStatusManager::new(store.clone(), pull_requests.clone(), config.clone()),
      pull_requests,
      stats: StatsReader::new(store),
      config,
    }
  }

  /// A fresh request context using the configured request timeout.
  pub fn context(&self) -> Context { Context::with_timeout(self.config.request_timeout()) }
}

impl<S> Clone for Services<S> {
  fn clone(&self) -> Self {
    Self {
      teams:         self.teams.clone(),
      users:         self.users.clone(),
      pull_requests: self.pull_requests.clone(),
      stats:         self.stats.clone(),
      config:        self.config.clone(),
    }
  }
}

//! User activation and the reviewer cascade triggered by deactivation.

use std::sync::Arc;

use crate::{
  Error, Result,
  config::ServiceConfig,
  context::Context,
  pull_request::PullRequestShort,
  service::{PullRequestService, ReviewerAssigner, UserService},
  store::ReviewStore,
  user::User,
};

/// [`UserService`] over a [`ReviewStore`].
pub struct UserStatusManager<S> {
  store:    Arc<S>,
  assigner: ReviewerAssigner<S>,
  config:   ServiceConfig,
}

impl<S> UserStatusManager<S> {
  pub fn new(store: Arc<S>, assigner: ReviewerAssigner<S>, config: ServiceConfig) -> Self {
    Self { store, assigner, config }
  }
}

impl<S> Clone for UserStatusManager<S> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      assigner: self.assigner.clone(),
      config:   self.config.clone(),
    }
  }
}

impl<S: ReviewStore> UserStatusManager<S> {
  async fn fetch_user(&self, ctx: &Context, user_id: &str) -> Result<User> {
    ctx
      .run(self.store.get_user(user_id))
      .await?
      .ok_or_else(|| Error::not_found(format!("user {user_id}")))
  }

  /// Replace `user_id` on up to `cascade_limit` of their open pull requests,
  /// dropping them outright where no replacement can be found.
  ///
  /// Each pull request gets its own sub-deadline; a failure on one never
  /// stops the rest.
  async fn release_reviews(&self, ctx: &Context, user_id: &str) -> Result<()> {
    let mut open = ctx.run(self.store.open_prs_by_reviewer(user_id)).await?;
    if open.len() > self.config.cascade_limit {
      tracing::warn!(
        user = user_id,
        open = open.len(),
        limit = self.config.cascade_limit,
        "deactivated user keeps reviews beyond the cascade limit"
      );
      open.truncate(self.config.cascade_limit);
    }

    for pr_id in &open {
      let sub = ctx.child(self.config.reassign_timeout());
      match self.assigner.reassign_reviewer(&sub, pr_id, user_id).await {
        Ok(r) => {
          tracing::debug!(pr = %pr_id, user = user_id, replaced_by = ?r.replaced_by, "review handed over");
        }
        Err(reason) => {
          tracing::info!(pr = %pr_id, user = user_id, %reason, "no replacement, removing reviewer");
          if let Err(err) = self.assigner.remove_reviewer(ctx, pr_id, user_id).await {
            tracing::warn!(pr = %pr_id, user = user_id, error = %err, "failed to remove reviewer");
          }
        }
      }
    }
    Ok(())
  }

  /// Work out the single team every user in the batch belongs to.
  async fn common_team(&self, ctx: &Context, users: &[User]) -> Result<String> {
    let first = &users[0];
    if first.user_id.trim().is_empty() {
      return Err(Error::InvalidUser);
    }
    let team = self.team_of(ctx, first).await?;

    for user in &users[1..] {
      if user.user_id.trim().is_empty() {
        return Err(Error::InvalidUser);
      }
      if self.team_of(ctx, user).await? != team {
        return Err(Error::UsersFromDifferentTeams);
      }
    }
    Ok(team)
  }

  async fn team_of(&self, ctx: &Context, user: &User) -> Result<String> {
    if !user.team_name.is_empty() {
      return Ok(user.team_name.clone());
    }
    Ok(self.fetch_user(ctx, &user.user_id).await?.team_name)
  }
}

impl<S: ReviewStore> UserService for UserStatusManager<S> {
  async fn change_status(&self, ctx: &Context, user_id: &str, is_active: bool) -> Result<User> {
    let user = self.fetch_user(ctx, user_id).await?;

    if user.is_active && !is_active {
      self.release_reviews(ctx, user_id).await?;
    }

    if !ctx.run(self.store.set_active(user_id, is_active)).await? {
      return Err(Error::not_found(format!("user {user_id}")));
    }
    tracing::info!(user = user_id, is_active, "user status changed");

    self.fetch_user(ctx, user_id).await
  }

  async fn mass_deactivate(
    &self,
    ctx: &Context,
    users: Vec<User>,
    flag: bool,
  ) -> Result<Vec<String>> {
    if flag {
      return Err(Error::OnlyDeactivate);
    }
    if users.is_empty() {
      return Err(Error::EmptyRequest);
    }

    // Every precondition is checked before anything is written.
    let team = self.common_team(ctx, &users).await?;

    let mut ids: Vec<String> = Vec::with_capacity(users.len());
    for user in users {
      if !ids.contains(&user.user_id) {
        ids.push(user.user_id);
      }
    }

    let summary = ctx.run(self.store.mass_deactivate_and_reassign(&team, &ids)).await?;
    tracing::info!(
      team = %team,
      requested = ids.len(),
      deactivated = summary.deactivated.len(),
      prs_touched = summary.prs_touched,
      prs_backfilled = summary.prs_backfilled,
      "users deactivated"
    );
    if summary.prs_left_empty > 0 {
      tracing::warn!(
        team = %team,
        prs = summary.prs_left_empty,
        "pull requests left without reviewers"
      );
    }
    Ok(summary.deactivated)
  }

  async fn reviews(&self, ctx: &Context, user_id: &str) -> Result<(String, Vec<PullRequestShort>)> {
    let user = self.fetch_user(ctx, user_id).await?;
    let prs  = ctx.run(self.store.prs_for_reviewer(user_id)).await?;
    Ok((user.user_id, prs))
  }
}

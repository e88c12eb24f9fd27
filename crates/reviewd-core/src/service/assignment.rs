//! Pull request creation, merge and reviewer reassignment.

use std::sync::Arc;

use chrono::Utc;

use crate::{
  Error, Result,
  context::Context,
  policy,
  pull_request::{MAX_REVIEWERS, PullRequest},
  service::{PullRequestService, Reassignment},
  store::{ReviewStore, ReviewerWrite},
  user::User,
};

/// Reads and writes of one reviewer change before giving up on a pull
/// request that keeps changing underneath.
const WRITE_ATTEMPTS: usize = 3;

/// [`PullRequestService`] over a [`ReviewStore`].
pub struct ReviewerAssigner<S> {
  store: Arc<S>,
}

impl<S> ReviewerAssigner<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }
}

impl<S> Clone for ReviewerAssigner<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: ReviewStore> ReviewerAssigner<S> {
  async fn fetch_pr(&self, ctx: &Context, pr_id: &str) -> Result<PullRequest> {
    ctx
      .run(self.store.get_pr(pr_id))
      .await?
      .ok_or_else(|| Error::not_found(format!("pull request {pr_id}")))
  }

  async fn fetch_open_pr(&self, ctx: &Context, pr_id: &str) -> Result<PullRequest> {
    let pr = self.fetch_pr(ctx, pr_id).await?;
    if pr.is_merged() {
      return Err(Error::PrMerged(pr.pull_request_id));
    }
    Ok(pr)
  }

  async fn fetch_user(&self, ctx: &Context, user_id: &str) -> Result<User> {
    ctx
      .run(self.store.get_user(user_id))
      .await?
      .ok_or_else(|| Error::not_found(format!("user {user_id}")))
  }

  async fn candidates(
    &self,
    ctx: &Context,
    team: &str,
    exclude: &[String],
  ) -> Result<Vec<User>> {
    let pool = ctx.run(self.store.active_users_by_team(team, exclude)).await?;
    tracing::debug!(team, excluded = exclude.len(), candidates = pool.len(), "candidate pool");
    Ok(pool)
  }

  /// Swap the reviewer list read in `pr` for `reviewers` and return the pull
  /// request as stored, or `None` if the list changed since `pr` was read.
  async fn persist_reviewers(
    &self,
    ctx: &Context,
    pr: &PullRequest,
    reviewers: &[String],
  ) -> Result<Option<PullRequest>> {
    let pr_id = pr.pull_request_id.as_str();
    let write = self.store.update_reviewers(pr_id, &pr.assigned_reviewers, reviewers);
    match ctx.run(write).await? {
      ReviewerWrite::Written => self.fetch_pr(ctx, pr_id).await.map(Some),
      ReviewerWrite::Stale => {
        tracing::debug!(pr = pr_id, "reviewer list changed concurrently");
        Ok(None)
      }
      ReviewerWrite::Closed => {
        // Merged or deleted after it was read.
        let current = self.fetch_pr(ctx, pr_id).await?;
        Err(if current.is_merged() {
          Error::PrMerged(current.pull_request_id)
        } else {
          Error::not_found(format!("pull request {pr_id}"))
        })
      }
    }
  }

  /// Drop `user_id` from the reviewers of `pr_id` without picking a
  /// replacement. A no-op if the user is not assigned.
  pub async fn remove_reviewer(&self, ctx: &Context, pr_id: &str, user_id: &str) -> Result<()> {
    for _ in 0..WRITE_ATTEMPTS {
      let pr = self.fetch_open_pr(ctx, pr_id).await?;
      if !pr.has_reviewer(user_id) {
        return Ok(());
      }
      let remaining: Vec<String> = pr
        .assigned_reviewers
        .iter()
        .filter(|r| *r != user_id)
        .cloned()
        .collect();
      if self.persist_reviewers(ctx, &pr, &remaining).await?.is_some() {
        tracing::info!(pr = pr_id, reviewer = user_id, "reviewer removed");
        return Ok(());
      }
    }
    Err(Error::Conflict(pr_id.to_owned()))
  }

  /// `Ok(None)` means another writer got there first and `pr` is stale.
  async fn replace(
    &self,
    ctx: &Context,
    pr: PullRequest,
    old: &str,
  ) -> Result<Option<Reassignment>> {
    if !pr.has_reviewer(old) {
      return Err(Error::NotAssigned {
        pr:       pr.pull_request_id,
        reviewer: old.to_owned(),
      });
    }

    let old_user = self.fetch_user(ctx, old).await?;

    // Co-reviewers are excluded too, so the list never holds duplicates.
    let mut exclude = Vec::with_capacity(pr.assigned_reviewers.len() + 1);
    exclude.push(pr.author_id.clone());
    exclude.extend(pr.assigned_reviewers.iter().cloned());

    let pool   = self.candidates(ctx, &old_user.team_name, &exclude).await?;
    let new_id = policy::select_replacement(&pool, &mut rand::thread_rng())
      .ok_or_else(|| Error::NoCandidate(old_user.team_name.clone()))?;

    let reviewers: Vec<String> = pr
      .assigned_reviewers
      .iter()
      .map(|r| if r == old { new_id.clone() } else { r.clone() })
      .collect();

    let Some(updated) = self.persist_reviewers(ctx, &pr, &reviewers).await? else {
      return Ok(None);
    };
    tracing::info!(
      pr = %updated.pull_request_id,
      old_reviewer = old,
      new_reviewer = %new_id,
      "reviewer reassigned"
    );
    Ok(Some(Reassignment { pull_request: updated, replaced_by: vec![new_id] }))
  }

  async fn assign_new(&self, ctx: &Context, pr: PullRequest) -> Result<Option<Reassignment>> {
    if pr.assigned_reviewers.len() >= MAX_REVIEWERS {
      return Ok(Some(Reassignment { pull_request: pr, replaced_by: Vec::new() }));
    }

    let author = self.fetch_user(ctx, &pr.author_id).await?;
    let mut exclude = Vec::with_capacity(pr.assigned_reviewers.len() + 1);
    exclude.push(author.user_id.clone());
    exclude.extend(pr.assigned_reviewers.iter().cloned());

    let pool = self.candidates(ctx, &author.team_name, &exclude).await?;

    let added = if pr.assigned_reviewers.is_empty() {
      let batch = policy::select_fallback_batch(&pool, &mut rand::thread_rng());
      if batch.is_empty() {
        return Ok(Some(Reassignment { pull_request: pr, replaced_by: Vec::new() }));
      }
      batch
    } else {
      let one = policy::select_replacement(&pool, &mut rand::thread_rng())
        .ok_or_else(|| Error::NoCandidate(author.team_name.clone()))?;
      vec![one]
    };

    let mut reviewers = pr.assigned_reviewers.clone();
    reviewers.extend(added.iter().cloned());

    let Some(updated) = self.persist_reviewers(ctx, &pr, &reviewers).await? else {
      return Ok(None);
    };
    tracing::info!(pr = %updated.pull_request_id, added = ?added, "reviewers added");
    Ok(Some(Reassignment { pull_request: updated, replaced_by: added }))
  }
}

impl<S: ReviewStore> PullRequestService for ReviewerAssigner<S> {
  async fn create_pr(
    &self,
    ctx: &Context,
    pr_id: &str,
    pr_name: &str,
    author_id: &str,
  ) -> Result<PullRequest> {
    if pr_id.trim().is_empty() || author_id.trim().is_empty() {
      return Err(Error::InvalidInput("pull_request_id and author_id are required".into()));
    }

    if ctx.run(self.store.pr_exists(pr_id)).await? {
      return Err(Error::PrExists(pr_id.to_owned()));
    }

    let author = self.fetch_user(ctx, author_id).await?;
    if !ctx.run(self.store.team_exists(&author.team_name)).await? {
      return Err(Error::not_found(format!("team {}", author.team_name)));
    }

    let pool      = self.candidates(ctx, &author.team_name, &[author.user_id.clone()]).await?;
    let reviewers = policy::select_initial(&pool, &mut rand::thread_rng());
    let pr        = PullRequest::open(pr_id, pr_name, author_id, reviewers);

    // A concurrent creator of the same id loses on the primary key.
    if !ctx.run(self.store.create_pr(&pr)).await? {
      return Err(Error::PrExists(pr_id.to_owned()));
    }

    tracing::info!(
      pr = pr_id,
      author = author_id,
      reviewers = ?pr.assigned_reviewers,
      "pull request created"
    );
    self.fetch_pr(ctx, pr_id).await
  }

  async fn merge_pr(&self, ctx: &Context, pr_id: &str) -> Result<PullRequest> {
    let mut pr = self.fetch_pr(ctx, pr_id).await?;
    if !pr.merge(Utc::now()) {
      return Ok(pr);
    }

    if ctx.run(self.store.update_pr(&pr)).await? {
      tracing::info!(pr = pr_id, "pull request merged");
    } else {
      tracing::debug!(pr = pr_id, "pull request merged concurrently");
    }
    self.fetch_pr(ctx, pr_id).await
  }

  async fn reassign_reviewer(
    &self,
    ctx: &Context,
    pr_id: &str,
    old_reviewer_id: &str,
  ) -> Result<Reassignment> {
    // Each attempt starts from a fresh read, so a reviewer replaced by a
    // concurrent call is reported as not assigned.
    for _ in 0..WRITE_ATTEMPTS {
      let pr = self.fetch_open_pr(ctx, pr_id).await?;
      let outcome = if old_reviewer_id.is_empty() {
        self.assign_new(ctx, pr).await?
      } else {
        self.replace(ctx, pr, old_reviewer_id).await?
      };
      if let Some(reassignment) = outcome {
        return Ok(reassignment);
      }
    }
    Err(Error::Conflict(pr_id.to_owned()))
  }
}

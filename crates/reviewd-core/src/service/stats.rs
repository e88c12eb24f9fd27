//! Read-only reviewer load statistics.

use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;

use crate::{Result, context::Context, service::StatsService, store::StatsStore};

/// Snapshot of reviewer load across open pull requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewStats {
  /// Open pull request id → number of assigned reviewers.
  pub assigned_reviewers_per_pr: BTreeMap<String, usize>,
  /// Reviewer id → number of open pull requests they are assigned to.
  pub open_prs_per_user:         BTreeMap<String, usize>,
}

pub struct StatsReader<S> {
  store: Arc<S>,
}

impl<S> StatsReader<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }
}

impl<S> Clone for StatsReader<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: StatsStore> StatsReader<S> {
  /// Both counters, read one after the other.
  pub async fn snapshot(&self, ctx: &Context) -> Result<ReviewStats> {
    Ok(ReviewStats {
      assigned_reviewers_per_pr: self.assigned_reviewers_per_pr(ctx).await?,
      open_prs_per_user:         self.open_prs_per_user(ctx).await?,
    })
  }
}

impl<S: StatsStore> StatsService for StatsReader<S> {
  async fn assigned_reviewers_per_pr(&self, ctx: &Context) -> Result<BTreeMap<String, usize>> {
    let counts = ctx.run(self.store.reviewers_per_open_pr()).await?;
    Ok(counts.into_iter().collect())
  }

  async fn open_prs_per_user(&self, ctx: &Context) -> Result<BTreeMap<String, usize>> {
    let counts = ctx.run(self.store.open_prs_per_reviewer()).await?;
    Ok(counts.into_iter().collect())
  }
}

use std::sync::Arc;

use crate::{
  Error, Result,
  context::Context,
  service::TeamService,
  store::TeamStore,
  team::Team,
};

/// [`TeamService`] over a [`TeamStore`].
pub struct TeamRegistry<S> {
  store: Arc<S>,
}

impl<S> TeamRegistry<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }
}

impl<S> Clone for TeamRegistry<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: TeamStore> TeamService for TeamRegistry<S> {
  async fn add_team(&self, ctx: &Context, team: Team) -> Result<Team> {
    if team.team_name.trim().is_empty() {
      return Err(Error::InvalidInput("team_name is required".into()));
    }
    if team.members.iter().any(|m| m.user_id.trim().is_empty()) {
      return Err(Error::InvalidInput("member user_id is required".into()));
    }

    if ctx.run(self.store.team_exists(&team.team_name)).await? {
      return Err(Error::TeamExists(team.team_name));
    }
    // A concurrent registration of the same name is rejected by the store.
    if !ctx.run(self.store.add_team(&team)).await? {
      return Err(Error::TeamExists(team.team_name));
    }

    tracing::info!(team = %team.team_name, members = team.members.len(), "team created");
    self.get_team(ctx, &team.team_name).await
  }

  async fn get_team(&self, ctx: &Context, name: &str) -> Result<Team> {
    ctx
      .run(self.store.get_team(name))
      .await?
      .ok_or_else(|| Error::not_found(format!("team {name}")))
  }
}

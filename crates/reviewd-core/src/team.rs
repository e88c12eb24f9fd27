//! Teams and their members.

use serde::{Deserialize, Serialize};

/// A member as listed in a team. This is a projection of the
/// [`User`](crate::user::User) record without the team name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
  pub user_id:   String,
  pub username:  String,
  pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
  pub team_name: String,
  #[serde(default)]
  pub members:   Vec<TeamMember>,
}

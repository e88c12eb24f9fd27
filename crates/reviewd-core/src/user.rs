//! The authoritative user record.

use serde::{Deserialize, Serialize};

use crate::team::TeamMember;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:   String,
  pub username:  String,
  pub team_name: String,
  pub is_active: bool,
}

impl From<User> for TeamMember {
  fn from(u: User) -> Self {
    TeamMember { user_id: u.user_id, username: u.username, is_active: u.is_active }
  }
}

//! Tunables for the assignment services.

use std::time::Duration;

use serde::Deserialize;

/// Service-level configuration, usually nested under `[services]` in the
/// server's `config.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
  /// Deadline for a whole request, in milliseconds.
  pub request_timeout_ms:  u64,
  /// Sub-deadline for each reassignment attempt inside a deactivation
  /// cascade, in milliseconds.
  pub reassign_timeout_ms: u64,
  /// Maximum number of open pull requests processed when a single user is
  /// deactivated.
  pub cascade_limit:       usize,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      request_timeout_ms:  300,
      reassign_timeout_ms: 100,
      cascade_limit:       5,
    }
  }
}

impl ServiceConfig {
  pub fn request_timeout(&self) -> Duration { Duration::from_millis(self.request_timeout_ms) }

  pub fn reassign_timeout(&self) -> Duration { Duration::from_millis(self.reassign_timeout_ms) }
}

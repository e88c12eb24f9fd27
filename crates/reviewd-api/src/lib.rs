//! JSON HTTP API for reviewd.
//!
//! Exposes an axum [`Router`] backed by the [`Services`] of any
//! [`ReviewStore`]. Each request gets a fresh
//! [`Context`](reviewd_core::Context) carrying the configured request
//! timeout. TLS, auth and request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let services = Arc::new(Services::new(store, config.services.clone()));
//! let app = reviewd_api::api_router(services);
//! ```

pub mod error;
pub mod pull_requests;
pub mod stats;
pub mod team;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use reviewd_core::{service::Services, store::ReviewStore};

pub use error::ApiError;

/// Build a fully-materialised API router over `services`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(services: Arc<Services<S>>) -> Router<()>
where
  S: ReviewStore + 'static,
{
  Router::new()
    // Teams
    .route("/team/add", post(team::add::<S>))
    .route("/team/get", get(team::get::<S>))
    // Users
    .route("/users/setIsActive", post(users::set_is_active::<S>))
    .route("/users/getReview", get(users::get_review::<S>))
    .route("/users/deactivate", post(users::deactivate::<S>))
    // Pull requests
    .route("/pullRequest/create", post(pull_requests::create::<S>))
    .route("/pullRequest/merge", post(pull_requests::merge::<S>))
    .route("/pullRequest/reassign", post(pull_requests::reassign::<S>))
    // Stats
    .route("/stats", get(stats::handler::<S>))
    .with_state(services)
}

#[cfg(test)]
mod tests;

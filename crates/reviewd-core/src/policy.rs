//! Reviewer selection policy.
//!
//! Pure functions over an already-filtered candidate pool. Working out who
//! belongs in the pool (active team members minus the author and anyone
//! already assigned or being removed) is the caller's job.

use rand::{Rng, seq::SliceRandom};

use crate::{pull_request::MAX_REVIEWERS, user::User};

/// Pick up to [`MAX_REVIEWERS`] distinct reviewers uniformly at random.
///
/// An empty pool yields an empty selection; a pull request may legally have
/// no reviewers.
pub fn select_initial<R: Rng + ?Sized>(candidates: &[User], rng: &mut R) -> Vec<String> {
  select_up_to(candidates, MAX_REVIEWERS, rng)
}

/// Pick a single replacement uniformly at random, or `None` if the pool is
/// empty.
pub fn select_replacement<R: Rng + ?Sized>(candidates: &[User], rng: &mut R) -> Option<String> {
  candidates.choose(rng).map(|u| u.user_id.clone())
}

/// Repopulate a pull request that lost all of its reviewers.
pub fn select_fallback_batch<R: Rng + ?Sized>(candidates: &[User], rng: &mut R) -> Vec<String> {
  select_up_to(candidates, MAX_REVIEWERS, rng)
}

fn select_up_to<R: Rng + ?Sized>(candidates: &[User], n: usize, rng: &mut R) -> Vec<String> {
  candidates
    .choose_multiple(rng, n.min(candidates.len()))
    .map(|u| u.user_id.clone())
    .collect()
}

//! Request-scoped deadline and cancellation.
//!
//! A [`Context`] is created by the caller of a service (usually the HTTP
//! layer) and passed explicitly to every service method. Storage futures are
//! awaited through [`Context::run`], so an elapsed deadline or a cancelled
//! token surfaces as [`Error::Timeout`] instead of a hung request.

use std::{future::Future, time::Duration};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct Context {
  deadline: Instant,
  cancel:   CancellationToken,
}

impl Context {
  /// A fresh context expiring `timeout` from now.
  pub fn with_timeout(timeout: Duration) -> Self {
    Self {
      deadline: Instant::now() + timeout,
      cancel:   CancellationToken::new(),
    }
  }

  /// Derive a sub-context that expires no later than `self` and no later
  /// than `timeout` from now.
  ///
  /// Cancelling the parent cancels the child; the reverse does not hold.
  pub fn child(&self, timeout: Duration) -> Self {
    Self {
      deadline: self.deadline.min(Instant::now() + timeout),
      cancel:   self.cancel.child_token(),
    }
  }

  pub fn deadline(&self) -> Instant { self.deadline }

  pub fn cancel(&self) { self.cancel.cancel() }

  pub fn is_done(&self) -> bool {
    self.cancel.is_cancelled() || Instant::now() >= self.deadline
  }

  /// Await `fut` under this context's deadline and cancellation token.
  ///
  /// The backend error type is converted into [`Error`]; expiry and
  /// cancellation both yield [`Error::Timeout`].
  pub async fn run<T, E, F>(&self, fut: F) -> Result<T>
  where
    F: Future<Output = Result<T, E>>,
    E: Into<Error>,
  {
    if self.cancel.is_cancelled() {
      return Err(Error::Timeout);
    }
    tokio::select! {
      biased;
      _ = self.cancel.cancelled() => Err(Error::Timeout),
      res = tokio::time::timeout_at(self.deadline, fut) => match res {
        Ok(inner) => inner.map_err(Into::into),
        Err(_)    => Err(Error::Timeout),
      },
    }
  }
}

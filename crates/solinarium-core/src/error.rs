//! Error types for `solinarium-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("relationship not found: {0}")]
  NotFound(Uuid),

  #[error("already friends")]
  AlreadyFriends,

  #[error("friend request already pending")]
  RequestAlreadyPending,

  /// Reserved: no operation currently produces a blocked relationship.
  #[error("relationship is blocked")]
  Blocked,

  #[error("relationship {0} is not a pending request")]
  NotPending(Uuid),

  #[error("cannot send a friend request to yourself")]
  SelfRequest,

  #[error("caller is not a permitted party to relationship {0}")]
  Unauthorized(Uuid),

  #[error("user id must not be empty")]
  InvalidUserId,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error without altering it.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Whether the error reports a clash with the current relationship state
  /// rather than a missing record or a backend failure.
  pub fn is_conflict(&self) -> bool {
    matches!(
      self,
      Self::AlreadyFriends
        | Self::RequestAlreadyPending
        | Self::Blocked
        | Self::NotPending(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

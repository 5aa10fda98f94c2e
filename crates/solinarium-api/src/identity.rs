//! Caller identity extractor.
//!
//! Sessions are terminated upstream; the authenticating proxy forwards the
//! caller's user id in a trusted header whose name is part of [`ApiState`].

use axum::{extract::FromRequestParts, http::request::Parts};
use solinarium_core::{
  identity::UserId,
  store::{FriendStore, NotificationStore},
};

use crate::{ApiState, error::ApiError};

/// The authenticated caller. Rejects with 401 when the identity header is
/// absent, not UTF-8, or blank.
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<ApiState<S>> for CurrentUser
where
  S: FriendStore + NotificationStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let raw = parts
      .headers
      .get(&state.identity_header)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthenticated)?;

    let user = UserId::new(raw).map_err(|_| ApiError::Unauthenticated)?;
    Ok(CurrentUser(user))
  }
}

//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler. Every variant renders as
/// `{"message": "..."}` so the UI can show it verbatim.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing or invalid caller identity")]
  Unauthenticated,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl From<solinarium_core::Error> for ApiError {
  fn from(e: solinarium_core::Error) -> Self {
    use solinarium_core::Error as E;
    match e {
      E::NotFound(_) => Self::NotFound("Friend request not found".into()),
      E::AlreadyFriends => Self::BadRequest("Already friends".into()),
      E::RequestAlreadyPending => Self::BadRequest("Friend request already sent".into()),
      E::Blocked => Self::BadRequest("Friend requests between these users are blocked".into()),
      E::NotPending(_) => Self::BadRequest("Friend request is no longer pending".into()),
      E::SelfRequest => {
        Self::BadRequest("You cannot send a friend request to yourself".into())
      }
      E::Unauthorized(_) => {
        Self::Forbidden("Only the recipient can respond to this friend request".into())
      }
      E::InvalidUserId => Self::BadRequest("Invalid user id".into()),
      E::Store(inner) => Self::Store(inner),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthorized".to_owned()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_owned())
      }
    };
    (status, Json(json!({ "message": message }))).into_response()
  }
}

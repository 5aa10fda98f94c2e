//! JSON REST API for the Solinarium friend relationship engine.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`FriendStore`] and [`NotificationStore`]. Authentication is the caller's
//! responsibility: an upstream layer must put the user id in the configured
//! identity header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", solinarium_api::api_router(store.clone(), header))
//! ```

pub mod error;
pub mod extract;
pub mod friends;
pub mod identity;
pub mod notifications;

use std::sync::Arc;

use axum::{
  Router,
  http::HeaderName,
  routing::{get, post, put},
};
use solinarium_core::{
  service::FriendService,
  store::{FriendStore, NotificationStore},
};

pub use error::ApiError;

/// Header used when no other is configured.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub service:         FriendService<S>,
  pub store:           Arc<S>,
  pub identity_header: HeaderName,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      service:         self.service.clone(),
      store:           Arc::clone(&self.store),
      identity_header: self.identity_header.clone(),
    }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, identity_header: HeaderName) -> Router<()>
where
  S: FriendStore + NotificationStore + 'static,
{
  let state = ApiState {
    service: FriendService::with_store(Arc::clone(&store)),
    store,
    identity_header,
  };

  Router::new()
    // Friends
    .route("/friend-status/{id}", get(friends::status::<S>))
    .route("/friends", get(friends::list_friends::<S>))
    .route("/friends/{id}", axum::routing::delete(friends::remove::<S>))
    .route("/friends/{id}/request", post(friends::send_to::<S>))
    .route(
      "/friend-requests",
      get(friends::list_incoming::<S>).post(friends::send::<S>),
    )
    .route(
      "/friend-requests/sent",
      get(friends::list_sent::<S>).delete(friends::cancel_sent::<S>),
    )
    .route("/friend-requests/{id}", axum::routing::delete(friends::cancel::<S>))
    .route("/friend-requests/{id}/accept", put(friends::accept::<S>))
    .route("/friend-requests/{id}/reject", put(friends::reject::<S>))
    // Notifications
    .route("/notifications", get(notifications::list::<S>))
    .route("/notifications/unread-count", get(notifications::unread_count::<S>))
    .route("/notifications/read-all", put(notifications::mark_all_read::<S>))
    .route("/notifications/{id}", axum::routing::delete(notifications::delete_one::<S>))
    .route("/notifications/{id}/read", put(notifications::mark_read::<S>))
    .with_state(state)
}

// ─── Router tests ─────────────────────────────────────────────────────────────

//! Handlers for `/notifications` endpoints. All of them act on the caller's
//! own notifications only.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/notifications` | Newest first |
//! | `GET`    | `/notifications/unread-count` | `{"count":n}` |
//! | `PUT`    | `/notifications/:id/read` | 404 if not the caller's |
//! | `PUT`    | `/notifications/read-all` | |
//! | `DELETE` | `/notifications/:id` | 404 if not the caller's |

use axum::{Json, extract::State};
use serde_json::{Value, json};
use solinarium_core::{
  notification::Notification,
  store::{FriendStore, NotificationStore},
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, extract::PathParam, identity::CurrentUser};

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("notification {id} not found")) }

/// `GET /notifications`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
) -> Result<Json<Vec<Notification>>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  let notifications = state
    .store
    .list_notifications(&caller)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(notifications))
}

/// `GET /notifications/unread-count`
pub async fn unread_count<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
) -> Result<Json<Value>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  let count = state
    .store
    .unread_count(&caller)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "count": count })))
}

/// `PUT /notifications/:id/read`
pub async fn mark_read<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
  PathParam(id): PathParam<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  let found = state
    .store
    .mark_read(&caller, id)
    .await
    .map_err(ApiError::store)?;
  if !found {
    return Err(not_found(id));
  }
  Ok(Json(json!({ "message": "Notification marked as read" })))
}

/// `PUT /notifications/read-all`
pub async fn mark_all_read<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
) -> Result<Json<Value>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  state
    .store
    .mark_all_read(&caller)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "message": "All notifications marked as read" })))
}

/// `DELETE /notifications/:id`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
  PathParam(id): PathParam<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  let found = state
    .store
    .delete_notification(&caller, id)
    .await
    .map_err(ApiError::store)?;
  if !found {
    return Err(not_found(id));
  }
  Ok(Json(json!({ "message": "Notification deleted" })))
}

//! Handlers for friend endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/friend-status/:id` | `{"status":"none"\|"pending"\|"friends"}` plus `direction` while pending |
//! | `POST`   | `/friend-requests` | Body: `{"friendId":"..."}`; 201 + pending record |
//! | `POST`   | `/friends/:id/request` | Same as above, target in the path |
//! | `DELETE` | `/friend-requests/:id` | `:id` is the *recipient*; cancels the caller's own request |
//! | `PUT`    | `/friend-requests/:id/accept` | `:id` is the relationship id |
//! | `PUT`    | `/friend-requests/:id/reject` | `:id` is the relationship id |
//! | `DELETE` | `/friends/:id` | `:id` is the friend; removes the friendship |
//! | `GET`    | `/friends` | Accepted relationships |
//! | `GET`    | `/friend-requests` | Pending requests addressed to the caller |
//! | `GET`    | `/friend-requests/sent` | Pending requests sent by the caller |
//! | `DELETE` | `/friend-requests/sent` | Cancels the caller's request to the user `sent` |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use solinarium_core::{
  identity::UserId,
  relationship::{Friendship, Relationship, StatusView},
  store::{FriendStore, NotificationStore},
};
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  extract::{JsonBody, PathParam},
  identity::CurrentUser,
};

fn message(text: &str) -> Json<Value> { Json(json!({ "message": text })) }

fn parse_user(raw: String) -> Result<UserId, ApiError> {
  UserId::new(raw).map_err(ApiError::from)
}

// ─── Status ───────────────────────────────────────────────────────────────────

/// `GET /friend-status/:id`
pub async fn status<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
  PathParam(target): PathParam<String>,
) -> Result<Json<StatusView>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  let target = parse_user(target)?;
  Ok(Json(state.service.status(&caller, &target).await?))
}

// ─── Send ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBody {
  pub friend_id: UserId,
}

/// `POST /friend-requests`, body: `{"friendId":"..."}`
pub async fn send<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
  JsonBody(body): JsonBody<SendBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  let rel = state.service.send_request(&caller, &body.friend_id).await?;
  Ok((StatusCode::CREATED, Json(rel)))
}

/// `POST /friends/:id/request`
pub async fn send_to<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
  PathParam(friend_id): PathParam<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  let friend_id = parse_user(friend_id)?;
  let rel = state.service.send_request(&caller, &friend_id).await?;
  Ok((StatusCode::CREATED, Json(rel)))
}

// ─── Respond ──────────────────────────────────────────────────────────────────

/// `DELETE /friend-requests/:id`
pub async fn cancel<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
  PathParam(recipient): PathParam<String>,
) -> Result<Json<Value>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  cancel_to(&state, &caller, recipient).await
}

/// `DELETE /friend-requests/sent`. The static `sent` route shadows `:id`, so
/// a request to the user literally named `sent` is cancelled here.
pub async fn cancel_sent<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
) -> Result<Json<Value>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  cancel_to(&state, &caller, "sent".to_owned()).await
}

async fn cancel_to<S>(
  state: &ApiState<S>,
  caller: &UserId,
  recipient: String,
) -> Result<Json<Value>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  let recipient = parse_user(recipient)?;
  state.service.cancel_request(caller, &recipient).await?;
  Ok(message("Friend request cancelled"))
}

/// `PUT /friend-requests/:id/accept`
pub async fn accept<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
  PathParam(id): PathParam<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  state.service.accept_request(&caller, id).await?;
  Ok(message("Friend request accepted"))
}

/// `PUT /friend-requests/:id/reject`
pub async fn reject<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
  PathParam(id): PathParam<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  state.service.reject_request(&caller, id).await?;
  Ok(message("Friend request rejected"))
}

/// `DELETE /friends/:id`
pub async fn remove<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
  PathParam(friend_id): PathParam<String>,
) -> Result<Json<Value>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  let friend_id = parse_user(friend_id)?;
  state.service.remove_friendship(&caller, &friend_id).await?;
  Ok(message("Friend removed"))
}

// ─── Lists ────────────────────────────────────────────────────────────────────

/// `GET /friends`
pub async fn list_friends<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
) -> Result<Json<Vec<Friendship>>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  Ok(Json(state.service.friends(&caller).await?))
}

/// `GET /friend-requests`
pub async fn list_incoming<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
) -> Result<Json<Vec<Relationship>>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  Ok(Json(state.service.incoming_requests(&caller).await?))
}

/// `GET /friend-requests/sent`
pub async fn list_sent<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
) -> Result<Json<Vec<Relationship>>, ApiError>
where
  S: FriendStore + NotificationStore + 'static,
{
  Ok(Json(state.service.sent_requests(&caller).await?))
}

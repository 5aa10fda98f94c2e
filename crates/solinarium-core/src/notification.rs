//! Notification records.
//!
//! The relationship engine only ever *creates* notifications; reading,
//! marking read and deleting them is the recipient's business.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  CommunityJoin,
  EventJoin,
  FriendRequest,
  FriendAccept,
  Message,
  SchoolFavorite,
}

/// The kind of entity a notification links back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelatedKind {
  Community,
  Event,
  User,
  School,
  Message,
}

/// A deep-link target for the recipient's UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedRef {
  pub kind: RelatedKind,
  pub id:   String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub notification_id: Uuid,
  pub recipient:       UserId,
  pub kind:            NotificationKind,
  pub title:           String,
  pub message:         String,
  pub related:         Option<RelatedRef>,
  pub is_read:         bool,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::NotificationStore::create_notification`].
/// The id, read flag and timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewNotification {
  pub recipient: UserId,
  pub kind:      NotificationKind,
  pub title:     String,
  pub message:   String,
  pub related:   Option<RelatedRef>,
}

impl NewNotification {
  /// "X wants to connect", addressed to `recipient`.
  pub fn friend_request(recipient: UserId, requester: &UserId) -> Self {
    Self {
      recipient,
      kind: NotificationKind::FriendRequest,
      title: "New Friend Request".to_owned(),
      message: "Someone sent you a friend request".to_owned(),
      related: Some(RelatedRef {
        kind: RelatedKind::User,
        id:   requester.to_string(),
      }),
    }
  }

  /// Tells the original requester that `accepter` said yes.
  pub fn friend_accept(requester: UserId, accepter: &UserId) -> Self {
    Self {
      recipient: requester,
      kind: NotificationKind::FriendAccept,
      title: "Friend Request Accepted".to_owned(),
      message: "Your friend request was accepted".to_owned(),
      related: Some(RelatedRef {
        kind: RelatedKind::User,
        id:   accepter.to_string(),
      }),
    }
  }
}

//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order matches chronological order.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use solinarium_core::{
  identity::UserId,
  notification::{Notification, NotificationKind, RelatedKind, RelatedRef},
  relationship::{Relationship, RelationshipStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── UserId ───────────────────────────────────────────────────────────────────

pub fn decode_user_id(s: String) -> Result<UserId> { Ok(UserId::new(s)?) }

// ─── RelationshipStatus ───────────────────────────────────────────────────────

pub fn encode_status(s: RelationshipStatus) -> &'static str {
  match s {
    RelationshipStatus::Pending => "pending",
    RelationshipStatus::Accepted => "accepted",
    RelationshipStatus::Blocked => "blocked",
  }
}

pub fn decode_status(s: &str) -> Result<RelationshipStatus> {
  match s {
    "pending" => Ok(RelationshipStatus::Pending),
    "accepted" => Ok(RelationshipStatus::Accepted),
    "blocked" => Ok(RelationshipStatus::Blocked),
    other => Err(Error::UnknownValue { column: "status", value: other.to_owned() }),
  }
}

// ─── NotificationKind ─────────────────────────────────────────────────────────

pub fn encode_notification_kind(k: NotificationKind) -> &'static str {
  match k {
    NotificationKind::CommunityJoin => "community_join",
    NotificationKind::EventJoin => "event_join",
    NotificationKind::FriendRequest => "friend_request",
    NotificationKind::FriendAccept => "friend_accept",
    NotificationKind::Message => "message",
    NotificationKind::SchoolFavorite => "school_favorite",
  }
}

pub fn decode_notification_kind(s: &str) -> Result<NotificationKind> {
  match s {
    "community_join" => Ok(NotificationKind::CommunityJoin),
    "event_join" => Ok(NotificationKind::EventJoin),
    "friend_request" => Ok(NotificationKind::FriendRequest),
    "friend_accept" => Ok(NotificationKind::FriendAccept),
    "message" => Ok(NotificationKind::Message),
    "school_favorite" => Ok(NotificationKind::SchoolFavorite),
    other => Err(Error::UnknownValue { column: "kind", value: other.to_owned() }),
  }
}

// ─── RelatedKind ──────────────────────────────────────────────────────────────

pub fn encode_related_kind(k: RelatedKind) -> &'static str {
  match k {
    RelatedKind::Community => "community",
    RelatedKind::Event => "event",
    RelatedKind::User => "user",
    RelatedKind::School => "school",
    RelatedKind::Message => "message",
  }
}

pub fn decode_related_kind(s: &str) -> Result<RelatedKind> {
  match s {
    "community" => Ok(RelatedKind::Community),
    "event" => Ok(RelatedKind::Event),
    "user" => Ok(RelatedKind::User),
    "school" => Ok(RelatedKind::School),
    "message" => Ok(RelatedKind::Message),
    other => {
      Err(Error::UnknownValue { column: "related_kind", value: other.to_owned() })
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawRelationship::from_row`].
pub const RELATIONSHIP_COLUMNS: &str =
  "relationship_id, initiator_id, recipient_id, status, created_at, updated_at";

/// Raw strings read directly from a `relationships` row.
pub struct RawRelationship {
  pub relationship_id: String,
  pub initiator_id:    String,
  pub recipient_id:    String,
  pub status:          String,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawRelationship {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      relationship_id: row.get(0)?,
      initiator_id:    row.get(1)?,
      recipient_id:    row.get(2)?,
      status:          row.get(3)?,
      created_at:      row.get(4)?,
      updated_at:      row.get(5)?,
    })
  }

  pub fn into_relationship(self) -> Result<Relationship> {
    Ok(Relationship {
      relationship_id: decode_uuid(&self.relationship_id)?,
      initiator:       decode_user_id(self.initiator_id)?,
      recipient:       decode_user_id(self.recipient_id)?,
      status:          decode_status(&self.status)?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawNotification::from_row`].
pub const NOTIFICATION_COLUMNS: &str = "notification_id, recipient_id, kind, title, \
                                        message, related_kind, related_id, is_read, \
                                        created_at";

/// Raw values read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id: String,
  pub recipient_id:    String,
  pub kind:            String,
  pub title:           String,
  pub message:         String,
  pub related_kind:    Option<String>,
  pub related_id:      Option<String>,
  pub is_read:         bool,
  pub created_at:      String,
}

impl RawNotification {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id: row.get(0)?,
      recipient_id:    row.get(1)?,
      kind:            row.get(2)?,
      title:           row.get(3)?,
      message:         row.get(4)?,
      related_kind:    row.get(5)?,
      related_id:      row.get(6)?,
      is_read:         row.get(7)?,
      created_at:      row.get(8)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    let related = match (self.related_kind, self.related_id) {
      (Some(kind), Some(id)) => Some(RelatedRef { kind: decode_related_kind(&kind)?, id }),
      _ => None,
    };

    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      recipient: decode_user_id(self.recipient_id)?,
      kind: decode_notification_kind(&self.kind)?,
      title: self.title,
      message: self.message,
      related,
      is_read: self.is_read,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

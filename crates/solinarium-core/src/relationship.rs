//! Relationship records: the directed edges behind friend requests and
//! friendships.
//!
//! A record is directed (`initiator` sent the request to `recipient`) but at
//! most one record exists per *unordered* pair, so every read that asks "what
//! is between A and B" must look the pair up symmetrically. [`PairKey`] is the
//! canonical form of that unordered pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::UserId;

// ─── Status ──────────────────────────────────────────────────────────────────

/// The lifecycle status of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipStatus {
  /// The initiator is waiting for the recipient to respond.
  Pending,
  /// Both parties recognise the friendship.
  Accepted,
  /// Reserved for a future moderation feature. Nothing produces it.
  Blocked,
}

// ─── Pair key ────────────────────────────────────────────────────────────────

/// The unordered pair `{a, b}`, stored as a sorted tuple so that `(a, b)` and
/// `(b, a)` produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
  low:  UserId,
  high: UserId,
}

impl PairKey {
  pub fn new(a: &UserId, b: &UserId) -> Self {
    if a <= b {
      Self { low: a.clone(), high: b.clone() }
    } else {
      Self { low: b.clone(), high: a.clone() }
    }
  }

  pub fn low(&self) -> &UserId { &self.low }

  pub fn high(&self) -> &UserId { &self.high }
}

// ─── Relationship ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
  pub relationship_id: Uuid,
  pub initiator:       UserId,
  pub recipient:       UserId,
  pub status:          RelationshipStatus,
  pub created_at:      DateTime<Utc>,
  /// Refreshed only when the request is accepted.
  pub updated_at:      DateTime<Utc>,
}

impl Relationship {
  /// A fresh pending request from `initiator` to `recipient`.
  pub fn request(initiator: UserId, recipient: UserId, at: DateTime<Utc>) -> Self {
    Self {
      relationship_id: Uuid::new_v4(),
      initiator,
      recipient,
      status: RelationshipStatus::Pending,
      created_at: at,
      updated_at: at,
    }
  }

  pub fn pair(&self) -> PairKey { PairKey::new(&self.initiator, &self.recipient) }

  pub fn is_pending(&self) -> bool { self.status == RelationshipStatus::Pending }

  pub fn is_accepted(&self) -> bool { self.status == RelationshipStatus::Accepted }

  /// The party on the other side of the edge from `user`, or `None` if `user`
  /// is not a party at all.
  pub fn other_party(&self, user: &UserId) -> Option<&UserId> {
    if &self.initiator == user {
      Some(&self.recipient)
    } else if &self.recipient == user {
      Some(&self.initiator)
    } else {
      None
    }
  }
}

/// An accepted relationship seen from one of its parties.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
  pub friend:       UserId,
  pub relationship: Relationship,
}

impl Friendship {
  /// Resolve `rel` from `user`'s point of view. `None` if `user` is not a
  /// party to it.
  pub fn for_user(user: &UserId, rel: Relationship) -> Option<Self> {
    let friend = rel.other_party(user)?.clone();
    Some(Self { friend, relationship: rel })
  }
}

// ─── Status view ─────────────────────────────────────────────────────────────

/// The tri-state relationship status shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
  None,
  Pending,
  Friends,
}

/// Which side initiated a pending request, from the viewer's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  /// The viewer sent the request and may cancel it.
  Outgoing,
  /// The viewer received the request and may accept or reject it.
  Incoming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
  pub status:          FriendStatus,
  /// Present only while the status is `pending`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub direction:       Option<Direction>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub relationship_id: Option<Uuid>,
}

impl StatusView {
  pub fn none() -> Self {
    Self { status: FriendStatus::None, direction: None, relationship_id: None }
  }

  /// Derive the view `viewer` should see for the record (if any) between
  /// them and someone else.
  pub fn resolve(viewer: &UserId, rel: Option<&Relationship>) -> Self {
    let Some(rel) = rel else { return Self::none() };
    match rel.status {
      RelationshipStatus::Accepted => Self {
        status:          FriendStatus::Friends,
        direction:       None,
        relationship_id: Some(rel.relationship_id),
      },
      RelationshipStatus::Pending => Self {
        status:          FriendStatus::Pending,
        direction:       Some(if &rel.initiator == viewer {
          Direction::Outgoing
        } else {
          Direction::Incoming
        }),
        relationship_id: Some(rel.relationship_id),
      },
      RelationshipStatus::Blocked => Self::none(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn user(id: &str) -> UserId { UserId::new(id).unwrap() }

  #[test]
  fn pair_key_ignores_order() {
    let (a, b) = (user("alice"), user("bob"));
    assert_eq!(PairKey::new(&a, &b), PairKey::new(&b, &a));
    assert_eq!(PairKey::new(&b, &a).low(), &a);
  }

  #[test]
  fn pending_view_reports_direction_per_viewer() {
    let (a, b) = (user("alice"), user("bob"));
    let rel = Relationship::request(a.clone(), b.clone(), Utc::now());

    let from_a = StatusView::resolve(&a, Some(&rel));
    let from_b = StatusView::resolve(&b, Some(&rel));

    assert_eq!(from_a.status, FriendStatus::Pending);
    assert_eq!(from_b.status, FriendStatus::Pending);
    assert_eq!(from_a.direction, Some(Direction::Outgoing));
    assert_eq!(from_b.direction, Some(Direction::Incoming));
  }

  #[test]
  fn blocked_record_reads_as_none() {
    let (a, b) = (user("alice"), user("bob"));
    let mut rel = Relationship::request(a.clone(), b.clone(), Utc::now());
    rel.status = RelationshipStatus::Blocked;

    assert_eq!(StatusView::resolve(&a, Some(&rel)), StatusView::none());
    assert_eq!(StatusView::resolve(&b, Some(&rel)), StatusView::none());
  }

  #[test]
  fn none_view_serialises_without_optional_fields() {
    let json = serde_json::to_value(StatusView::none()).unwrap();
    assert_eq!(json, serde_json::json!({ "status": "none" }));
  }

  #[test]
  fn other_party_rejects_outsiders() {
    let rel = Relationship::request(user("alice"), user("bob"), Utc::now());
    assert_eq!(rel.other_party(&user("bob")), Some(&user("alice")));
    assert_eq!(rel.other_party(&user("carol")), None);
  }
}

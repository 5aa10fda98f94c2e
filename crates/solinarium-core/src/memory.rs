//! [`MemoryStore`]: an in-process implementation of both store traits.
//!
//! Relationships live in an arena keyed by id, with a secondary index on the
//! unordered [`PairKey`]. Both maps sit behind one lock, so the
//! check-and-insert in [`FriendStore::insert_request`] is a single critical
//! section.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  identity::UserId,
  notification::{NewNotification, Notification},
  relationship::{Friendship, PairKey, Relationship, RelationshipStatus},
  store::{FriendStore, InsertOutcome, NotificationStore},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("memory store lock poisoned")]
  Poisoned,
}

#[derive(Default)]
struct Tables {
  relationships: HashMap<Uuid, Relationship>,
  by_pair:       HashMap<PairKey, Uuid>,
  notifications: Vec<Notification>,
}

impl Tables {
  fn between(&self, a: &UserId, b: &UserId) -> Option<&Relationship> {
    self
      .by_pair
      .get(&PairKey::new(a, b))
      .and_then(|id| self.relationships.get(id))
  }

  fn remove(&mut self, id: Uuid) -> Option<Relationship> {
    let rel = self.relationships.remove(&id)?;
    self.by_pair.remove(&rel.pair());
    Some(rel)
  }

  fn pending_where(&self, pred: impl Fn(&Relationship) -> bool) -> Vec<Relationship> {
    let mut out: Vec<Relationship> = self
      .relationships
      .values()
      .filter(|r| r.is_pending() && pred(r))
      .cloned()
      .collect();
    out.sort_by_key(|r| r.created_at);
    out
  }
}

/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
  tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> Result<MutexGuard<'_, Tables>, MemoryError> {
    self.tables.lock().map_err(|_| MemoryError::Poisoned)
  }
}

// ─── FriendStore impl ────────────────────────────────────────────────────────

impl FriendStore for MemoryStore {
  type Error = MemoryError;

  async fn insert_request(
    &self,
    initiator: &UserId,
    recipient: &UserId,
  ) -> Result<InsertOutcome, MemoryError> {
    let mut t = self.lock()?;
    if let Some(existing) = t.between(initiator, recipient) {
      return Ok(InsertOutcome::Existing(existing.clone()));
    }

    let rel = Relationship::request(initiator.clone(), recipient.clone(), Utc::now());
    t.by_pair.insert(rel.pair(), rel.relationship_id);
    t.relationships.insert(rel.relationship_id, rel.clone());
    Ok(InsertOutcome::Created(rel))
  }

  async fn get_relationship(&self, id: Uuid) -> Result<Option<Relationship>, MemoryError> {
    Ok(self.lock()?.relationships.get(&id).cloned())
  }

  async fn relationship_between(
    &self,
    a: &UserId,
    b: &UserId,
  ) -> Result<Option<Relationship>, MemoryError> {
    Ok(self.lock()?.between(a, b).cloned())
  }

  async fn accept(
    &self,
    id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<Option<Relationship>, MemoryError> {
    let mut t = self.lock()?;
    match t.relationships.get_mut(&id) {
      Some(rel) if rel.is_pending() => {
        rel.status = RelationshipStatus::Accepted;
        rel.updated_at = at;
        Ok(Some(rel.clone()))
      }
      _ => Ok(None),
    }
  }

  async fn delete_request(&self, id: Uuid) -> Result<bool, MemoryError> {
    let mut t = self.lock()?;
    let pending = t.relationships.get(&id).is_some_and(Relationship::is_pending);
    Ok(pending && t.remove(id).is_some())
  }

  async fn delete_pending(
    &self,
    initiator: &UserId,
    recipient: &UserId,
  ) -> Result<bool, MemoryError> {
    let mut t = self.lock()?;
    let id = match t.between(initiator, recipient) {
      Some(r) if r.is_pending() && &r.initiator == initiator => r.relationship_id,
      _ => return Ok(false),
    };
    Ok(t.remove(id).is_some())
  }

  async fn delete_accepted(&self, a: &UserId, b: &UserId) -> Result<bool, MemoryError> {
    let mut t = self.lock()?;
    let id = match t.between(a, b) {
      Some(r) if r.is_accepted() => r.relationship_id,
      _ => return Ok(false),
    };
    Ok(t.remove(id).is_some())
  }

  async fn list_friends(&self, user: &UserId) -> Result<Vec<Friendship>, MemoryError> {
    let t = self.lock()?;
    let mut out: Vec<Friendship> = t
      .relationships
      .values()
      .filter(|r| r.is_accepted())
      .filter_map(|r| Friendship::for_user(user, r.clone()))
      .collect();
    out.sort_by_key(|f| f.relationship.updated_at);
    Ok(out)
  }

  async fn list_incoming(&self, user: &UserId) -> Result<Vec<Relationship>, MemoryError> {
    Ok(self.lock()?.pending_where(|r| &r.recipient == user))
  }

  async fn list_sent(&self, user: &UserId) -> Result<Vec<Relationship>, MemoryError> {
    Ok(self.lock()?.pending_where(|r| &r.initiator == user))
  }
}

// ─── NotificationStore impl ──────────────────────────────────────────────────

impl NotificationStore for MemoryStore {
  type Error = MemoryError;

  async fn create_notification(
    &self,
    input: NewNotification,
  ) -> Result<Notification, MemoryError> {
    let notification = Notification {
      notification_id: Uuid::new_v4(),
      recipient:       input.recipient,
      kind:            input.kind,
      title:           input.title,
      message:         input.message,
      related:         input.related,
      is_read:         false,
      created_at:      Utc::now(),
    };
    self.lock()?.notifications.push(notification.clone());
    Ok(notification)
  }

  async fn list_notifications(&self, user: &UserId) -> Result<Vec<Notification>, MemoryError> {
    // Insertion order is creation order; newest first.
    Ok(
      self
        .lock()?
        .notifications
        .iter()
        .rev()
        .filter(|n| &n.recipient == user)
        .cloned()
        .collect(),
    )
  }

  async fn mark_read(&self, user: &UserId, id: Uuid) -> Result<bool, MemoryError> {
    let mut t = self.lock()?;
    match t
      .notifications
      .iter_mut()
      .find(|n| n.notification_id == id && &n.recipient == user)
    {
      Some(n) => {
        n.is_read = true;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn mark_all_read(&self, user: &UserId) -> Result<u64, MemoryError> {
    let mut t = self.lock()?;
    let mut changed = 0;
    for n in t.notifications.iter_mut().filter(|n| &n.recipient == user && !n.is_read) {
      n.is_read = true;
      changed += 1;
    }
    Ok(changed)
  }

  async fn delete_notification(&self, user: &UserId, id: Uuid) -> Result<bool, MemoryError> {
    let mut t = self.lock()?;
    let before = t.notifications.len();
    t.notifications
      .retain(|n| !(n.notification_id == id && &n.recipient == user));
    Ok(t.notifications.len() != before)
  }

  async fn unread_count(&self, user: &UserId) -> Result<u64, MemoryError> {
    Ok(
      self
        .lock()?
        .notifications
        .iter()
        .filter(|n| &n.recipient == user && !n.is_read)
        .count() as u64,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn user(id: &str) -> UserId { UserId::new(id).unwrap() }

  #[tokio::test]
  async fn reverse_insert_finds_existing_record() {
    let store = MemoryStore::new();
    let (a, b) = (user("alice"), user("bob"));

    let first = store.insert_request(&a, &b).await.unwrap();
    let InsertOutcome::Created(created) = first else { panic!("expected insert") };

    let second = store.insert_request(&b, &a).await.unwrap();
    assert!(
      matches!(second, InsertOutcome::Existing(ref r) if r.relationship_id == created.relationship_id)
    );
  }

  #[tokio::test]
  async fn delete_pending_is_directional() {
    let store = MemoryStore::new();
    let (a, b) = (user("alice"), user("bob"));
    store.insert_request(&a, &b).await.unwrap();

    assert!(!store.delete_pending(&b, &a).await.unwrap());
    assert!(store.delete_pending(&a, &b).await.unwrap());
    assert!(store.relationship_between(&a, &b).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn delete_request_leaves_accepted_records() {
    let store = MemoryStore::new();
    let (a, b) = (user("alice"), user("bob"));
    let InsertOutcome::Created(rel) = store.insert_request(&a, &b).await.unwrap() else {
      panic!("expected insert")
    };
    store.accept(rel.relationship_id, Utc::now()).await.unwrap();

    assert!(!store.delete_request(rel.relationship_id).await.unwrap());
    assert!(store.get_relationship(rel.relationship_id).await.unwrap().is_some());
  }

  #[tokio::test]
  async fn notifications_are_scoped_to_recipient() {
    let store = MemoryStore::new();
    let (a, b) = (user("alice"), user("bob"));
    let n = store
      .create_notification(NewNotification::friend_request(b.clone(), &a))
      .await
      .unwrap();

    assert!(!store.mark_read(&a, n.notification_id).await.unwrap());
    assert!(!store.delete_notification(&a, n.notification_id).await.unwrap());
    assert_eq!(store.unread_count(&b).await.unwrap(), 1);

    assert!(store.mark_read(&b, n.notification_id).await.unwrap());
    assert_eq!(store.unread_count(&b).await.unwrap(), 0);
  }
}

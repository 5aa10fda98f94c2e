//! [`FriendService`]: the friend relationship state machine.
//!
//! Per unordered pair of users the only reachable states are *none*,
//! *pending* and *accepted*:
//!
//! | From | Operation | To |
//! |------|-----------|----|
//! | none | [`send_request`](FriendService::send_request) | pending |
//! | pending | [`accept_request`](FriendService::accept_request) | accepted |
//! | pending | [`reject_request`](FriendService::reject_request) / [`cancel_request`](FriendService::cancel_request) | none |
//! | accepted | [`remove_friendship`](FriendService::remove_friendship) | none |
//!
//! Every operation takes the authenticated caller explicitly. Notifications
//! are written after the relationship mutation has been stored, and a failure
//! to write one is logged and otherwise ignored.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  identity::UserId,
  notification::NewNotification,
  relationship::{Friendship, Relationship, RelationshipStatus, StatusView},
  store::{FriendStore, InsertOutcome, NotificationStore},
};

pub struct FriendService<F, N = F> {
  friends:       Arc<F>,
  notifications: Arc<N>,
}

impl<F, N> Clone for FriendService<F, N> {
  fn clone(&self) -> Self {
    Self {
      friends:       Arc::clone(&self.friends),
      notifications: Arc::clone(&self.notifications),
    }
  }
}

impl<S> FriendService<S, S>
where
  S: FriendStore + NotificationStore,
{
  /// Use one backend for both relationships and notifications.
  pub fn with_store(store: Arc<S>) -> Self {
    Self { friends: Arc::clone(&store), notifications: store }
  }
}

impl<F, N> FriendService<F, N>
where
  F: FriendStore,
  N: NotificationStore,
{
  pub fn new(friends: Arc<F>, notifications: Arc<N>) -> Self {
    Self { friends, notifications }
  }

  // ── Transitions ─────────────────────────────────────────────────────────

  /// `none → pending`. Fails with a conflict if anything already exists
  /// between the two users, whichever of them sent it.
  pub async fn send_request(
    &self,
    caller: &UserId,
    recipient: &UserId,
  ) -> Result<Relationship> {
    if caller == recipient {
      return Err(Error::SelfRequest);
    }

    let rel = match self
      .friends
      .insert_request(caller, recipient)
      .await
      .map_err(Error::store)?
    {
      InsertOutcome::Created(rel) => rel,
      InsertOutcome::Existing(existing) => {
        return Err(match existing.status {
          RelationshipStatus::Accepted => Error::AlreadyFriends,
          RelationshipStatus::Pending => Error::RequestAlreadyPending,
          RelationshipStatus::Blocked => Error::Blocked,
        });
      }
    };

    tracing::info!(
      relationship_id = %rel.relationship_id,
      initiator = %caller,
      recipient = %recipient,
      "friend request sent"
    );

    self
      .notify(NewNotification::friend_request(recipient.clone(), caller))
      .await;
    Ok(rel)
  }

  /// `pending → accepted`. Only the recipient of the request may accept it.
  pub async fn accept_request(&self, caller: &UserId, id: Uuid) -> Result<Relationship> {
    let rel = self
      .friends
      .get_relationship(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(id))?;

    authorize_recipient(caller, &rel)?;

    // `accept` re-checks the status, so a concurrent reject or cancel that
    // wins the race surfaces here as not found.
    let accepted = self
      .friends
      .accept(id, Utc::now())
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(id))?;

    tracing::info!(
      relationship_id = %id,
      initiator = %accepted.initiator,
      recipient = %accepted.recipient,
      "friend request accepted"
    );

    self
      .notify(NewNotification::friend_accept(accepted.initiator.clone(), caller))
      .await;
    Ok(accepted)
  }

  /// `pending → none`, by the recipient. Rejecting an id that no longer
  /// exists is a no-op.
  pub async fn reject_request(&self, caller: &UserId, id: Uuid) -> Result<()> {
    let Some(rel) = self
      .friends
      .get_relationship(id)
      .await
      .map_err(Error::store)?
    else {
      tracing::debug!(relationship_id = %id, "reject of missing request ignored");
      return Ok(());
    };

    authorize_recipient(caller, &rel)?;

    if self.friends.delete_request(id).await.map_err(Error::store)? {
      tracing::info!(relationship_id = %id, "friend request rejected");
    }
    Ok(())
  }

  /// `pending → none`, by the original sender. No-op if the caller has no
  /// pending request to `recipient`.
  pub async fn cancel_request(&self, caller: &UserId, recipient: &UserId) -> Result<()> {
    if self
      .friends
      .delete_pending(caller, recipient)
      .await
      .map_err(Error::store)?
    {
      tracing::info!(initiator = %caller, recipient = %recipient, "friend request cancelled");
    }
    Ok(())
  }

  /// `accepted → none`, by either party. No-op if they are not friends.
  pub async fn remove_friendship(&self, caller: &UserId, other: &UserId) -> Result<()> {
    if self
      .friends
      .delete_accepted(caller, other)
      .await
      .map_err(Error::store)?
    {
      tracing::info!(user = %caller, friend = %other, "friendship removed");
    }
    Ok(())
  }

  // ── Reads ───────────────────────────────────────────────────────────────

  /// The relationship between `caller` and `target` as `caller` sees it.
  pub async fn status(&self, caller: &UserId, target: &UserId) -> Result<StatusView> {
    if caller == target {
      return Ok(StatusView::none());
    }
    let rel = self
      .friends
      .relationship_between(caller, target)
      .await
      .map_err(Error::store)?;
    Ok(StatusView::resolve(caller, rel.as_ref()))
  }

  pub async fn friends(&self, caller: &UserId) -> Result<Vec<Friendship>> {
    self.friends.list_friends(caller).await.map_err(Error::store)
  }

  pub async fn incoming_requests(&self, caller: &UserId) -> Result<Vec<Relationship>> {
    self.friends.list_incoming(caller).await.map_err(Error::store)
  }

  pub async fn sent_requests(&self, caller: &UserId) -> Result<Vec<Relationship>> {
    self.friends.list_sent(caller).await.map_err(Error::store)
  }

  // ── Side channel ────────────────────────────────────────────────────────

  async fn notify(&self, input: NewNotification) {
    let recipient = input.recipient.clone();
    let kind = input.kind;
    if let Err(e) = self.notifications.create_notification(input).await {
      tracing::warn!(%recipient, ?kind, error = %e, "failed to create notification");
    }
  }
}

/// Accepting and rejecting belong to the recipient alone; the initiator
/// withdraws through [`FriendService::cancel_request`] instead. A record that
/// is no longer pending cannot be answered at all.
fn authorize_recipient(caller: &UserId, rel: &Relationship) -> Result<()> {
  if &rel.recipient != caller {
    return Err(Error::Unauthorized(rel.relationship_id));
  }
  if !rel.is_pending() {
    return Err(Error::NotPending(rel.relationship_id));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    memory::MemoryStore,
    notification::{Notification, NotificationKind, RelatedKind},
    relationship::{Direction, FriendStatus},
  };

  fn user(id: &str) -> UserId { UserId::new(id).unwrap() }

  fn service() -> (FriendService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (FriendService::with_store(Arc::clone(&store)), store)
  }

  // ─── Send ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn send_makes_status_pending_both_ways() {
    let (svc, _) = service();
    let (a, b) = (user("alice"), user("bob"));

    svc.send_request(&a, &b).await.unwrap();

    let from_a = svc.status(&a, &b).await.unwrap();
    let from_b = svc.status(&b, &a).await.unwrap();
    assert_eq!(from_a.status, FriendStatus::Pending);
    assert_eq!(from_b.status, FriendStatus::Pending);
    assert_eq!(from_a.direction, Some(Direction::Outgoing));
    assert_eq!(from_b.direction, Some(Direction::Incoming));
  }

  #[tokio::test]
  async fn duplicate_send_conflicts() {
    let (svc, _) = service();
    let (a, b) = (user("alice"), user("bob"));

    svc.send_request(&a, &b).await.unwrap();
    let err = svc.send_request(&a, &b).await.unwrap_err();
    assert!(matches!(err, Error::RequestAlreadyPending));
    assert!(err.is_conflict());

    // The reverse direction hits the same record.
    let err = svc.send_request(&b, &a).await.unwrap_err();
    assert!(matches!(err, Error::RequestAlreadyPending));
  }

  #[tokio::test]
  async fn send_to_friend_reports_already_friends() {
    let (svc, _) = service();
    let (a, b) = (user("alice"), user("bob"));

    let rel = svc.send_request(&a, &b).await.unwrap();
    svc.accept_request(&b, rel.relationship_id).await.unwrap();

    assert!(matches!(svc.send_request(&b, &a).await, Err(Error::AlreadyFriends)));
  }

  #[tokio::test]
  async fn send_to_self_is_rejected() {
    let (svc, _) = service();
    let a = user("alice");
    assert!(matches!(svc.send_request(&a, &a).await, Err(Error::SelfRequest)));
  }

  #[tokio::test]
  async fn send_notifies_recipient_once() {
    let (svc, store) = service();
    let (a, b) = (user("alice"), user("bob"));

    svc.send_request(&a, &b).await.unwrap();
    let _ = svc.send_request(&a, &b).await;

    let notes = store.list_notifications(&b).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::FriendRequest);
    let related = notes[0].related.as_ref().unwrap();
    assert_eq!(related.kind, RelatedKind::User);
    assert_eq!(related.id, "alice");
    assert!(store.list_notifications(&a).await.unwrap().is_empty());
  }

  // ─── Accept ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn accept_makes_both_sides_friends() {
    let (svc, _) = service();
    let (a, b) = (user("alice"), user("bob"));

    let rel = svc.send_request(&a, &b).await.unwrap();
    let accepted = svc.accept_request(&b, rel.relationship_id).await.unwrap();
    assert_eq!(accepted.status, RelationshipStatus::Accepted);
    assert!(accepted.updated_at >= rel.updated_at);

    assert_eq!(svc.status(&a, &b).await.unwrap().status, FriendStatus::Friends);
    assert_eq!(svc.status(&b, &a).await.unwrap().status, FriendStatus::Friends);
  }

  #[tokio::test]
  async fn only_recipient_may_accept() {
    let (svc, _) = service();
    let (a, b, c) = (user("alice"), user("bob"), user("carol"));

    let rel = svc.send_request(&a, &b).await.unwrap();
    assert!(matches!(
      svc.accept_request(&a, rel.relationship_id).await,
      Err(Error::Unauthorized(_))
    ));
    assert!(matches!(
      svc.accept_request(&c, rel.relationship_id).await,
      Err(Error::Unauthorized(_))
    ));
    assert_eq!(svc.status(&a, &b).await.unwrap().status, FriendStatus::Pending);
  }

  #[tokio::test]
  async fn accept_unknown_id_is_not_found() {
    let (svc, _) = service();
    let id = Uuid::new_v4();
    assert!(matches!(
      svc.accept_request(&user("bob"), id).await,
      Err(Error::NotFound(missing)) if missing == id
    ));
  }

  #[tokio::test]
  async fn accept_twice_is_not_pending() {
    let (svc, _) = service();
    let (a, b) = (user("alice"), user("bob"));

    let rel = svc.send_request(&a, &b).await.unwrap();
    svc.accept_request(&b, rel.relationship_id).await.unwrap();
    assert!(matches!(
      svc.accept_request(&b, rel.relationship_id).await,
      Err(Error::NotPending(_))
    ));
  }

  #[tokio::test]
  async fn accept_notifies_initiator() {
    let (svc, store) = service();
    let (a, b) = (user("alice"), user("bob"));

    let rel = svc.send_request(&a, &b).await.unwrap();
    svc.accept_request(&b, rel.relationship_id).await.unwrap();

    let notes = store.list_notifications(&a).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::FriendAccept);
  }

  // ─── Reject / cancel ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn reject_clears_state_and_allows_resend() {
    let (svc, _) = service();
    let (a, b) = (user("alice"), user("bob"));

    let rel = svc.send_request(&a, &b).await.unwrap();
    svc.reject_request(&b, rel.relationship_id).await.unwrap();
    assert_eq!(svc.status(&a, &b).await.unwrap().status, FriendStatus::None);

    // Second reject is a no-op.
    svc.reject_request(&b, rel.relationship_id).await.unwrap();

    svc.send_request(&a, &b).await.unwrap();
    assert_eq!(svc.status(&a, &b).await.unwrap().status, FriendStatus::Pending);
  }

  #[tokio::test]
  async fn initiator_cannot_reject_own_request() {
    let (svc, _) = service();
    let (a, b) = (user("alice"), user("bob"));

    let rel = svc.send_request(&a, &b).await.unwrap();
    assert!(matches!(
      svc.reject_request(&a, rel.relationship_id).await,
      Err(Error::Unauthorized(_))
    ));
  }

  #[tokio::test]
  async fn reject_does_not_undo_friendship() {
    let (svc, _) = service();
    let (a, b) = (user("alice"), user("bob"));

    let rel = svc.send_request(&a, &b).await.unwrap();
    svc.accept_request(&b, rel.relationship_id).await.unwrap();
    assert!(matches!(
      svc.reject_request(&b, rel.relationship_id).await,
      Err(Error::NotPending(_))
    ));
    assert_eq!(svc.status(&a, &b).await.unwrap().status, FriendStatus::Friends);
  }

  #[tokio::test]
  async fn cancel_withdraws_only_own_request() {
    let (svc, _) = service();
    let (a, b) = (user("alice"), user("bob"));

    svc.send_request(&a, &b).await.unwrap();

    // Bob has nothing sent to Alice, so this changes nothing.
    svc.cancel_request(&b, &a).await.unwrap();
    assert_eq!(svc.status(&a, &b).await.unwrap().status, FriendStatus::Pending);

    svc.cancel_request(&a, &b).await.unwrap();
    assert_eq!(svc.status(&a, &b).await.unwrap().status, FriendStatus::None);
    assert!(svc.sent_requests(&a).await.unwrap().is_empty());

    svc.cancel_request(&a, &b).await.unwrap();
  }

  // ─── Remove ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn remove_is_symmetric_and_idempotent() {
    let (svc, _) = service();
    let (a, b) = (user("alice"), user("bob"));

    let rel = svc.send_request(&a, &b).await.unwrap();
    svc.accept_request(&b, rel.relationship_id).await.unwrap();

    // Removal by the recipient side works the same as by the initiator.
    svc.remove_friendship(&b, &a).await.unwrap();
    assert_eq!(svc.status(&a, &b).await.unwrap().status, FriendStatus::None);
    assert_eq!(svc.status(&b, &a).await.unwrap().status, FriendStatus::None);
    assert!(svc.friends(&a).await.unwrap().is_empty());

    svc.remove_friendship(&b, &a).await.unwrap();
  }

  #[tokio::test]
  async fn remove_leaves_pending_requests_alone() {
    let (svc, _) = service();
    let (a, b) = (user("alice"), user("bob"));

    svc.send_request(&a, &b).await.unwrap();
    svc.remove_friendship(&a, &b).await.unwrap();
    assert_eq!(svc.status(&a, &b).await.unwrap().status, FriendStatus::Pending);
  }

  // ─── Concurrency ───────────────────────────────────────────────────────────

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn crossed_requests_leave_one_record() {
    let (svc, store) = service();
    let (a, b) = (user("alice"), user("bob"));

    let (s1, a1, b1) = (svc.clone(), a.clone(), b.clone());
    let (s2, a2, b2) = (svc.clone(), a.clone(), b.clone());
    let t1 = tokio::spawn(async move { s1.send_request(&a1, &b1).await });
    let t2 = tokio::spawn(async move { s2.send_request(&b2, &a2).await });
    let (r1, r2) = (t1.await.unwrap(), t2.await.unwrap());

    assert!(r1.is_ok() ^ r2.is_ok(), "exactly one send must win");
    let sent = store.list_sent(&a).await.unwrap().len()
      + store.list_sent(&b).await.unwrap().len();
    assert_eq!(sent, 1);
  }

  // ─── Best-effort notifications ─────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("notification backend down")]
  struct Down;

  struct FailingNotifications;

  impl NotificationStore for FailingNotifications {
    type Error = Down;

    async fn create_notification(&self, _: NewNotification) -> Result<Notification, Down> {
      Err(Down)
    }
    async fn list_notifications(&self, _: &UserId) -> Result<Vec<Notification>, Down> {
      Err(Down)
    }
    async fn mark_read(&self, _: &UserId, _: Uuid) -> Result<bool, Down> { Err(Down) }
    async fn mark_all_read(&self, _: &UserId) -> Result<u64, Down> { Err(Down) }
    async fn delete_notification(&self, _: &UserId, _: Uuid) -> Result<bool, Down> {
      Err(Down)
    }
    async fn unread_count(&self, _: &UserId) -> Result<u64, Down> { Err(Down) }
  }

  #[tokio::test]
  async fn notification_failure_does_not_roll_back() {
    let svc = FriendService::new(
      Arc::new(MemoryStore::new()),
      Arc::new(FailingNotifications),
    );
    let (a, b) = (user("alice"), user("bob"));

    let rel = svc.send_request(&a, &b).await.unwrap();
    assert_eq!(svc.incoming_requests(&b).await.unwrap().len(), 1);

    svc.accept_request(&b, rel.relationship_id).await.unwrap();
    assert_eq!(svc.friends(&a).await.unwrap().len(), 1);
  }

  // ─── Scenario ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn alice_and_bob() {
    let (svc, _) = service();
    let (alice, bob) = (user("alice"), user("bob"));

    svc.send_request(&alice, &bob).await.unwrap();

    let incoming = svc.incoming_requests(&bob).await.unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].initiator, alice);

    svc.accept_request(&bob, incoming[0].relationship_id).await.unwrap();

    let alice_friends = svc.friends(&alice).await.unwrap();
    let bob_friends = svc.friends(&bob).await.unwrap();
    assert_eq!(alice_friends.len(), 1);
    assert_eq!(alice_friends[0].friend, bob);
    assert_eq!(bob_friends.len(), 1);
    assert_eq!(bob_friends[0].friend, alice);

    svc.remove_friendship(&bob, &alice).await.unwrap();
    assert!(svc.friends(&alice).await.unwrap().is_empty());
    assert!(svc.friends(&bob).await.unwrap().is_empty());

    svc.send_request(&alice, &bob).await.unwrap();
  }
}

//! The `FriendStore` and `NotificationStore` traits.
//!
//! The traits are implemented by storage backends ([`crate::memory`],
//! `solinarium-store-sqlite`). Higher layers depend on these abstractions, not
//! on any concrete backend. Stores do not check who is calling; that is
//! [`crate::service::FriendService`]'s job.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  identity::UserId,
  notification::{NewNotification, Notification},
  relationship::{Friendship, Relationship},
};

/// Result of [`FriendStore::insert_request`].
#[derive(Debug, Clone)]
pub enum InsertOutcome {
  /// A new pending record was written.
  Created(Relationship),
  /// The pair already had a record (in either direction); nothing was
  /// written.
  Existing(Relationship),
}

// ─── Relationships ───────────────────────────────────────────────────────────

/// Abstraction over the relationship table.
///
/// Implementations must guarantee that at most one record exists per
/// unordered pair, even when `insert_request(a, b)` and
/// `insert_request(b, a)` race.
pub trait FriendStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Atomically check the pair and insert a pending request from `initiator`
  /// to `recipient` if nothing exists between them.
  fn insert_request<'a>(
    &'a self,
    initiator: &'a UserId,
    recipient: &'a UserId,
  ) -> impl Future<Output = Result<InsertOutcome, Self::Error>> + Send + 'a;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get_relationship(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Relationship>, Self::Error>> + Send + '_;

  /// The record between `a` and `b`, whichever direction it was stored in.
  fn relationship_between<'a>(
    &'a self,
    a: &'a UserId,
    b: &'a UserId,
  ) -> impl Future<Output = Result<Option<Relationship>, Self::Error>> + Send + 'a;

  /// Transition a pending record to accepted, stamping `updated_at`.
  /// Returns `None` if no *pending* record has that id.
  fn accept(
    &self,
    id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Relationship>, Self::Error>> + Send + '_;

  /// Delete the record with this id if it is still pending.
  fn delete_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete the pending request sent by `initiator` to `recipient`.
  fn delete_pending<'a>(
    &'a self,
    initiator: &'a UserId,
    recipient: &'a UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Delete the accepted record between `a` and `b`, in either direction.
  fn delete_accepted<'a>(
    &'a self,
    a: &'a UserId,
    b: &'a UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Every accepted record `user` is a party to.
  fn list_friends<'a>(
    &'a self,
    user: &'a UserId,
  ) -> impl Future<Output = Result<Vec<Friendship>, Self::Error>> + Send + 'a;

  /// Pending requests addressed to `user`.
  fn list_incoming<'a>(
    &'a self,
    user: &'a UserId,
  ) -> impl Future<Output = Result<Vec<Relationship>, Self::Error>> + Send + 'a;

  /// Pending requests sent by `user`.
  fn list_sent<'a>(
    &'a self,
    user: &'a UserId,
  ) -> impl Future<Output = Result<Vec<Relationship>, Self::Error>> + Send + 'a;
}

// ─── Notifications ───────────────────────────────────────────────────────────

/// Abstraction over the notification table. Every read and mutation is scoped
/// to the owning recipient.
pub trait NotificationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn create_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// All of `user`'s notifications, newest first.
  fn list_notifications<'a>(
    &'a self,
    user: &'a UserId,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + 'a;

  /// Returns `false` if `user` owns no notification with that id.
  fn mark_read<'a>(
    &'a self,
    user: &'a UserId,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Returns the number of notifications that changed.
  fn mark_all_read<'a>(
    &'a self,
    user: &'a UserId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Returns `false` if `user` owns no notification with that id.
  fn delete_notification<'a>(
    &'a self,
    user: &'a UserId,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn unread_count<'a>(
    &'a self,
    user: &'a UserId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}

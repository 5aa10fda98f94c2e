//! [`SqliteStore`]: the SQLite implementation of [`FriendStore`] and
//! [`NotificationStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use solinarium_core::{
  identity::UserId,
  notification::{NewNotification, Notification},
  relationship::{Friendship, PairKey, Relationship, RelationshipStatus},
  store::{FriendStore, InsertOutcome, NotificationStore},
};

use crate::{
  Result,
  encode::{
    NOTIFICATION_COLUMNS, RELATIONSHIP_COLUMNS, RawNotification, RawRelationship,
    encode_dt, encode_notification_kind, encode_related_kind, encode_status,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Solinarium store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-parameter `SELECT` over `relationships` and decode the rows.
  async fn query_relationships(
    &self,
    filter: &'static str,
    param: String,
  ) -> Result<Vec<Relationship>> {
    let sql = format!("SELECT {RELATIONSHIP_COLUMNS} FROM relationships WHERE {filter}");

    let raws: Vec<RawRelationship> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![param], RawRelationship::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRelationship::into_relationship).collect()
  }
}

// ─── FriendStore impl ────────────────────────────────────────────────────────

impl FriendStore for SqliteStore {
  type Error = crate::Error;

  async fn insert_request(
    &self,
    initiator: &UserId,
    recipient: &UserId,
  ) -> Result<InsertOutcome> {
    let rel = Relationship::request(initiator.clone(), recipient.clone(), Utc::now());
    let pair = rel.pair();

    let id_str        = encode_uuid(rel.relationship_id);
    let initiator_str = rel.initiator.to_string();
    let recipient_str = rel.recipient.to_string();
    let low_str       = pair.low().to_string();
    let high_str      = pair.high().to_string();
    let status_str    = encode_status(rel.status);
    let at_str        = encode_dt(rel.created_at);

    // IMMEDIATE takes the write lock before the existence check, so two
    // writers can never both observe an empty pair.
    let existing: Option<RawRelationship> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = tx
          .query_row(
            &format!(
              "SELECT {RELATIONSHIP_COLUMNS} FROM relationships
               WHERE pair_low = ?1 AND pair_high = ?2"
            ),
            rusqlite::params![low_str, high_str],
            RawRelationship::from_row,
          )
          .optional()?;

        if existing.is_none() {
          tx.execute(
            "INSERT INTO relationships (
               relationship_id, initiator_id, recipient_id, pair_low, pair_high,
               status, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            rusqlite::params![
              id_str,
              initiator_str,
              recipient_str,
              low_str,
              high_str,
              status_str,
              at_str,
            ],
          )?;
        }

        tx.commit()?;
        Ok(existing)
      })
      .await?;

    match existing {
      Some(raw) => Ok(InsertOutcome::Existing(raw.into_relationship()?)),
      None      => Ok(InsertOutcome::Created(rel)),
    }
  }

  async fn get_relationship(&self, id: Uuid) -> Result<Option<Relationship>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawRelationship> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {RELATIONSHIP_COLUMNS} FROM relationships WHERE relationship_id = ?1"
            ),
            rusqlite::params![id_str],
            RawRelationship::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRelationship::into_relationship).transpose()
  }

  async fn relationship_between(
    &self,
    a: &UserId,
    b: &UserId,
  ) -> Result<Option<Relationship>> {
    let pair     = PairKey::new(a, b);
    let low_str  = pair.low().to_string();
    let high_str = pair.high().to_string();

    let raw: Option<RawRelationship> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {RELATIONSHIP_COLUMNS} FROM relationships
               WHERE pair_low = ?1 AND pair_high = ?2"
            ),
            rusqlite::params![low_str, high_str],
            RawRelationship::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRelationship::into_relationship).transpose()
  }

  async fn accept(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Relationship>> {
    let id_str       = encode_uuid(id);
    let at_str       = encode_dt(at);
    let accepted_str = encode_status(RelationshipStatus::Accepted);
    let pending_str  = encode_status(RelationshipStatus::Pending);

    let raw: Option<RawRelationship> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "UPDATE relationships SET status = ?2, updated_at = ?3
               WHERE relationship_id = ?1 AND status = ?4
               RETURNING {RELATIONSHIP_COLUMNS}"
            ),
            rusqlite::params![id_str, accepted_str, at_str, pending_str],
            RawRelationship::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRelationship::into_relationship).transpose()
  }

  async fn delete_request(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM relationships WHERE relationship_id = ?1 AND status = 'pending'",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn delete_pending(&self, initiator: &UserId, recipient: &UserId) -> Result<bool> {
    let initiator_str = initiator.to_string();
    let recipient_str = recipient.to_string();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM relationships
           WHERE initiator_id = ?1 AND recipient_id = ?2 AND status = 'pending'",
          rusqlite::params![initiator_str, recipient_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn delete_accepted(&self, a: &UserId, b: &UserId) -> Result<bool> {
    let pair     = PairKey::new(a, b);
    let low_str  = pair.low().to_string();
    let high_str = pair.high().to_string();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM relationships
           WHERE pair_low = ?1 AND pair_high = ?2 AND status = 'accepted'",
          rusqlite::params![low_str, high_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn list_friends(&self, user: &UserId) -> Result<Vec<Friendship>> {
    let rels = self
      .query_relationships(
        "status = 'accepted' AND (initiator_id = ?1 OR recipient_id = ?1)
         ORDER BY updated_at",
        user.to_string(),
      )
      .await?;

    Ok(
      rels
        .into_iter()
        .filter_map(|rel| Friendship::for_user(user, rel))
        .collect(),
    )
  }

  async fn list_incoming(&self, user: &UserId) -> Result<Vec<Relationship>> {
    self
      .query_relationships(
        "status = 'pending' AND recipient_id = ?1 ORDER BY created_at",
        user.to_string(),
      )
      .await
  }

  async fn list_sent(&self, user: &UserId) -> Result<Vec<Relationship>> {
    self
      .query_relationships(
        "status = 'pending' AND initiator_id = ?1 ORDER BY created_at",
        user.to_string(),
      )
      .await
  }
}

// ─── NotificationStore impl ──────────────────────────────────────────────────

impl NotificationStore for SqliteStore {
  type Error = crate::Error;

  async fn create_notification(&self, input: NewNotification) -> Result<Notification> {
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

    let id_str           = encode_uuid(notification.notification_id);
    let recipient_str    = notification.recipient.to_string();
    let kind_str         = encode_notification_kind(notification.kind);
    let title            = notification.title.clone();
    let message          = notification.message.clone();
    let related_kind_str = notification.related.as_ref().map(|r| encode_related_kind(r.kind));
    let related_id       = notification.related.as_ref().map(|r| r.id.clone());
    let at_str           = encode_dt(notification.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (
             notification_id, recipient_id, kind, title, message,
             related_kind, related_id, is_read, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
          rusqlite::params![
            id_str,
            recipient_str,
            kind_str,
            title,
            message,
            related_kind_str,
            related_id,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(notification)
  }

  async fn list_notifications(&self, user: &UserId) -> Result<Vec<Notification>> {
    let user_str = user.to_string();

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTIFICATION_COLUMNS} FROM notifications
           WHERE recipient_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }

  async fn mark_read(&self, user: &UserId, id: Uuid) -> Result<bool> {
    let user_str = user.to_string();
    let id_str   = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET is_read = 1
           WHERE notification_id = ?1 AND recipient_id = ?2",
          rusqlite::params![id_str, user_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn mark_all_read(&self, user: &UserId) -> Result<u64> {
    let user_str = user.to_string();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET is_read = 1 WHERE recipient_id = ?1 AND is_read = 0",
          rusqlite::params![user_str],
        )?)
      })
      .await?;

    Ok(changed as u64)
  }

  async fn delete_notification(&self, user: &UserId, id: Uuid) -> Result<bool> {
    let user_str = user.to_string();
    let id_str   = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM notifications WHERE notification_id = ?1 AND recipient_id = ?2",
          rusqlite::params![id_str, user_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn unread_count(&self, user: &UserId) -> Result<u64> {
    let user_str = user.to_string();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND is_read = 0",
          rusqlite::params![user_str],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }
}

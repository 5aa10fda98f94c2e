//! SQL schema for the Solinarium SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per unordered pair of users. Removing a friendship or answering a
-- request deletes the row; there is no terminal state.
CREATE TABLE IF NOT EXISTS relationships (
    relationship_id TEXT PRIMARY KEY,
    initiator_id    TEXT NOT NULL,
    recipient_id    TEXT NOT NULL,
    pair_low        TEXT NOT NULL,   -- lesser of the two user ids
    pair_high       TEXT NOT NULL,   -- greater of the two user ids
    status          TEXT NOT NULL DEFAULT 'pending',
    created_at      TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    updated_at      TEXT NOT NULL,
    UNIQUE (pair_low, pair_high),
    CHECK  (initiator_id != recipient_id),
    CHECK  (pair_low < pair_high),
    CHECK  (status IN ('pending', 'accepted', 'blocked'))
);

CREATE INDEX IF NOT EXISTS relationships_initiator_idx
    ON relationships(initiator_id, status);
CREATE INDEX IF NOT EXISTS relationships_recipient_idx
    ON relationships(recipient_id, status);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    recipient_id    TEXT NOT NULL,
    kind            TEXT NOT NULL,
    title           TEXT NOT NULL,
    message         TEXT NOT NULL,
    related_kind    TEXT,
    related_id      TEXT,
    is_read         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    CHECK ((related_kind IS NULL) = (related_id IS NULL))
);

CREATE INDEX IF NOT EXISTS notifications_recipient_idx
    ON notifications(recipient_id, created_at);

PRAGMA user_version = 1;
";

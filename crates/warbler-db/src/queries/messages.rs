use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use crate::models::{DeleteOutcome, MESSAGE_COLUMNS, MessageRow, format_timestamp};
use crate::{Database, DbError, Result};

/// Page size of the home feed.
pub const FEED_LIMIT: u32 = 100;

impl Database {
    // -- Messages --

    pub fn insert_message(&self, user_id: i64, text: &str) -> Result<MessageRow> {
        self.insert_message_at(user_id, text, Utc::now())
    }

    pub fn insert_message_at(
        &self,
        user_id: i64,
        text: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<MessageRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (user_id, text, timestamp) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, text, format_timestamp(timestamp)],
            )?;
            query_message(conn, conn.last_insert_rowid())?.ok_or(DbError::NotFound)
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    /// A user's own messages, newest first.
    pub fn messages_by_user(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS}
                 FROM messages m
                 JOIN users u ON m.user_id = u.id
                 WHERE m.user_id = ?1
                 ORDER BY m.timestamp DESC, m.id DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], MessageRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Messages by `user_id` and everyone they follow, newest first. Equal
    /// timestamps fall back to the higher id first.
    pub fn feed(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS}
                 FROM messages m
                 JOIN users u ON m.user_id = u.id
                 WHERE m.user_id = ?1
                    OR m.user_id IN (SELECT followed_id FROM follows WHERE follower_id = ?1)
                 ORDER BY m.timestamp DESC, m.id DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], MessageRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Deletes message `id` only if `user_id` wrote it. Likes on the message
    /// cascade.
    pub fn delete_message_owned(&self, id: i64, user_id: i64) -> Result<DeleteOutcome> {
        self.with_tx(|tx| {
            let owner: Option<i64> = tx
                .query_row("SELECT user_id FROM messages WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;

            match owner {
                None => Ok(DeleteOutcome::NotFound),
                Some(owner) if owner != user_id => Ok(DeleteOutcome::NotOwner),
                Some(_) => {
                    tx.execute("DELETE FROM messages WHERE id = ?1", [id])?;
                    Ok(DeleteOutcome::Deleted)
                }
            }
        })
    }
}

pub(crate) fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS}
         FROM messages m
         JOIN users u ON m.user_id = u.id
         WHERE m.id = ?1"
    ))?;
    Ok(stmt.query_row([id], MessageRow::from_row).optional()?)
}

use std::collections::HashSet;

use rusqlite::Connection;

use crate::models::{MESSAGE_COLUMNS, MessageRow, USER_COLUMNS, UserRow};
use crate::{Database, DbError, Result};

impl Database {
    // -- Follows --

    /// Adds the edge `follower -> followed`. A repeated follow is a
    /// `Conflict`; an unknown `followed` is `NotFound`.
    pub fn follow(&self, follower_id: i64, followed_id: i64) -> Result<()> {
        self.with_tx(|tx| {
            if !exists(tx, "SELECT 1 FROM users WHERE id = ?1", followed_id)? {
                return Err(DbError::NotFound);
            }
            tx.execute(
                "INSERT INTO follows (follower_id, followed_id) VALUES (?1, ?2)",
                [follower_id, followed_id],
            )?;
            Ok(())
        })
    }

    /// Removes the edge if present. Returns whether anything was removed.
    pub fn unfollow(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                [follower_id, followed_id],
            )?;
            Ok(removed > 0)
        })
    }

    pub fn is_following(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            exists2(
                conn,
                "SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                follower_id,
                followed_id,
            )
        })
    }

    pub fn is_followed_by(&self, user_id: i64, other_id: i64) -> Result<bool> {
        self.is_following(other_id, user_id)
    }

    /// Users that `user_id` follows.
    pub fn following(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_users(
                conn,
                &format!(
                    "SELECT {USER_COLUMNS} FROM follows f
                     JOIN users u ON u.id = f.followed_id
                     WHERE f.follower_id = ?1
                     ORDER BY u.username"
                ),
                user_id,
            )
        })
    }

    /// Users following `user_id`.
    pub fn followers(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_users(
                conn,
                &format!(
                    "SELECT {USER_COLUMNS} FROM follows f
                     JOIN users u ON u.id = f.follower_id
                     WHERE f.followed_id = ?1
                     ORDER BY u.username"
                ),
                user_id,
            )
        })
    }

    // -- Likes --

    /// Toggle a like: removes it if present, inserts it if not. The check and
    /// the write share one transaction. Returns true when the message is now
    /// liked.
    pub fn toggle_like(&self, user_id: i64, message_id: i64) -> Result<bool> {
        self.with_tx(|tx| {
            if !exists(tx, "SELECT 1 FROM messages WHERE id = ?1", message_id)? {
                return Err(DbError::NotFound);
            }

            let removed = tx.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                [user_id, message_id],
            )?;
            if removed > 0 {
                return Ok(false);
            }

            tx.execute(
                "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                [user_id, message_id],
            )?;
            Ok(true)
        })
    }

    pub fn has_liked(&self, user_id: i64, message_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            exists2(
                conn,
                "SELECT 1 FROM likes WHERE user_id = ?1 AND message_id = ?2",
                user_id,
                message_id,
            )
        })
    }

    pub fn liked_message_ids(&self, user_id: i64) -> Result<HashSet<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT message_id FROM likes WHERE user_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<rusqlite::Result<HashSet<i64>>>()?;
            Ok(ids)
        })
    }

    /// Messages liked by `user_id`, newest message first.
    pub fn liked_messages(&self, user_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS}
                 FROM likes l
                 JOIN messages m ON m.id = l.message_id
                 JOIN users u ON u.id = m.user_id
                 WHERE l.user_id = ?1
                 ORDER BY m.timestamp DESC, m.id DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], MessageRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }
}

fn exists(conn: &Connection, sql: &str, id: i64) -> Result<bool> {
    let mut stmt = conn.prepare(sql)?;
    Ok(stmt.exists([id])?)
}

fn exists2(conn: &Connection, sql: &str, a: i64, b: i64) -> Result<bool> {
    let mut stmt = conn.prepare(sql)?;
    Ok(stmt.exists([a, b])?)
}

fn query_users(conn: &Connection, sql: &str, id: i64) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([id], UserRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

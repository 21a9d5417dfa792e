use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use crate::models::{USER_COLUMNS, UserRow, format_timestamp};
use crate::{Database, Result};

impl Database {
    // -- Sessions --

    /// Stores a session keyed by the hash of its cookie token.
    pub fn create_session(
        &self,
        token_hash: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    token_hash,
                    user_id,
                    format_timestamp(Utc::now()),
                    format_timestamp(expires_at),
                ],
            )?;
            Ok(())
        })
    }

    /// The user owning a live session, or `None` when the session is unknown
    /// or expired at `now`.
    pub fn session_user(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS}
                 FROM sessions s
                 JOIN users u ON u.id = s.user_id
                 WHERE s.token_hash = ?1 AND s.expires_at > ?2"
            ))?;
            let user = stmt
                .query_row(
                    rusqlite::params![token_hash, format_timestamp(now)],
                    UserRow::from_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    pub fn delete_session(&self, token_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM sessions WHERE token_hash = ?1", [token_hash])? > 0)
        })
    }

    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                [format_timestamp(now)],
            )?)
        })
    }
}

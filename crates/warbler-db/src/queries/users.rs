use rusqlite::{Connection, OptionalExtension};

use crate::models::{
    DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL, NewUser, ProfileUpdate, USER_COLUMNS, UserRow,
    UserStats,
};
use crate::{Database, DbError, Result};

impl Database {
    // -- Users --

    pub fn create_user(&self, new: &NewUser<'_>) -> Result<UserRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, image_url) VALUES (?1, ?2, ?3, ?4)",
                (
                    new.username,
                    new.email,
                    new.password_hash,
                    new.image_url.unwrap_or(DEFAULT_IMAGE_URL),
                ),
            )?;
            query_user_by_id(conn, conn.last_insert_rowid())?.ok_or(DbError::NotFound)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// All users, or only those whose username contains `search`.
    pub fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            // instr() keeps `%` and `_` in the search literal
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users u
                 WHERE ?1 IS NULL OR instr(u.username, ?1) > 0
                 ORDER BY u.username"
            ))?;
            let rows = stmt
                .query_map([search], UserRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn update_user(&self, id: i64, update: &ProfileUpdate<'_>) -> Result<UserRow> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users
                 SET username = ?2, email = ?3, image_url = ?4, header_image_url = ?5,
                     bio = ?6, location = ?7
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    update.username,
                    update.email,
                    update.image_url.unwrap_or(DEFAULT_IMAGE_URL),
                    update.header_image_url.unwrap_or(DEFAULT_HEADER_IMAGE_URL),
                    update.bio,
                    update.location,
                ],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound);
            }
            query_user_by_id(conn, id)?.ok_or(DbError::NotFound)
        })
    }

    /// Deletes the user. Messages, follow and like edges and sessions go
    /// with it through `ON DELETE CASCADE`.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id])? > 0))
    }

    pub fn user_stats(&self, id: i64) -> Result<UserStats> {
        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM messages WHERE user_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE follower_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE followed_id = ?1),
                    (SELECT COUNT(*) FROM likes WHERE user_id = ?1)",
                [id],
                |row| {
                    Ok(UserStats {
                        messages: row.get(0)?,
                        following: row.get(1)?,
                        followers: row.get(2)?,
                        likes: row.get(3)?,
                    })
                },
            )?;
            Ok(stats)
        })
    }
}

pub(crate) fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"))?;
    Ok(stmt.query_row([id], UserRow::from_row).optional()?)
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1"))?;
    Ok(stmt.query_row([username], UserRow::from_row).optional()?)
}

//! Database row types. These map directly to SQLite rows and stay
//! independent of the warbler-types view models.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

/// Storage format for every timestamp column: millisecond resolution, the
/// same text `strftime('%Y-%m-%d %H:%M:%f')` produces for column defaults.
/// Fixed width, so text order is time order.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.jpg";

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub author_username: String,
    pub author_image_url: String,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub image_url: Option<&'a str>,
}

/// Profile columns a user may change. `None` image urls reset to the
/// defaults.
pub struct ProfileUpdate<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub image_url: Option<&'a str>,
    pub header_image_url: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub location: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub messages: u64,
    pub following: u64,
    pub followers: u64,
    pub likes: u64,
}

/// Result of an ownership-checked delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    NotOwner,
}

pub(crate) const USER_COLUMNS: &str =
    "u.id, u.username, u.email, u.password, u.image_url, u.header_image_url, u.bio, u.location, u.created_at";

pub(crate) const MESSAGE_COLUMNS: &str =
    "m.id, m.user_id, m.text, m.timestamp, u.username, u.image_url";

impl UserRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            image_url: row.get(4)?,
            header_image_url: row.get(5)?,
            bio: row.get(6)?,
            location: row.get(7)?,
            created_at: timestamp_at(row, 8)?,
        })
    }
}

impl MessageRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            text: row.get(2)?,
            timestamp: timestamp_at(row, 3)?,
            author_username: row.get(4)?,
            author_image_url: row.get(5)?,
        })
    }
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

use rusqlite::ErrorCode;
use rusqlite::ffi::{SQLITE_CONSTRAINT_PRIMARYKEY, SQLITE_CONSTRAINT_UNIQUE};

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    /// `constraint` is the `table.column` list sqlite reports.
    #[error("constraint violated: {constraint}")]
    Conflict { constraint: String },

    #[error("row not found")]
    NotFound,

    #[error("database lock poisoned: {0}")]
    Lock(String),

    #[error("sqlite: {0}")]
    Sqlite(rusqlite::Error),
}

impl DbError {
    /// True when the conflict was on the given column, e.g. `users.email`.
    pub fn is_conflict_on(&self, column: &str) -> bool {
        match self {
            Self::Conflict { constraint } => constraint.split(", ").any(|c| c == column),
            _ => false,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, ref msg)
                if e.code == ErrorCode::ConstraintViolation
                    && matches!(
                        e.extended_code,
                        SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY
                    ) =>
            {
                let constraint = msg
                    .as_deref()
                    .and_then(|m| m.split_once(": "))
                    .map(|(_, cols)| cols.to_string())
                    .unwrap_or_default();
                Self::Conflict { constraint }
            }
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound,
            other => Self::Sqlite(other),
        }
    }
}

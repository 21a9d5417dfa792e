use std::sync::Arc;

use chrono::Duration;
use tracing::error;

use warbler_db::Database;

use crate::error::AppError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// How long a login stays valid.
    pub session_ttl: Duration,
    /// Mark the session cookie `Secure`. Off for plain-http development.
    pub cookie_secure: bool,
}

impl AppStateInner {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            session_ttl: Duration::days(30),
            cookie_secure: false,
        }
    }
}

/// Runs a blocking database call off the async runtime.
pub(crate) async fn db_call<F, T, E>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Database) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<AppError> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::internal(e)
        })?
        .map_err(Into::into)
}

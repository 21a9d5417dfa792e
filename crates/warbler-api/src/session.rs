//! Cookie sessions and the current-user extractors.
//!
//! The cookie holds a random opaque token. Only its SHA-256 is stored, in
//! the `sessions` table, next to the user id and an expiry.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::debug;

use warbler_db::models::UserRow;

use crate::error::AppError;
use crate::state::{AppState, db_call};

pub const SESSION_COOKIE: &str = "warbler_session";

/// The logged-in user, if any. Never rejects for a missing session.
pub struct MaybeUser(pub Option<UserRow>);

/// The logged-in user. Rejects anonymous requests with
/// [`AppError::Unauthorized`].
pub struct CurrentUser(pub UserRow);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
            return Ok(Self(None));
        };

        let token_hash = hash_token(&token);
        let user = db_call(state, move |db| db.session_user(&token_hash, Utc::now())).await?;
        if user.is_none() {
            debug!("session cookie did not match a live session");
        }
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        user.map(Self).ok_or(AppError::Unauthorized)
    }
}

/// Issues a new session for `user_id` and returns the jar with its cookie.
pub(crate) async fn start_session(
    state: &AppState,
    jar: CookieJar,
    user_id: i64,
) -> Result<CookieJar, AppError> {
    let token = new_token();
    let token_hash = hash_token(&token);
    let expires_at = Utc::now()
        .checked_add_signed(state.session_ttl)
        .ok_or_else(|| AppError::internal("session expiry out of range"))?;

    db_call(state, move |db| db.create_session(&token_hash, user_id, expires_at)).await?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.cookie_secure);
    Ok(jar.add(cookie))
}

/// Forgets the session named by the cookie, if any, and clears the cookie.
pub(crate) async fn end_session(state: &AppState, jar: CookieJar) -> Result<CookieJar, AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token_hash = hash_token(cookie.value());
        db_call(state, move |db| db.delete_session(&token_hash)).await?;
    }
    Ok(jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/")))
}

fn new_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

use std::sync::OnceLock;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use warbler_db::models::{NewUser, UserRow};
use warbler_db::{Database, DbError};
use warbler_types::api::{FormKind, FormView, LoginForm, SignupForm};

use crate::error::AppError;
use crate::forms::{validate_login, validate_signup};
use crate::session::{end_session, start_session};
use crate::state::{AppState, db_call};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Creates a user with a hashed password. A taken username or email is an
/// [`AppError::Conflict`] tied to the signup form.
pub fn signup(
    db: &Database,
    username: &str,
    password: &str,
    email: &str,
    image_url: Option<&str>,
) -> Result<UserRow, AppError> {
    let password_hash = hash_password(password)?;
    db.create_user(&NewUser {
        username,
        email,
        password_hash: &password_hash,
        image_url,
    })
    .map_err(|e| AppError::from(e).in_form(FormKind::Signup))
}

/// The user with this username and password, or `None`. Unknown usernames
/// still pay for one hash verification so they are not told apart by timing.
pub fn authenticate(db: &Database, username: &str, password: &str) -> Result<Option<UserRow>, DbError> {
    match db.get_user_by_username(username)? {
        Some(user) if verify_password(password, &user.password) => Ok(Some(user)),
        Some(_) => Ok(None),
        None => {
            if let Some(dummy) = dummy_hash() {
                verify_password(password, dummy);
            }
            Ok(None)
        }
    }
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("warbler-dummy-password").ok())
        .as_deref()
}

// -- Handlers --

pub async fn signup_form() -> impl IntoResponse {
    Json(FormView::blank(FormKind::Signup))
}

/// Signing up while logged in ends the old session first.
pub async fn signup_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<impl IntoResponse, AppError> {
    let jar = end_session(&state, jar).await?;
    let valid = validate_signup(&form)?;

    let user = db_call(&state, move |db| {
        signup(
            db,
            &valid.username,
            &valid.password,
            &valid.email,
            valid.image_url.as_deref(),
        )
    })
    .await?;

    info!("user {} signed up", user.username);
    let jar = start_session(&state, jar, user.id).await?;
    Ok((jar, Redirect::to("/")))
}

pub async fn login_form() -> impl IntoResponse {
    Json(FormView::blank(FormKind::Login))
}

pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    validate_login(&form)?;

    let LoginForm { username, password } = form;
    let user = db_call(&state, move |db| authenticate(db, username.trim(), &password))
        .await?
        .ok_or_else(|| AppError::credentials(FormKind::Login, INVALID_CREDENTIALS))?;

    info!("user {} logged in", user.username);
    let jar = start_session(&state, jar, user.id).await?;
    Ok((jar, Redirect::to("/")))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let jar = end_session(&state, jar).await?;
    Ok((jar, Redirect::to("/login")))
}

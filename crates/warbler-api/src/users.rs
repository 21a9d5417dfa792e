use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use warbler_db::DbError;
use warbler_db::models::ProfileUpdate;
use warbler_db::queries::FEED_LIMIT;
use warbler_types::api::{EditProfileForm, EditProfileView, FormKind, UserSearch};
use warbler_types::models::{FollowListView, LikedMessagesView, ProfileView, UserListView};

use crate::auth::authenticate;
use crate::error::AppError;
use crate::forms::validate_profile;
use crate::session::{CurrentUser, end_session};
use crate::state::{AppState, db_call};
use crate::views::{counts, message_view, message_views, user_view, user_views};

pub const INCORRECT_PASSWORD: &str = "Incorrect password.";

/// GET /users?q=: everyone, or usernames containing `q`.
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(_me): CurrentUser,
    Query(search): Query<UserSearch>,
) -> Result<impl IntoResponse, AppError> {
    let query = search.q.filter(|q| !q.is_empty());
    let needle = query.clone();
    let rows = db_call(&state, move |db| db.list_users(needle.as_deref())).await?;

    Ok(Json(UserListView {
        query,
        users: user_views(&rows),
    }))
}

pub async fn show_user(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = me.id;
    let profile = db_call(&state, move |db| {
        let user = db.get_user_by_id(user_id)?.ok_or(DbError::NotFound)?;
        let stats = db.user_stats(user_id)?;
        let messages = db.messages_by_user(user_id, FEED_LIMIT)?;
        let liked = db.liked_message_ids(viewer)?;
        let is_following = db.is_following(viewer, user_id)?;
        let is_followed_by = db.is_followed_by(viewer, user_id)?;

        Ok::<_, DbError>(ProfileView {
            user: user_view(&user),
            counts: counts(stats),
            messages: message_views(messages, &liked),
            is_self: viewer == user_id,
            is_following,
            is_followed_by,
        })
    })
    .await?;

    Ok(Json(profile))
}

pub async fn show_following(
    State(state): State<AppState>,
    CurrentUser(_me): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let view = db_call(&state, move |db| {
        let user = db.get_user_by_id(user_id)?.ok_or(DbError::NotFound)?;
        let following = db.following(user_id)?;
        Ok::<_, DbError>(FollowListView {
            user: user_view(&user),
            users: user_views(&following),
        })
    })
    .await?;

    Ok(Json(view))
}

pub async fn show_followers(
    State(state): State<AppState>,
    CurrentUser(_me): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let view = db_call(&state, move |db| {
        let user = db.get_user_by_id(user_id)?.ok_or(DbError::NotFound)?;
        let followers = db.followers(user_id)?;
        Ok::<_, DbError>(FollowListView {
            user: user_view(&user),
            users: user_views(&followers),
        })
    })
    .await?;

    Ok(Json(view))
}

/// Always lists the viewer's own likes, whatever id is in the path.
pub async fn liked_messages(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(_user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = me.id;
    let rows = db_call(&state, move |db| db.liked_messages(viewer)).await?;

    Ok(Json(LikedMessagesView {
        user: user_view(&me),
        messages: rows.into_iter().map(|row| message_view(row, true)).collect(),
    }))
}

pub async fn start_following(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(target_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if target_id == me.id {
        return Err(AppError::Invalid("You cannot follow yourself.".to_string()));
    }

    let follower = me.id;
    db_call(&state, move |db| db.follow(follower, target_id)).await?;
    info!("user {} now follows {}", follower, target_id);

    Ok(Redirect::to(&format!("/users/{}/following", me.id)))
}

/// Removing an edge that does not exist is a no-op.
pub async fn stop_following(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(target_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let follower = me.id;
    db_call(&state, move |db| db.unfollow(follower, target_id)).await?;

    Ok(Redirect::to(&format!("/users/{}/following", me.id)))
}

pub async fn edit_profile_form(CurrentUser(me): CurrentUser) -> impl IntoResponse {
    Json(EditProfileView {
        form: FormKind::EditProfile,
        username: me.username,
        email: me.email,
        image_url: me.image_url,
        header_image_url: me.header_image_url,
        bio: me.bio,
        location: me.location,
    })
}

/// Applies a profile edit after re-checking the current password.
pub async fn edit_profile_submit(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Form(form): Form<EditProfileForm>,
) -> Result<impl IntoResponse, AppError> {
    let valid = validate_profile(&form)?;

    let updated = db_call(&state, move |db| {
        if authenticate(db, &me.username, &valid.password)?.is_none() {
            return Err(AppError::credentials(FormKind::EditProfile, INCORRECT_PASSWORD));
        }
        db.update_user(
            me.id,
            &ProfileUpdate {
                username: &valid.username,
                email: &valid.email,
                image_url: valid.image_url.as_deref(),
                header_image_url: valid.header_image_url.as_deref(),
                bio: valid.bio.as_deref(),
                location: valid.location.as_deref(),
            },
        )
        .map_err(|e| AppError::from(e).in_form(FormKind::EditProfile))
    })
    .await?;

    info!("user {} updated their profile", updated.id);
    Ok(Redirect::to(&format!("/users/{}", updated.id)))
}

/// Ends the session, then deletes the account and everything hanging off it.
pub async fn delete_user(
    State(state): State<AppState>,
    jar: CookieJar,
    CurrentUser(me): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let jar = end_session(&state, jar).await?;

    let user_id = me.id;
    db_call(&state, move |db| db.delete_user(user_id)).await?;
    info!("user {} deleted their account", me.username);

    Ok((jar, Redirect::to("/signup")))
}

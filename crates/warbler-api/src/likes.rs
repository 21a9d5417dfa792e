use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use tracing::debug;

use warbler_db::DbError;
use warbler_types::api::{LikeForm, LikeResponse};
use warbler_types::models::MessageView;

use crate::error::{ApiError, AppError};
use crate::forms::safe_redirect;
use crate::session::{CurrentUser, MaybeUser};
use crate::state::{AppState, db_call};
use crate::views::message_view;

/// Flips the like and returns the message as the user now sees it. Both
/// entry points below go through here.
async fn toggle(state: &AppState, user_id: i64, message_id: i64) -> Result<MessageView, AppError> {
    db_call(state, move |db| {
        let liked = db.toggle_like(user_id, message_id)?;
        let row = db.get_message(message_id)?.ok_or(DbError::NotFound)?;
        Ok::<_, DbError>(message_view(row, liked))
    })
    .await
}

/// POST /api/messages/{id}/likes
pub async fn toggle_like_api(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(message_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = user.ok_or(AppError::Unauthorized)?;
    let message = toggle(&state, user.id, message_id).await?;
    debug!("user {} like on {} is now {}", user.id, message_id, message.liked);

    Ok((StatusCode::CREATED, Json(LikeResponse { message })))
}

/// POST /messages/likes
pub async fn toggle_like_form(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Form(form): Form<LikeForm>,
) -> Result<impl IntoResponse, AppError> {
    let message = toggle(&state, me.id, form.message_id).await?;
    debug!("user {} like on {} is now {}", me.id, form.message_id, message.liked);

    Ok(Redirect::to(safe_redirect(&form.redirect_loc)))
}
